//! 변환 실행 모듈
//!
//! 와일드카드 확장, 변환 방향 선택, 파일별 병렬 변환, 실패 격리를 담당합니다.

use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::converter::{converter_for, TestResultXmlConverter};
use crate::error::{Result, Trx2JunitError};
use crate::fs::{FileSystem, OsFileSystem};
use crate::options::{Direction, RunOptions};
use crate::report::Reporter;
use crate::stats::Statistics;
use crate::wildcard::{DefaultGlobHandler, GlobHandler};

/// 파일 하나의 변환 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    /// 입력 파일 경로
    pub input: PathBuf,
    /// 출력 파일 경로
    pub output: PathBuf,
    /// 에러 메시지 (실패 시)
    pub error: Option<String>,
    /// 입력 파일 크기
    pub bytes_read: u64,
    /// 출력 파일 크기
    pub bytes_written: u64,
}

impl ConversionResult {
    /// 성공 결과 생성
    pub fn success(input: PathBuf, output: PathBuf, bytes_read: u64, bytes_written: u64) -> Self {
        Self {
            input,
            output,
            error: None,
            bytes_read,
            bytes_written,
        }
    }

    /// 실패 결과 생성
    pub fn failure(input: PathBuf, output: PathBuf, error: String) -> Self {
        Self {
            input,
            output,
            error: Some(error),
            bytes_read: 0,
            bytes_written: 0,
        }
    }

    /// 성공 여부
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 한 번의 실행 결과
#[derive(Debug)]
pub struct RunResult {
    /// 변환 방향
    pub direction: Direction,
    /// 파일별 결과 (확장된 입력 순서)
    pub results: Vec<ConversionResult>,
    /// 실행 통계
    pub stats: Statistics,
}

impl RunResult {
    /// 하나 이상의 변환이 실패했는지 확인
    pub fn any_failures(&self) -> bool {
        self.stats.has_failures()
    }

    /// 프로세스 종료 코드 (성공 0, 실패 1)
    pub fn exit_code(&self) -> i32 {
        if self.any_failures() {
            1
        } else {
            0
        }
    }

    /// 실패한 변환 목록
    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

/// 변환 실행기
pub struct Worker {
    file_system: Arc<dyn FileSystem>,
    glob_handler: Box<dyn GlobHandler>,
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker {
    /// 운영체제 파일 시스템을 사용하는 실행기 생성
    pub fn new() -> Self {
        Self::with_file_system(Arc::new(OsFileSystem::new()))
    }

    /// 지정한 파일 시스템을 사용하는 실행기 생성
    pub fn with_file_system(file_system: Arc<dyn FileSystem>) -> Self {
        let glob_handler = Box::new(DefaultGlobHandler::new(Arc::clone(&file_system)));
        Self {
            file_system,
            glob_handler,
        }
    }

    /// 와일드카드 확장 방식 교체
    pub fn with_glob_handler(mut self, glob_handler: Box<dyn GlobHandler>) -> Self {
        self.glob_handler = glob_handler;
        self
    }

    /// 변환 실행
    ///
    /// 요청이 유효하지 않을 때만 에러를 반환합니다. 개별 파일의 실패는
    /// `RunResult`에 기록되며 다른 파일의 변환을 중단시키지 않습니다.
    ///
    /// # Arguments
    /// * `options` - 실행 옵션 (`input_files`는 확장된 목록으로 교체됨)
    /// * `reporter` - 진행 메시지 수신자
    pub fn run(&self, options: &mut RunOptions, reporter: &dyn Reporter) -> Result<RunResult> {
        validate_options(options)?;

        for unresolved in self.glob_handler.expand_wildcards(options) {
            reporter.unresolved_input(&unresolved);
        }

        let direction = options.direction();
        let converter = converter_for(direction);
        reporter.run_started(options.input_files.len(), direction);

        let mut stats = Statistics::new(options.input_files.len());
        let tasks = self.plan(
            converter,
            &options.input_files,
            options.output_directory.as_deref(),
        );

        let results: Vec<ConversionResult> = tasks
            .into_par_iter()
            .map(|task| {
                let result = match task.conflict {
                    Some(error) => fail(task.input, task.output, error, reporter),
                    None => self.convert_to(converter, task.input, task.output, reporter),
                };
                if result.is_success() {
                    stats.increment_success();
                    stats.add_bytes_read(result.bytes_read);
                    stats.add_bytes_written(result.bytes_written);
                } else {
                    stats.increment_error();
                }
                result
            })
            .collect();

        stats.finish();
        reporter.run_finished(stats.elapsed());

        Ok(RunResult {
            direction,
            results,
            stats,
        })
    }

    /// 파일 하나 변환
    ///
    /// 모든 에러를 여기서 잡아 실패 결과로 바꿉니다.
    pub fn convert(
        &self,
        converter: &dyn TestResultXmlConverter,
        input: &Path,
        output_dir: Option<&Path>,
        reporter: &dyn Reporter,
    ) -> ConversionResult {
        let output = converter.output_file(input, output_dir);
        self.convert_to(converter, input, output, reporter)
    }

    /// 입력별 출력 경로 계산
    ///
    /// 출력 경로가 앞선 입력의 출력이나 다른 입력 파일과 겹치면 그 작업은
    /// 변환하지 않고 충돌로 표시합니다. 먼저 나온 입력이 경로를 차지합니다.
    fn plan<'a>(
        &self,
        converter: &dyn TestResultXmlConverter,
        inputs: &'a [String],
        output_dir: Option<&Path>,
    ) -> Vec<Task<'a>> {
        let input_keys: HashMap<PathBuf, &Path> = inputs
            .iter()
            .map(|input| {
                let input = Path::new(input);
                (self.path_key(input), input)
            })
            .collect();
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();

        inputs
            .iter()
            .map(|input| {
                let input = Path::new(input.as_str());
                let output = converter.output_file(input, output_dir);
                let key = self.path_key(&output);

                let other = match input_keys.get(&key) {
                    // 자기 자신을 덮어쓰는 경우는 convert_file에서 처리
                    Some(owner) if *owner != input => Some(*owner),
                    Some(_) => None,
                    None => match claimed.entry(key) {
                        Entry::Occupied(first) => Some(*first.get()),
                        Entry::Vacant(slot) => {
                            slot.insert(input);
                            None
                        }
                    },
                };
                let conflict = other.map(|other| Trx2JunitError::OutputCollision {
                    output: output.clone(),
                    other: other.to_path_buf(),
                });

                Task {
                    input,
                    output,
                    conflict,
                }
            })
            .collect()
    }

    /// 경로 비교용 키 (상위 폴더가 있으면 정규화)
    fn path_key(&self, path: &Path) -> PathBuf {
        if let Some(canonical) = self.file_system.canonicalize(path) {
            return canonical;
        }
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        match (self.file_system.canonicalize(dir), path.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => path.to_path_buf(),
        }
    }

    fn convert_to(
        &self,
        converter: &dyn TestResultXmlConverter,
        input: &Path,
        output: PathBuf,
        reporter: &dyn Reporter,
    ) -> ConversionResult {
        match self.convert_file(converter, input, &output, reporter) {
            Ok(bytes_written) => {
                reporter.file_succeeded(input, &output);
                ConversionResult::success(
                    input.to_path_buf(),
                    output,
                    self.file_system.file_size(input),
                    bytes_written,
                )
            }
            Err(e) => fail(input, output, e, reporter),
        }
    }

    fn convert_file(
        &self,
        converter: &dyn TestResultXmlConverter,
        input: &Path,
        output: &Path,
        reporter: &dyn Reporter,
    ) -> Result<u64> {
        // 출력 파일을 만들면 입력이 비워지므로 열기 전에 거부
        if self.path_key(input) == self.path_key(output) {
            return Err(Trx2JunitError::OutputIsInput {
                file: input.to_path_buf(),
            });
        }

        self.ensure_output_directory(output)?;
        reporter.file_started(input, output);

        let mut reader = self.file_system.open_read(input)?;
        let writer = self.file_system.create(output)?;
        let mut writer = CountingWriter::new(writer);

        let converted = converter
            .convert(&mut reader, &mut writer)
            .and_then(|_| writer.flush().map_err(Trx2JunitError::from));

        match converted {
            Ok(()) => Ok(writer.count),
            Err(e) => {
                // 스트림을 닫은 뒤 불완전한 출력 파일 삭제
                drop(writer);
                let _ = self.file_system.remove_file(output);
                Err(e)
            }
        }
    }

    fn ensure_output_directory(&self, output: &Path) -> Result<()> {
        match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !self.file_system.is_dir(dir) => {
                self.file_system.create_dir_all(dir)
            }
            _ => Ok(()),
        }
    }
}

/// 실행 계획의 작업 하나
struct Task<'a> {
    input: &'a Path,
    output: PathBuf,
    conflict: Option<Trx2JunitError>,
}

fn fail(
    input: &Path,
    output: PathBuf,
    error: Trx2JunitError,
    reporter: &dyn Reporter,
) -> ConversionResult {
    let message = error.to_string();
    reporter.file_failed(input, &message);
    ConversionResult::failure(input.to_path_buf(), output, message)
}

fn validate_options(options: &RunOptions) -> Result<()> {
    if options.input_files.is_empty() {
        return Err(Trx2JunitError::InvalidOptions {
            reason: "입력 파일이 지정되지 않았습니다".to_string(),
        });
    }
    if let Some(ref dir) = options.output_directory {
        if dir.as_os_str().is_empty() {
            return Err(Trx2JunitError::InvalidOptions {
                reason: "출력 폴더 경로가 비어 있습니다".to_string(),
            });
        }
    }
    Ok(())
}

/// 쓴 바이트 수를 세는 출력 래퍼
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
