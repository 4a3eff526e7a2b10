//! 파일 시스템 모듈
//!
//! 파일 존재 확인, 읽기/쓰기, 폴더 생성, 와일드카드 탐색을 추상화합니다.

use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, Trx2JunitError};
use crate::pattern::{has_wildcards, PatternMatcher};

/// 변환 작업이 사용하는 파일 시스템 기능
///
/// 모든 변환 작업이 하나의 인스턴스를 공유하므로 `Send + Sync`여야 합니다.
pub trait FileSystem: Send + Sync {
    /// 경로가 존재하는 파일인지 확인
    fn is_file(&self, path: &Path) -> bool;

    /// 경로가 존재하는 폴더인지 확인
    fn is_dir(&self, path: &Path) -> bool;

    /// 파일 크기 (알 수 없으면 0)
    fn file_size(&self, path: &Path) -> u64;

    /// 글로브 패턴과 일치하는 파일을 정렬된 순서로 반환
    fn find_files(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// 읽기 전용 입력 스트림 열기
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// 출력 파일 생성 (기존 파일은 비움)
    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>>;

    /// 폴더와 누락된 상위 폴더 생성
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// 파일 삭제
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// 심볼릭 링크와 `.`/`..`를 풀어낸 절대 경로 (존재하지 않으면 None)
    fn canonicalize(&self, path: &Path) -> Option<PathBuf>;
}

/// 운영체제 파일 시스템 구현
#[derive(Debug, Clone)]
pub struct OsFileSystem {
    /// 대용량 파일 임계값 (이상이면 메모리 매핑 사용)
    pub mmap_threshold: u64,
}

impl Default for OsFileSystem {
    fn default() -> Self {
        Self {
            mmap_threshold: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl OsFileSystem {
    /// 기본 설정으로 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 메모리 매핑 임계값 설정
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }
}

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn file_size(&self, path: &Path) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    fn find_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let (base, rest) = split_pattern(pattern);
        if rest.is_empty() {
            return Ok(if base.is_file() { vec![base] } else { Vec::new() });
        }

        let matcher = PatternMatcher::new(&rest)?;
        let root = if base.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            base.clone()
        };

        let walker = if matcher.is_recursive() {
            WalkDir::new(&root)
        } else {
            WalkDir::new(&root).max_depth(matcher.depth())
        };

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&root).ok()?;
                let relative = to_slash_path(relative);
                if matcher.matches(&relative) {
                    Some(base.join(relative))
                } else {
                    None
                }
            })
            .collect();

        // 결정적인 순서 보장
        files.sort();

        Ok(files)
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = File::open(path).map_err(|e| Trx2JunitError::FileOpenError {
            file: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if self.file_size(path) >= self.mmap_threshold {
            // 대용량 파일: 메모리 매핑 사용
            let mmap = unsafe {
                Mmap::map(&file).map_err(|e| Trx2JunitError::FileOpenError {
                    file: path.to_path_buf(),
                    reason: format!("메모리 매핑 실패: {}", e),
                })?
            };
            Ok(Box::new(Cursor::new(mmap)))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let file = File::create(path).map_err(|e| Trx2JunitError::FileCreateError {
            file: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| Trx2JunitError::DirectoryCreateError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        fs::canonicalize(path).ok()
    }
}

/// 패턴을 와일드카드 없는 기준 폴더와 나머지 패턴(`/` 구분)으로 분리
fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();

    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if rest.is_empty() && !has_wildcards(&text) {
            base.push(component);
        } else if !matches!(component, Component::CurDir) {
            rest.push(text.into_owned());
        }
    }

    (base, rest.join("/"))
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
