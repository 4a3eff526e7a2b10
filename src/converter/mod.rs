//! 테스트 결과 XML 변환 모듈
//!
//! TRX와 JUnit XML 사이의 변환과 기본 출력 파일 이름 계산을 담당합니다.

mod junit;
pub mod model;
mod trx;
mod xml;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::options::Direction;
use model::TestResults;

/// 한 방향의 테스트 결과 변환기
///
/// 하나의 인스턴스가 모든 변환 작업에 공유되므로 호출별 상태를 가지지 않습니다.
pub trait TestResultXmlConverter: Send + Sync {
    /// 변환 방향
    fn direction(&self) -> Direction;

    /// 출력 파일 확장자 (`.` 제외)
    fn output_extension(&self) -> &'static str;

    /// 입력 문서 파싱
    fn read(&self, bytes: &[u8]) -> Result<TestResults>;

    /// 변환된 문서 출력
    fn write(&self, results: &TestResults, output: &mut dyn Write) -> Result<()>;

    /// 기본 출력 파일 경로 계산
    ///
    /// 입력 파일 이름의 확장자를 바꾸고, `output_dir`이 있으면 그 폴더에 둡니다.
    fn output_file(&self, input: &Path, output_dir: Option<&Path>) -> PathBuf {
        let file_name = Path::new(input.file_name().unwrap_or(input.as_os_str()))
            .with_extension(self.output_extension());
        match output_dir {
            Some(dir) => dir.join(file_name),
            None => input.with_file_name(file_name),
        }
    }

    /// 입력 스트림 전체를 읽어 다른 형식으로 출력
    fn convert(&self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        let results = self.read(xml::strip_bom(&bytes))?;
        self.write(&results, output)
    }
}

/// TRX → JUnit 변환기
#[derive(Debug, Clone, Copy, Default)]
pub struct Trx2JunitConverter;

impl TestResultXmlConverter for Trx2JunitConverter {
    fn direction(&self) -> Direction {
        Direction::TrxToJunit
    }

    fn output_extension(&self) -> &'static str {
        "xml"
    }

    fn read(&self, bytes: &[u8]) -> Result<TestResults> {
        trx::parse(bytes)
    }

    fn write(&self, results: &TestResults, output: &mut dyn Write) -> Result<()> {
        junit::write(results, output)
    }
}

/// JUnit → TRX 변환기
#[derive(Debug, Clone, Copy, Default)]
pub struct Junit2TrxConverter;

impl TestResultXmlConverter for Junit2TrxConverter {
    fn direction(&self) -> Direction {
        Direction::JunitToTrx
    }

    fn output_extension(&self) -> &'static str {
        "trx"
    }

    fn read(&self, bytes: &[u8]) -> Result<TestResults> {
        junit::parse(bytes)
    }

    fn write(&self, results: &TestResults, output: &mut dyn Write) -> Result<()> {
        trx::write(results, output)
    }
}

/// 방향에 맞는 변환기 반환
pub fn converter_for(direction: Direction) -> &'static dyn TestResultXmlConverter {
    match direction {
        Direction::TrxToJunit => &Trx2JunitConverter,
        Direction::JunitToTrx => &Junit2TrxConverter,
    }
}
