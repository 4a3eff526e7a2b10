//! 실행 옵션 모듈
//!
//! 한 번의 변환 실행 요청을 표현합니다.

use std::fmt;
use std::path::PathBuf;

/// 변환 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// TRX → JUnit
    TrxToJunit,
    /// JUnit → TRX
    JunitToTrx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::TrxToJunit => write!(f, "trx → JUnit-xml"),
            Direction::JunitToTrx => write!(f, "junit → trx-xml"),
        }
    }
}

/// 변환 실행 옵션
///
/// `input_files`는 와일드카드 확장 시 한 번 실제 파일 목록으로 교체되고,
/// 그 이후에는 읽기 전용으로 사용됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// 입력 파일 경로 또는 글로브 패턴
    pub input_files: Vec<String>,
    /// true면 TRX → JUnit, false면 JUnit → TRX
    pub convert_to_junit: bool,
    /// 출력 폴더 (None이면 입력 파일 옆에 생성)
    pub output_directory: Option<PathBuf>,
}

impl RunOptions {
    /// TRX → JUnit 변환 옵션 생성
    pub fn new<I, S>(input_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input_files: input_files.into_iter().map(Into::into).collect(),
            convert_to_junit: true,
            output_directory: None,
        }
    }

    /// 변환 방향 설정
    pub fn with_convert_to_junit(mut self, convert_to_junit: bool) -> Self {
        self.convert_to_junit = convert_to_junit;
        self
    }

    /// 출력 폴더 설정
    pub fn with_output_directory(mut self, output_directory: Option<PathBuf>) -> Self {
        self.output_directory = output_directory;
        self
    }

    /// 변환 방향 반환
    pub fn direction(&self) -> Direction {
        if self.convert_to_junit {
            Direction::TrxToJunit
        } else {
            Direction::JunitToTrx
        }
    }
}
