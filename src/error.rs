//! 에러 타입 정의 모듈
//!
//! trx2junit에서 발생할 수 있는 모든 에러 타입을 정의합니다.

use std::path::PathBuf;
use thiserror::Error;

/// trx2junit에서 발생할 수 있는 에러 타입
#[derive(Error, Debug)]
pub enum Trx2JunitError {
    /// 실행 옵션이 유효하지 않음
    #[error("유효하지 않은 실행 옵션: {reason}")]
    InvalidOptions { reason: String },

    /// 입력 파일 열기 실패
    #[error("파일을 열 수 없습니다 ({file}): {reason}")]
    FileOpenError { file: PathBuf, reason: String },

    /// 출력 파일 생성 실패
    #[error("파일을 생성할 수 없습니다 ({file}): {reason}")]
    FileCreateError { file: PathBuf, reason: String },

    /// 출력 폴더 생성 실패
    #[error("폴더를 생성할 수 없습니다 ({path}): {reason}")]
    DirectoryCreateError { path: PathBuf, reason: String },

    /// 출력 경로가 입력 파일 자신을 가리킴
    #[error("출력 파일이 입력 파일과 같습니다 ({file})")]
    OutputIsInput { file: PathBuf },

    /// 다른 입력과 같은 출력 경로
    #[error("출력 파일 {output}을(를) 이미 {other}의 변환 결과로 사용합니다")]
    OutputCollision { output: PathBuf, other: PathBuf },

    /// 파일 읽기/쓰기 실패
    #[error("입출력 실패: {reason}")]
    IoError { reason: String },

    /// XML 파싱 또는 직렬화 실패
    #[error("XML 처리 실패: {reason}")]
    XmlError { reason: String },

    /// 예상한 형식의 테스트 결과 문서가 아님
    #[error("유효하지 않은 {format} 문서: {reason}")]
    InvalidReport { format: &'static str, reason: String },

    /// 유효하지 않은 패턴
    #[error("유효하지 않은 패턴: {pattern}")]
    InvalidPattern { pattern: String },
}

impl From<std::io::Error> for Trx2JunitError {
    fn from(e: std::io::Error) -> Self {
        Trx2JunitError::IoError {
            reason: e.to_string(),
        }
    }
}

impl From<quick_xml::Error> for Trx2JunitError {
    fn from(e: quick_xml::Error) -> Self {
        Trx2JunitError::XmlError {
            reason: e.to_string(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Trx2JunitError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Trx2JunitError::XmlError {
            reason: e.to_string(),
        }
    }
}

/// trx2junit 결과 타입 별칭
pub type Result<T> = std::result::Result<T, Trx2JunitError>;
