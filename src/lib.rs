//! trx2junit - TRX <-> JUnit XML 테스트 결과 변환기
//!
//! Visual Studio 테스트 결과(TRX) 파일과 JUnit XML 파일을 서로 변환하는 CLI 도구입니다.
//!
//! # 주요 기능
//!
//! - 🔁 **양방향 변환**: TRX → JUnit, JUnit → TRX
//! - 🔍 **글로브 패턴**: `*`, `?`, `[..]`, `**`로 여러 입력 파일 지정
//! - 🚀 **병렬 처리**: Rayon을 활용한 파일별 동시 변환
//! - 🛡️ **실패 격리**: 한 파일의 실패가 다른 파일 변환을 중단시키지 않음
//! - 📂 **출력 폴더**: 지정한 폴더(중간 폴더 포함)를 자동 생성
//! - 📝 **UTF-8 출력**: 플랫폼과 관계없이 BOM 없는 UTF-8
//!
//! # 예제
//!
//! ```bash
//! # 기본 사용법 (a.trx → a.xml)
//! trx2junit results/*.trx
//!
//! # 출력 폴더 지정
//! trx2junit --output junit **/TestResults/*.trx
//!
//! # JUnit → TRX
//! trx2junit --junit2trx reports/*.xml
//! ```

pub mod cli;
pub mod converter;
pub mod error;
pub mod fs;
pub mod options;
pub mod pattern;
pub mod report;
pub mod stats;
pub mod wildcard;
pub mod worker;

// Re-exports for convenient access
pub use cli::Args;
pub use converter::{converter_for, Junit2TrxConverter, TestResultXmlConverter, Trx2JunitConverter};
pub use error::{Result, Trx2JunitError};
pub use fs::{FileSystem, OsFileSystem};
pub use options::{Direction, RunOptions};
pub use pattern::PatternMatcher;
pub use report::{ConsoleReporter, Reporter};
pub use stats::{format_bytes, format_seconds, Statistics};
pub use wildcard::{DefaultGlobHandler, GlobHandler, UnresolvedInput};
pub use worker::{ConversionResult, RunResult, Worker};
