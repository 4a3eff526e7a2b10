//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 파싱을 담당합니다.

use clap::Parser;
use std::path::PathBuf;

use crate::options::RunOptions;

/// trx2junit CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "trx2junit",
    author = "YourName <your@email.com>",
    version,
    about = "TRX <-> JUnit XML 테스트 결과 변환기",
    long_about = r#"
TRX <-> JUNIT XML CONVERTER
===========================

Visual Studio 테스트 결과(TRX) 파일을 JUnit XML로,
또는 JUnit XML을 TRX로 변환합니다.

특징:
  • 글로브 패턴으로 여러 파일 지정 (*, ?, [..], **)
  • 파일별 병렬 변환
  • 한 파일의 실패가 다른 파일 변환에 영향을 주지 않음
  • 하나라도 실패하면 종료 코드 1

예제:
  trx2junit results/*.trx
  trx2junit --output junit-results **/TestResults/*.trx
  trx2junit --junit2trx reports/*.xml
  trx2junit -j 4 --verbose --log errors.log results/*.trx
"#
)]
pub struct Args {
    /// 입력 파일 경로 또는 글로브 패턴
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// 출력 폴더 (기본값: 입력 파일과 같은 폴더)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// JUnit XML을 TRX로 변환
    #[arg(long)]
    pub junit2trx: bool,

    /// 상세 출력 모드
    #[arg(short, long)]
    pub verbose: bool,

    /// 병렬 처리 스레드 수 (기본값: CPU 코어 수)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// 에러 로그 파일 경로
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// 진행률 바 숨기기
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    /// 실행 옵션으로 변환
    pub fn to_run_options(&self) -> RunOptions {
        RunOptions::new(self.inputs.iter().cloned())
            .with_convert_to_junit(!self.junit2trx)
            .with_output_directory(self.output.clone())
    }
}
