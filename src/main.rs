//! trx2junit - TRX <-> JUnit XML 테스트 결과 변환기
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use trx2junit::{cli::Args, report::ConsoleReporter, worker::RunResult, Worker};

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // 스레드 풀 설정
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("스레드 풀 초기화 실패")?;
    }

    let mut options = args.to_run_options();
    let reporter = ConsoleReporter::new(args.verbose, !args.no_progress);

    let result = Worker::new()
        .run(&mut options, &reporter)
        .context("변환을 시작할 수 없습니다")?;

    if args.verbose {
        result.stats.print_summary();
    }

    // 로그 파일 작성
    if let Some(ref log_path) = args.log {
        write_error_log(log_path, &result)?;
    }

    if result.any_failures() {
        println!(
            "\n{} {} 개의 파일 변환에 실패했습니다.\n",
            "⚠️".bright_yellow(),
            result.stats.get_error_count().to_string().red()
        );
    }

    Ok(ExitCode::from(result.exit_code() as u8))
}

/// 에러 로그 파일 작성
fn write_error_log(log_path: &Path, result: &RunResult) -> Result<()> {
    let mut log_file = File::create(log_path)
        .with_context(|| format!("로그 파일을 생성할 수 없습니다: {:?}", log_path))?;

    writeln!(log_file, "trx2junit 에러 로그")?;
    writeln!(log_file, "생성 시간: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(log_file, "변환 방향: {}", result.direction)?;
    writeln!(log_file, "총 에러 수: {}", result.stats.get_error_count())?;
    writeln!(log_file, "{}", "=".repeat(50))?;

    for failure in result.failures() {
        writeln!(log_file, "\n파일: {:?}", failure.input)?;
        writeln!(log_file, "출력: {:?}", failure.output)?;
        writeln!(
            log_file,
            "에러: {}",
            failure.error.as_deref().unwrap_or_default()
        )?;
    }

    println!("\n{} 에러 로그 저장: {:?}", "📝".bright_cyan(), log_path);

    Ok(())
}
