//! 진행 상황 보고 모듈
//!
//! 실행 시작, 파일별 변환, 파일별 에러, 실행 완료 메시지를 출력합니다.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::options::Direction;
use crate::stats::format_seconds;
use crate::wildcard::UnresolvedInput;

/// 진행/진단 메시지 수신자
///
/// 변환 작업들이 동시에 호출하므로 `Sync`여야 합니다.
pub trait Reporter: Sync {
    /// 확장되지 않은 입력 경고
    fn unresolved_input(&self, unresolved: &UnresolvedInput);

    /// 실행 시작 (파일 수와 방향)
    fn run_started(&self, file_count: usize, direction: Direction);

    /// 파일 하나의 변환 시작
    fn file_started(&self, input: &Path, output: &Path);

    /// 파일 하나의 변환 성공
    fn file_succeeded(&self, input: &Path, output: &Path);

    /// 파일 하나의 변환 실패
    fn file_failed(&self, input: &Path, error: &str);

    /// 모든 변환 종료 후 한 번 호출
    fn run_finished(&self, elapsed: Duration);
}

/// 터미널 출력 구현
pub struct ConsoleReporter {
    verbose: bool,
    progress: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// 새 리포터 생성
    ///
    /// # Arguments
    /// * `verbose` - 파일별 성공 메시지 출력 여부
    /// * `show_progress` - 진행률 바 표시 여부
    pub fn new(verbose: bool, show_progress: bool) -> Self {
        let progress = show_progress.then(|| {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓▒░"),
            );
            pb
        });

        Self { verbose, progress }
    }

    fn line(&self, message: String) {
        match &self.progress {
            Some(pb) => pb.println(message),
            None => println!("{}", message),
        }
    }

    fn error_line(&self, message: String) {
        match &self.progress {
            Some(pb) => pb.suspend(|| eprintln!("{}", message)),
            None => eprintln!("{}", message),
        }
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }
}

impl Reporter for ConsoleReporter {
    fn unresolved_input(&self, unresolved: &UnresolvedInput) {
        self.error_line(format!(
            "{} {}: {}",
            "⚠️".bright_yellow(),
            unresolved.input,
            unresolved.reason.yellow()
        ));
    }

    fn run_started(&self, file_count: usize, direction: Direction) {
        if let Some(pb) = &self.progress {
            pb.set_length(file_count as u64);
        }
        let what = match direction {
            Direction::TrxToJunit => "trx 파일을 JUnit-xml로",
            Direction::JunitToTrx => "junit 파일을 trx-xml로",
        };
        self.line(format!(
            "{} {}개의 {} 변환합니다...",
            "⚡".bright_cyan(),
            file_count.to_string().bright_green(),
            what
        ));
    }

    fn file_started(&self, input: &Path, output: &Path) {
        self.line(format!(
            "  '{}' → '{}'",
            input.display(),
            output.display().to_string().bright_white()
        ));
    }

    fn file_succeeded(&self, input: &Path, _output: &Path) {
        self.tick();
        if self.verbose {
            self.line(format!("  {} {}", "✓".green(), input.display()));
        }
    }

    fn file_failed(&self, input: &Path, error: &str) {
        self.tick();
        self.error_line(format!(
            "  {} {}: {}",
            "✗".bright_red(),
            input.display(),
            error.red()
        ));
    }

    fn run_finished(&self, elapsed: Duration) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        println!(
            "{} {}초 만에 완료했습니다. bye.",
            "✅".bright_green(),
            format_seconds(elapsed)
        );
    }
}
