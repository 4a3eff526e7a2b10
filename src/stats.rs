//! 통계 및 유틸리티 모듈
//!
//! 변환 통계 수집 및 포맷팅을 담당합니다.

use colored::Colorize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 변환 통계 구조체
///
/// 동시에 실행되는 변환 작업들이 공유하며, 모든 갱신은 원자적입니다.
#[derive(Debug, Default)]
pub struct Statistics {
    /// 총 파일 수
    pub total_files: usize,
    /// 성공 변환 수
    pub success_count: AtomicUsize,
    /// 에러 발생 수
    pub error_count: AtomicUsize,
    /// 읽은 총 바이트
    pub total_bytes_read: AtomicU64,
    /// 쓴 총 바이트
    pub total_bytes_written: AtomicU64,
    /// 변환 시작 시간
    start_time: Option<Instant>,
    /// 변환 종료까지 걸린 시간 (종료 전에는 None)
    finished_in: Option<Duration>,
}

impl Statistics {
    /// 새 통계 인스턴스 생성 (시작 시간 기록)
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 성공 카운트 증가
    pub fn increment_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 에러 카운트 증가
    pub fn increment_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 읽은 바이트 추가
    pub fn add_bytes_read(&self, bytes: u64) {
        self.total_bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// 쓴 바이트 추가
    pub fn add_bytes_written(&self, bytes: u64) {
        self.total_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// 성공 수 반환
    pub fn get_success_count(&self) -> usize {
        self.success_count.load(Ordering::Relaxed)
    }

    /// 에러 수 반환
    pub fn get_error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// 하나 이상의 변환이 실패했는지 확인
    pub fn has_failures(&self) -> bool {
        self.get_error_count() > 0
    }

    /// 경과 시간 고정 (모든 작업 종료 후 호출)
    pub fn finish(&mut self) {
        self.finished_in = Some(self.elapsed());
    }

    /// 경과 시간 반환
    pub fn elapsed(&self) -> Duration {
        if let Some(finished_in) = self.finished_in {
            return finished_in;
        }
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// 요약 표의 행 목록 (항목 이름, 값)
    pub fn summary_rows(&self) -> Vec<(&'static str, String)> {
        let converted = self.get_success_count();
        let failed = self.get_error_count();
        let elapsed = self.elapsed();

        let mut rows = vec![
            ("대상 보고서", self.total_files.to_string()),
            ("변환 완료", converted.to_string()),
            ("변환 실패", failed.to_string()),
            (
                "읽은 XML",
                format_bytes(self.total_bytes_read.load(Ordering::Relaxed)),
            ),
            (
                "쓴 XML",
                format_bytes(self.total_bytes_written.load(Ordering::Relaxed)),
            ),
        ];
        let secs = elapsed.as_secs_f64();
        if converted > 0 && secs > 0.0 {
            rows.push(("초당 보고서", format!("{:.1}", converted as f64 / secs)));
        }
        rows.push(("소요 시간", format!("{}초", format_seconds(elapsed))));
        rows
    }

    /// 변환 통계 요약 출력
    pub fn print_summary(&self) {
        let rule = "─".repeat(44);
        let title = if self.has_failures() {
            " 🧾 변환 결과 (실패 포함)".bright_yellow().bold()
        } else {
            " 🧾 변환 결과".bright_white().bold()
        };

        println!("\n{}", rule.bright_blue());
        println!("{}", title);
        println!("{}", rule.bright_blue());
        for (label, value) in self.summary_rows() {
            let value = match label {
                "변환 완료" => value.green(),
                "변환 실패" if self.has_failures() => value.red(),
                _ => value.normal(),
            };
            println!("  {:<12} {}", label, value);
        }
        println!("{}", rule.bright_blue());
    }
}

/// 바이트 수를 사람이 읽기 쉬운 단위로 표시
///
/// # Examples
/// ```
/// use trx2junit::stats::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// 경과 시간을 초 단위 소수로 변환
///
/// 로케일과 관계없이 항상 `.`을 소수점으로 사용합니다.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use trx2junit::stats::format_seconds;
///
/// assert_eq!(format_seconds(Duration::from_millis(1500)), "1.500");
/// ```
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}
