//! 테스트 결과 공통 모델
//!
//! TRX와 JUnit 양쪽에서 읽고 쓸 수 있는 형식 중립적인 표현입니다.

use chrono::{DateTime, FixedOffset};
use std::time::Duration;

/// 하나의 테스트 결과 문서
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestResults {
    /// 실행 이름
    pub name: Option<String>,
    /// 실행 시작 시각
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// 테스트 스위트 목록
    pub suites: Vec<TestSuite>,
}

impl TestResults {
    /// 전체 집계
    pub fn counts(&self) -> Counts {
        self.suites
            .iter()
            .fold(Counts::default(), |acc, suite| acc + suite.counts())
    }

    /// 전체 실행 시간
    pub fn time(&self) -> Duration {
        self.suites.iter().map(TestSuite::time).sum()
    }

    /// 가장 이른 시작 시각 (실행 시각이 없으면 스위트에서 계산)
    pub fn start_time(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
            .or_else(|| self.suites.iter().filter_map(TestSuite::start_time).min())
    }

    /// 클래스 이름 기준으로 스위트에 테스트 케이스 추가 (처음 등장한 순서 유지)
    pub fn push_case(&mut self, case: TestCase) {
        match self.suites.iter_mut().find(|s| s.name == case.class_name) {
            Some(suite) => suite.cases.push(case),
            None => {
                let mut suite = TestSuite::new(case.class_name.clone());
                suite.hostname = case.computer_name.clone();
                suite.cases.push(case);
                self.suites.push(suite);
            }
        }
    }
}

/// 테스트 스위트
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSuite {
    pub name: String,
    pub hostname: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub cases: Vec<TestCase>,
    pub system_out: Option<String>,
    pub system_err: Option<String>,
}

impl TestSuite {
    /// 이름으로 빈 스위트 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn counts(&self) -> Counts {
        self.cases.iter().fold(Counts::default(), |mut acc, case| {
            acc.tests += 1;
            match case.outcome {
                Outcome::Passed => acc.passed += 1,
                Outcome::Failed(_) => acc.failures += 1,
                Outcome::Errored(_) => acc.errors += 1,
                Outcome::Skipped { .. } => acc.skipped += 1,
            }
            acc
        })
    }

    pub fn time(&self) -> Duration {
        self.cases.iter().map(|c| c.time).sum()
    }

    /// 스위트 시각이 없으면 케이스 중 가장 이른 시작 시각
    pub fn start_time(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
            .or_else(|| self.cases.iter().filter_map(|c| c.start_time).min())
    }
}

/// 테스트 케이스
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub class_name: String,
    pub time: Duration,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub computer_name: Option<String>,
    pub outcome: Outcome,
    pub system_out: Option<String>,
    pub system_err: Option<String>,
}

impl TestCase {
    /// 통과한 케이스 생성
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            time: Duration::ZERO,
            start_time: None,
            computer_name: None,
            outcome: Outcome::Passed,
            system_out: None,
            system_err: None,
        }
    }

    /// `클래스.이름` 형식의 전체 이름
    pub fn full_name(&self) -> String {
        if self.class_name.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.class_name, self.name)
        }
    }
}

/// 테스트 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    /// 단언 실패
    Failed(Problem),
    /// 예기치 않은 오류
    Errored(Problem),
    Skipped { message: Option<String> },
}

/// 실패/오류 상세 정보
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    pub message: Option<String>,
    pub kind: Option<String>,
    pub stack_trace: Option<String>,
}

/// 결과 집계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub tests: usize,
    pub passed: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl std::ops::Add for Counts {
    type Output = Counts;

    fn add(self, other: Counts) -> Counts {
        Counts {
            tests: self.tests + other.tests,
            passed: self.passed + other.passed,
            failures: self.failures + other.failures,
            errors: self.errors + other.errors,
            skipped: self.skipped + other.skipped,
        }
    }
}
