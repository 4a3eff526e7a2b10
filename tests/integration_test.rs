//! 통합 테스트 모듈
//!
//! trx2junit의 전체 기능을 테스트합니다.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use trx2junit::{Direction, Reporter, RunOptions, UnresolvedInput, Worker};

const VALID_TRX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<TestRun id="6b2b3c1e-0000-0000-0000-000000000001" name="nightly" xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
  <Times creation="2024-03-01T10:00:00.0000000+00:00" start="2024-03-01T10:00:00.0000000+00:00" finish="2024-03-01T10:00:03.0000000+00:00" />
  <Results>
    <UnitTestResult executionId="e1" testId="t1" testName="AddsNumbers" computerName="ci-1" duration="00:00:00.5000000" startTime="2024-03-01T10:00:00.0000000+00:00" endTime="2024-03-01T10:00:00.5000000+00:00" outcome="Passed" />
    <UnitTestResult executionId="e2" testId="t2" testName="DividesByZero" computerName="ci-1" duration="00:00:01.0000000" startTime="2024-03-01T10:00:01.0000000+00:00" endTime="2024-03-01T10:00:02.0000000+00:00" outcome="Failed">
      <Output>
        <ErrorInfo>
          <Message>Expected exception was not thrown</Message>
          <StackTrace>at Calc.Tests.DividesByZero()</StackTrace>
        </ErrorInfo>
      </Output>
    </UnitTestResult>
  </Results>
  <TestDefinitions>
    <UnitTest name="AddsNumbers" storage="calc.tests.dll" id="t1">
      <Execution id="e1" />
      <TestMethod codeBase="calc.tests.dll" className="Calc.Tests" name="AddsNumbers" />
    </UnitTest>
    <UnitTest name="DividesByZero" storage="calc.tests.dll" id="t2">
      <Execution id="e2" />
      <TestMethod codeBase="calc.tests.dll" className="Calc.Tests" name="DividesByZero" />
    </UnitTest>
  </TestDefinitions>
</TestRun>
"#;

const VALID_JUNIT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="pkg.Parser" tests="2" failures="0" errors="1" timestamp="2024-03-01T10:00:00">
    <testcase name="parses_empty" classname="pkg.Parser" time="0.010"/>
    <testcase name="parses_garbage" classname="pkg.Parser" time="0.020">
      <error message="panic" type="Panic">thread panicked</error>
    </testcase>
  </testsuite>
</testsuites>
"#;

/// 테스트용 파일 생성 헬퍼
fn create_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// 메시지를 기록하는 테스트용 리포터
#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn unresolved_input(&self, unresolved: &UnresolvedInput) {
        self.push(format!("unresolved {}", unresolved.input));
    }
    fn run_started(&self, file_count: usize, direction: Direction) {
        self.push(format!("start {} {:?}", file_count, direction));
    }
    fn file_started(&self, input: &Path, output: &Path) {
        self.push(format!("file {} {}", input.display(), output.display()));
    }
    fn file_succeeded(&self, input: &Path, _output: &Path) {
        self.push(format!("ok {}", input.display()));
    }
    fn file_failed(&self, input: &Path, error: &str) {
        self.push(format!("error {} {}", input.display(), error));
    }
    fn run_finished(&self, _elapsed: Duration) {
        self.push("done".to_string());
    }
}

mod run_tests {
    use super::*;

    #[test]
    fn test_converts_files_next_to_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_file(temp_dir.path(), "a.trx", VALID_TRX);
        let b = create_file(temp_dir.path(), "b.trx", VALID_TRX);

        let mut options = RunOptions::new([path_string(&a), path_string(&b)]);
        let reporter = RecordingReporter::default();
        let result = Worker::new().run(&mut options, &reporter).unwrap();

        assert_eq!(result.exit_code(), 0);
        assert!(!result.any_failures());
        assert!(temp_dir.path().join("a.xml").is_file());
        assert!(temp_dir.path().join("b.xml").is_file());
        assert_eq!(reporter.count("ok "), 2);
        assert_eq!(reporter.count("error "), 0);
    }

    #[test]
    fn test_one_malformed_file_does_not_stop_the_others() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..9 {
            create_file(temp_dir.path(), &format!("ok{}.trx", i), VALID_TRX);
        }
        create_file(temp_dir.path(), "bad.trx", "<TestRun><Results><UnitTestResult");

        let pattern = path_string(&temp_dir.path().join("*.trx"));
        let mut options = RunOptions::new([pattern]);
        let reporter = RecordingReporter::default();
        let result = Worker::new().run(&mut options, &reporter).unwrap();

        assert_eq!(result.results.len(), 10);
        assert_eq!(result.stats.get_success_count(), 9);
        assert_eq!(result.stats.get_error_count(), 1);
        assert!(result.any_failures());
        assert_eq!(result.exit_code(), 1);
        assert_eq!(reporter.count("error "), 1);

        // 각 파일은 출력 파일 또는 에러 중 정확히 하나만 남김
        for r in &result.results {
            assert_ne!(r.is_success(), r.error.is_some());
            assert_eq!(r.output.exists(), r.is_success());
        }
        assert!(!temp_dir.path().join("bad.xml").exists());
        assert_eq!(reporter.events().last().map(String::as_str), Some("done"));
    }

    #[test]
    fn test_output_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_file(temp_dir.path(), "in/run.trx", VALID_TRX);
        let out_dir = temp_dir.path().join("out/deeply/nested");

        let mut options =
            RunOptions::new([path_string(&input)]).with_output_directory(Some(out_dir.clone()));
        let result = Worker::new()
            .run(&mut options, &RecordingReporter::default())
            .unwrap();

        assert_eq!(result.exit_code(), 0);
        assert!(out_dir.join("run.xml").is_file());
        assert!(!temp_dir.path().join("in/run.xml").exists());
    }

    #[test]
    fn test_missing_input_converts_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let missing = path_string(&temp_dir.path().join("missing.trx"));

        let mut options = RunOptions::new([missing.clone()]);
        let reporter = RecordingReporter::default();
        let result = Worker::new().run(&mut options, &reporter).unwrap();

        assert!(options.input_files.is_empty());
        assert!(result.results.is_empty());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(reporter.events()[0], format!("unresolved {}", missing));
    }

    #[test]
    fn test_recursive_pattern_and_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let a = create_file(temp_dir.path(), "p1/TestResults/a.trx", VALID_TRX);
        create_file(temp_dir.path(), "p2/TestResults/b.trx", VALID_TRX);

        let mut options = RunOptions::new([
            path_string(&a),
            path_string(&temp_dir.path().join("**/*.trx")),
        ]);
        let result = Worker::new()
            .run(&mut options, &RecordingReporter::default())
            .unwrap();

        assert_eq!(options.input_files.len(), 2);
        assert_eq!(options.input_files[0], path_string(&a));
        assert_eq!(result.stats.get_success_count(), 2);
        assert!(temp_dir.path().join("p2/TestResults/b.xml").is_file());
    }
}

mod output_tests {
    use super::*;

    #[test]
    fn test_junit_output_content() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_file(temp_dir.path(), "run.trx", VALID_TRX);

        let mut options = RunOptions::new([path_string(&input)]);
        Worker::new()
            .run(&mut options, &RecordingReporter::default())
            .unwrap();

        let xml = fs::read_to_string(temp_dir.path().join("run.xml")).unwrap();
        assert!(xml.contains("<testsuites"));
        assert!(xml.contains(r#"<testsuite name="Calc.Tests" hostname="ci-1""#));
        assert!(xml.contains(r#"timestamp="2024-03-01T10:00:00""#));
        assert!(xml.contains(r#"<testcase name="AddsNumbers" classname="Calc.Tests" time="0.500"/>"#));
        assert!(xml.contains(r#"<failure message="Expected exception was not thrown">"#));
    }

    #[test]
    fn test_trx_output_content() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_file(temp_dir.path(), "report.xml", VALID_JUNIT);

        let mut options = RunOptions::new([path_string(&input)]).with_convert_to_junit(false);
        let reporter = RecordingReporter::default();
        let result = Worker::new().run(&mut options, &reporter).unwrap();

        assert_eq!(result.direction, Direction::JunitToTrx);
        let trx = fs::read_to_string(temp_dir.path().join("report.trx")).unwrap();
        assert!(trx.contains("<TestRun"));
        assert!(trx.contains(r#"xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010""#));
        assert!(trx.contains(r#"outcome="Error""#));
        assert!(trx.contains(r#"testName="pkg.Parser.parses_garbage""#));
        assert!(trx.contains(r#"<TestMethod codeBase="pkg.Parser""#));
        assert!(trx.contains(r#"<Counters total="2" executed="2" passed="1" failed="0" error="1""#));
    }

    #[test]
    fn test_wrong_dialect_is_reported_as_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_file(temp_dir.path(), "report.xml", VALID_JUNIT);

        // JUnit 파일을 TRX로 읽으면 실패
        let mut options = RunOptions::new([path_string(&input)]);
        let reporter = RecordingReporter::default();
        let result = Worker::new().run(&mut options, &reporter).unwrap();

        assert_eq!(result.exit_code(), 1);
        let failure = result.failures().next().unwrap();
        assert!(failure.error.as_deref().unwrap().contains("TRX"));
        // 입력 파일은 그대로 남음
        assert_eq!(fs::read_to_string(&input).unwrap(), VALID_JUNIT);
    }

    #[test]
    fn test_output_is_utf8_without_bom() {
        let temp_dir = TempDir::new().unwrap();
        let mut with_bom = String::from("\u{feff}");
        with_bom.push_str(&VALID_TRX.replace("AddsNumbers", "Addiert_Zahlen_äöü"));
        let input = create_file(temp_dir.path(), "bom.trx", &with_bom);

        let mut options = RunOptions::new([path_string(&input)]);
        let result = Worker::new()
            .run(&mut options, &RecordingReporter::default())
            .unwrap();
        assert_eq!(result.exit_code(), 0);

        let bytes = fs::read(temp_dir.path().join("bom.xml")).unwrap();
        assert!(!bytes.starts_with(b"\xEF\xBB\xBF"));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Addiert_Zahlen_äöü"));
    }

    #[test]
    fn test_round_trip_preserves_outcomes() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_file(temp_dir.path(), "junit/report.xml", VALID_JUNIT);
        let trx_dir = temp_dir.path().join("trx");
        let junit_dir = temp_dir.path().join("junit-again");

        let mut to_trx = RunOptions::new([path_string(&input)])
            .with_convert_to_junit(false)
            .with_output_directory(Some(trx_dir.clone()));
        Worker::new()
            .run(&mut to_trx, &RecordingReporter::default())
            .unwrap();

        let mut back = RunOptions::new([path_string(&trx_dir.join("report.trx"))])
            .with_output_directory(Some(junit_dir.clone()));
        let result = Worker::new()
            .run(&mut back, &RecordingReporter::default())
            .unwrap();
        assert_eq!(result.exit_code(), 0);

        let xml = fs::read_to_string(junit_dir.join("report.xml")).unwrap();
        assert!(xml.contains(r#"tests="2" failures="0" errors="1" skipped="0""#));
        assert!(xml.contains(r#"<error message="panic">thread panicked</error>"#));
        assert!(xml.contains(r#"classname="pkg.Parser""#));
    }
}

mod pattern_tests {
    use trx2junit::PatternMatcher;

    #[test]
    fn test_glob_star() {
        let matcher = PatternMatcher::new("*.trx").unwrap();
        assert!(matcher.matches("test.trx"));
        assert!(!matcher.matches("test.xml"));
    }

    #[test]
    fn test_glob_brackets() {
        let matcher = PatternMatcher::new("[abc]*.trx").unwrap();
        assert!(matcher.matches("alpha.trx"));
        assert!(matcher.matches("beta.trx"));
        assert!(!matcher.matches("delta.trx"));
    }

    #[test]
    fn test_complex_pattern() {
        let matcher = PatternMatcher::new("run_*_[0-9].trx").unwrap();
        assert!(matcher.matches("run_nightly_1.trx"));
        assert!(!matcher.matches("run_nightly_10.trx")); // 10은 두 자리
        assert!(!matcher.matches("other_nightly_1.trx"));
    }
}

mod error_tests {
    use std::path::PathBuf;
    use trx2junit::Trx2JunitError;

    #[test]
    fn test_error_display() {
        let error = Trx2JunitError::InvalidOptions {
            reason: "입력 파일이 지정되지 않았습니다".to_string(),
        };
        assert!(error.to_string().contains("유효하지 않은 실행 옵션"));
    }

    #[test]
    fn test_file_open_error_display() {
        let error = Trx2JunitError::FileOpenError {
            file: PathBuf::from("run.trx"),
            reason: "not found".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("파일을 열 수 없습니다"));
        assert!(msg.contains("run.trx"));
    }
}

mod cli_tests {
    use clap::Parser;
    use std::path::PathBuf;
    use trx2junit::{Args, Direction};

    #[test]
    fn test_default_direction() {
        let args = Args::try_parse_from(["trx2junit", "a.trx", "b/*.trx"]).unwrap();
        let options = args.to_run_options();

        assert_eq!(options.input_files, vec!["a.trx", "b/*.trx"]);
        assert_eq!(options.direction(), Direction::TrxToJunit);
        assert!(options.output_directory.is_none());
    }

    #[test]
    fn test_junit2trx_with_output() {
        let args =
            Args::try_parse_from(["trx2junit", "--junit2trx", "--output", "out", "r.xml"]).unwrap();
        let options = args.to_run_options();

        assert_eq!(options.direction(), Direction::JunitToTrx);
        assert_eq!(options.output_directory, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_inputs_required() {
        assert!(Args::try_parse_from(["trx2junit"]).is_err());
    }
}
