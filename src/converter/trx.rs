//! TRX (Visual Studio 테스트 실행 결과) 읽기/쓰기

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::time::Duration;
use uuid::Uuid;

use super::model::{Outcome, Problem, TestCase, TestResults};
use super::xml::{
    append_text, attributes, format_timespan, format_trx_timestamp, local_name, parse_timespan,
    parse_timestamp, write_text_element,
};
use crate::error::{Result, Trx2JunitError};

const FORMAT: &str = "TRX";
const TRX_NAMESPACE: &str = "http://microsoft.com/schemas/VisualStudio/TeamTest/2010";
const UNIT_TEST_TYPE: &str = "13cdc9d9-ddb5-4fa4-a97d-d965ccfc6d4b";
const ADAPTER_TYPE_NAME: &str = "executor://trx2junit/v1";
const RESULTS_NOT_IN_A_LIST_ID: &str = "8c84fa94-04c1-424b-9868-57a2d4851a1d";
const ALL_LOADED_RESULTS_ID: &str = "19431567-8539-422a-85d7-44ee4e166bda";

/// `UnitTestResult` 요소에서 읽은 값
#[derive(Debug, Default)]
struct UnitTestResult {
    attrs: HashMap<String, String>,
    std_out: Option<String>,
    std_err: Option<String>,
    message: Option<String>,
    stack_trace: Option<String>,
    has_inner_results: bool,
}

/// `UnitTest` 정의의 `TestMethod`
#[derive(Debug, Default)]
struct TestMethod {
    class_name: Option<String>,
    name: Option<String>,
}

/// 파싱 중 상태
#[derive(Default)]
struct ParseState {
    run: TestResults,
    stack: Vec<String>,
    open_results: Vec<UnitTestResult>,
    finished: Vec<UnitTestResult>,
    definitions: HashMap<String, TestMethod>,
    current_definition: Option<String>,
}

impl ParseState {
    fn start(&mut self, name: &str, element: &BytesStart<'_>) -> Result<()> {
        match name {
            "TestRun" => {
                self.run.name = attributes(element)?.remove("name");
            }
            "Times" => {
                let attrs = attributes(element)?;
                self.run.timestamp = attrs
                    .get("start")
                    .or_else(|| attrs.get("creation"))
                    .and_then(|v| parse_timestamp(v));
            }
            "UnitTestResult" => {
                if self.stack.last().map(String::as_str) == Some("InnerResults") {
                    if let Some(parent) = self.open_results.last_mut() {
                        parent.has_inner_results = true;
                    }
                }
                self.open_results.push(UnitTestResult {
                    attrs: attributes(element)?,
                    ..Default::default()
                });
            }
            "UnitTest" => {
                let id = attributes(element)?.remove("id");
                if let Some(ref id) = id {
                    self.definitions.entry(id.clone()).or_default();
                }
                self.current_definition = id;
            }
            "TestMethod" => {
                if let Some(ref id) = self.current_definition {
                    let mut attrs = attributes(element)?;
                    let method = self.definitions.entry(id.clone()).or_default();
                    method.class_name = attrs.remove("className");
                    method.name = attrs.remove("name");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &str) {
        match name {
            "UnitTestResult" => {
                if let Some(result) = self.open_results.pop() {
                    self.finished.push(result);
                }
            }
            "UnitTest" => self.current_definition = None,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let Some(result) = self.open_results.last_mut() else {
            return;
        };
        let target = match self.stack.last().map(String::as_str) {
            Some("StdOut") => &mut result.std_out,
            Some("StdErr") => &mut result.std_err,
            Some("Message") => &mut result.message,
            Some("StackTrace") => &mut result.stack_trace,
            _ => return,
        };
        append_text(target, text);
    }
}

/// TRX 문서 파싱
pub(crate) fn parse(bytes: &[u8]) -> Result<TestResults> {
    let mut reader = Reader::from_reader(bytes);

    let mut buf = Vec::new();
    let mut state = ParseState::default();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = local_name(&e);
                check_root(&mut seen_root, &name)?;
                state.start(&name, &e)?;
                state.stack.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                check_root(&mut seen_root, &name)?;
                state.start(&name, &e)?;
                state.end(&name);
            }
            Event::End(_) => {
                if let Some(name) = state.stack.pop() {
                    state.end(&name);
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                // 요소 사이 공백만 건너뛰고 내용의 들여쓰기는 그대로 둠
                if !text.trim().is_empty() {
                    state.text(&text);
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                state.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Trx2JunitError::InvalidReport {
            format: FORMAT,
            reason: "루트 요소가 없습니다".to_string(),
        });
    }
    if let Some(open) = state.stack.last() {
        return Err(Trx2JunitError::InvalidReport {
            format: FORMAT,
            reason: format!("<{}> 요소가 닫히지 않았습니다", open),
        });
    }

    let ParseState {
        mut run,
        finished,
        definitions,
        ..
    } = state;

    for result in finished.into_iter().filter(|r| !r.has_inner_results) {
        run.push_case(to_test_case(result, &definitions)?);
    }

    Ok(run)
}

fn check_root(seen_root: &mut bool, name: &str) -> Result<()> {
    if *seen_root {
        return Ok(());
    }
    if name != "TestRun" {
        return Err(Trx2JunitError::InvalidReport {
            format: FORMAT,
            reason: format!("루트 요소가 TestRun이 아닙니다: <{}>", name),
        });
    }
    *seen_root = true;
    Ok(())
}

fn to_test_case(
    mut result: UnitTestResult,
    definitions: &HashMap<String, TestMethod>,
) -> Result<TestCase> {
    let attrs = &mut result.attrs;
    let method = attrs.get("testId").and_then(|id| definitions.get(id));
    let test_name = attrs.remove("testName");

    // className에 어셈블리 정보가 붙은 경우 (`Ns.Class, Assembly, Version=...`)
    let class_name = method
        .and_then(|m| m.class_name.as_deref())
        .map(|c| c.split(',').next().unwrap_or(c).trim().to_string())
        .or_else(|| test_name.as_deref().map(class_from_test_name))
        .unwrap_or_default();

    let name = match (&test_name, method.and_then(|m| m.name.as_deref())) {
        (Some(test_name), _) => test_name
            .strip_prefix(&format!("{}.", class_name))
            .unwrap_or(test_name)
            .to_string(),
        (None, Some(method_name)) => method_name.to_string(),
        (None, None) => {
            return Err(Trx2JunitError::InvalidReport {
                format: FORMAT,
                reason: "UnitTestResult에 testName이 없습니다".to_string(),
            })
        }
    };

    let start_time = attrs.get("startTime").and_then(|v| parse_timestamp(v));
    let end_time = attrs.get("endTime").and_then(|v| parse_timestamp(v));

    let time = match attrs.get("duration") {
        Some(value) => parse_timespan(value).ok_or_else(|| Trx2JunitError::InvalidReport {
            format: FORMAT,
            reason: format!("잘못된 duration 값 ({}): {}", name, value),
        })?,
        None => match (start_time, end_time) {
            (Some(start), Some(end)) => (end - start).to_std().unwrap_or(Duration::ZERO),
            _ => Duration::ZERO,
        },
    };

    let problem = Problem {
        message: result.message.take(),
        kind: None,
        stack_trace: result.stack_trace.take(),
    };

    let outcome = match attrs.get("outcome").map(String::as_str) {
        Some("Passed") | Some("PassedButRunAborted") | Some("Completed") | Some("Warning") => {
            Outcome::Passed
        }
        Some("Failed") => Outcome::Failed(problem),
        Some(kind @ ("Timeout" | "Aborted")) => Outcome::Failed(Problem {
            kind: Some(kind.to_string()),
            ..problem
        }),
        Some("Error") => Outcome::Errored(problem),
        _ => Outcome::Skipped {
            message: problem.message,
        },
    };

    Ok(TestCase {
        name,
        class_name,
        time,
        start_time,
        computer_name: attrs.remove("computerName"),
        outcome,
        system_out: result.std_out,
        system_err: result.std_err,
    })
}

/// `Ns.Class.Method(args)`에서 `Ns.Class` 추출
fn class_from_test_name(test_name: &str) -> String {
    let without_args = test_name.split('(').next().unwrap_or(test_name);
    match without_args.rfind('.') {
        Some(idx) => without_args[..idx].to_string(),
        None => String::new(),
    }
}

/// 이름 기반 식별자 (같은 입력이면 항상 같은 값)
fn stable_id(kind: &str, value: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}:{}", kind, value).as_bytes()).to_string()
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}

fn outcome_name(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "Passed",
        Outcome::Failed(_) => "Failed",
        Outcome::Errored(_) => "Error",
        Outcome::Skipped { .. } => "NotExecuted",
    }
}

/// 출력용으로 준비된 케이스
struct Entry<'a> {
    case: &'a TestCase,
    full_name: String,
    test_id: String,
    execution_id: String,
    computer_name: Option<&'a str>,
    start_time: Option<chrono::DateTime<chrono::FixedOffset>>,
}

/// TRX 문서 출력
pub(crate) fn write<W: Write>(results: &TestResults, output: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(output, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let run_name = results.name.clone().unwrap_or_else(|| "trx2junit".to_string());
    let entries: Vec<Entry<'_>> = results
        .suites
        .iter()
        .flat_map(|suite| suite.cases.iter().map(move |case| (suite, case)))
        .enumerate()
        .map(|(index, (suite, case))| {
            let full_name = case.full_name();
            Entry {
                case,
                test_id: stable_id("test", &full_name),
                execution_id: stable_id("execution", &format!("{}#{}", full_name, index)),
                full_name,
                computer_name: case
                    .computer_name
                    .as_deref()
                    .or(suite.hostname.as_deref()),
                start_time: case.start_time.or_else(|| suite.start_time()),
            }
        })
        .collect();

    let mut test_run = BytesStart::new("TestRun");
    test_run.push_attribute(("id", stable_id("run", &run_name).as_str()));
    test_run.push_attribute(("name", run_name.as_str()));
    test_run.push_attribute(("xmlns", TRX_NAMESPACE));
    writer.write_event(Event::Start(test_run))?;

    if let Some(start) = results.start_time() {
        let finish = start + to_chrono(results.time());
        let start = format_trx_timestamp(&start);
        let mut times = BytesStart::new("Times");
        times.push_attribute(("creation", start.as_str()));
        times.push_attribute(("queuing", start.as_str()));
        times.push_attribute(("start", start.as_str()));
        times.push_attribute(("finish", format_trx_timestamp(&finish).as_str()));
        writer.write_event(Event::Empty(times))?;
    }

    write_results(&mut writer, &entries)?;
    write_definitions(&mut writer, &entries)?;
    write_entries(&mut writer, &entries)?;
    write_test_lists(&mut writer)?;
    write_summary(&mut writer, results)?;

    writer.write_event(Event::End(BytesEnd::new("TestRun")))?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_results<W: Write>(writer: &mut Writer<W>, entries: &[Entry<'_>]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Results")))?;

    for entry in entries {
        let case = entry.case;
        let duration = format_timespan(case.time);
        let start = entry.start_time.map(|s| format_trx_timestamp(&s));
        let end = entry.start_time.map(|s| {
            format_trx_timestamp(&(s + to_chrono(case.time)))
        });

        let mut element = BytesStart::new("UnitTestResult");
        element.push_attribute(("executionId", entry.execution_id.as_str()));
        element.push_attribute(("testId", entry.test_id.as_str()));
        element.push_attribute(("testName", entry.full_name.as_str()));
        if let Some(computer_name) = entry.computer_name {
            element.push_attribute(("computerName", computer_name));
        }
        element.push_attribute(("duration", duration.as_str()));
        if let (Some(start), Some(end)) = (&start, &end) {
            element.push_attribute(("startTime", start.as_str()));
            element.push_attribute(("endTime", end.as_str()));
        }
        element.push_attribute(("testType", UNIT_TEST_TYPE));
        element.push_attribute(("outcome", outcome_name(&case.outcome)));
        element.push_attribute(("testListId", RESULTS_NOT_IN_A_LIST_ID));

        let (message, stack_trace) = match &case.outcome {
            Outcome::Passed => (None, None),
            Outcome::Failed(p) | Outcome::Errored(p) => {
                (p.message.as_deref(), p.stack_trace.as_deref())
            }
            Outcome::Skipped { message } => (message.as_deref(), None),
        };

        let has_output = case.system_out.is_some()
            || case.system_err.is_some()
            || message.is_some()
            || stack_trace.is_some();

        if !has_output {
            writer.write_event(Event::Empty(element))?;
            continue;
        }

        writer.write_event(Event::Start(element))?;
        writer.write_event(Event::Start(BytesStart::new("Output")))?;
        if let Some(ref out) = case.system_out {
            write_text_element(writer, "StdOut", out)?;
        }
        if let Some(ref err) = case.system_err {
            write_text_element(writer, "StdErr", err)?;
        }
        if message.is_some() || stack_trace.is_some() {
            writer.write_event(Event::Start(BytesStart::new("ErrorInfo")))?;
            if let Some(message) = message {
                write_text_element(writer, "Message", message)?;
            }
            if let Some(stack_trace) = stack_trace {
                write_text_element(writer, "StackTrace", stack_trace)?;
            }
            writer.write_event(Event::End(BytesEnd::new("ErrorInfo")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Output")))?;
        writer.write_event(Event::End(BytesEnd::new("UnitTestResult")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Results")))?;
    Ok(())
}

fn write_definitions<W: Write>(writer: &mut Writer<W>, entries: &[Entry<'_>]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("TestDefinitions")))?;

    let mut written = HashSet::new();
    for entry in entries {
        if !written.insert(entry.test_id.as_str()) {
            continue;
        }
        let case = entry.case;

        let mut unit_test = BytesStart::new("UnitTest");
        unit_test.push_attribute(("name", case.name.as_str()));
        unit_test.push_attribute(("storage", case.class_name.as_str()));
        unit_test.push_attribute(("id", entry.test_id.as_str()));
        writer.write_event(Event::Start(unit_test))?;

        let mut execution = BytesStart::new("Execution");
        execution.push_attribute(("id", entry.execution_id.as_str()));
        writer.write_event(Event::Empty(execution))?;

        let mut method = BytesStart::new("TestMethod");
        method.push_attribute(("codeBase", case.class_name.as_str()));
        method.push_attribute(("adapterTypeName", ADAPTER_TYPE_NAME));
        method.push_attribute(("className", case.class_name.as_str()));
        method.push_attribute(("name", case.name.as_str()));
        writer.write_event(Event::Empty(method))?;

        writer.write_event(Event::End(BytesEnd::new("UnitTest")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("TestDefinitions")))?;
    Ok(())
}

fn write_entries<W: Write>(writer: &mut Writer<W>, entries: &[Entry<'_>]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("TestEntries")))?;
    for entry in entries {
        let mut element = BytesStart::new("TestEntry");
        element.push_attribute(("testId", entry.test_id.as_str()));
        element.push_attribute(("executionId", entry.execution_id.as_str()));
        element.push_attribute(("testListId", RESULTS_NOT_IN_A_LIST_ID));
        writer.write_event(Event::Empty(element))?;
    }
    writer.write_event(Event::End(BytesEnd::new("TestEntries")))?;
    Ok(())
}

fn write_test_lists<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("TestLists")))?;
    for (name, id) in [
        ("Results Not in a List", RESULTS_NOT_IN_A_LIST_ID),
        ("All Loaded Results", ALL_LOADED_RESULTS_ID),
    ] {
        let mut element = BytesStart::new("TestList");
        element.push_attribute(("name", name));
        element.push_attribute(("id", id));
        writer.write_event(Event::Empty(element))?;
    }
    writer.write_event(Event::End(BytesEnd::new("TestLists")))?;
    Ok(())
}

fn write_summary<W: Write>(writer: &mut Writer<W>, results: &TestResults) -> Result<()> {
    let counts = results.counts();
    let outcome = if counts.failures + counts.errors > 0 {
        "Failed"
    } else {
        "Completed"
    };

    let mut summary = BytesStart::new("ResultSummary");
    summary.push_attribute(("outcome", outcome));
    writer.write_event(Event::Start(summary))?;

    let values = [
        ("total", counts.tests),
        ("executed", counts.tests - counts.skipped),
        ("passed", counts.passed),
        ("failed", counts.failures),
        ("error", counts.errors),
        ("timeout", 0),
        ("aborted", 0),
        ("inconclusive", 0),
        ("passedButRunAborted", 0),
        ("notRunnable", 0),
        ("notExecuted", counts.skipped),
        ("disconnected", 0),
        ("warning", 0),
        ("completed", 0),
        ("inProgress", 0),
        ("pending", 0),
    ];
    let mut counters = BytesStart::new("Counters");
    for (key, value) in values {
        counters.push_attribute((key, value.to_string().as_str()));
    }
    writer.write_event(Event::Empty(counters))?;

    writer.write_event(Event::End(BytesEnd::new("ResultSummary")))?;
    Ok(())
}
