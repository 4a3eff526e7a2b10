//! JUnit XML 읽기/쓰기

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::Write;

use super::model::{Outcome, Problem, TestCase, TestResults, TestSuite};
use super::xml::{
    append_text, attributes, format_junit_timestamp, format_seconds, local_name, parse_seconds,
    parse_timestamp, write_text_element,
};
use crate::error::{Result, Trx2JunitError};

const FORMAT: &str = "JUnit";

const TESTSUITES_TAG: &str = "testsuites";
const TESTSUITE_TAG: &str = "testsuite";
const TESTCASE_TAG: &str = "testcase";
const FAILURE_TAG: &str = "failure";
const ERROR_TAG: &str = "error";
const SKIPPED_TAG: &str = "skipped";
const SYSTEM_OUT_TAG: &str = "system-out";
const SYSTEM_ERR_TAG: &str = "system-err";

/// 파싱 중 상태
#[derive(Default)]
struct ParseState {
    run: TestResults,
    stack: Vec<String>,
    open_suites: Vec<TestSuite>,
    open_case: Option<TestCase>,
}

impl ParseState {
    fn start(&mut self, name: &str, element: &BytesStart<'_>) -> Result<()> {
        match name {
            TESTSUITES_TAG => {
                self.run.name = attributes(element)?.remove("name");
            }
            TESTSUITE_TAG => {
                let mut attrs = attributes(element)?;
                let mut suite = TestSuite::new(attrs.remove("name").unwrap_or_default());
                suite.hostname = attrs.remove("hostname");
                suite.timestamp = attrs.get("timestamp").and_then(|v| parse_timestamp(v));
                self.open_suites.push(suite);
            }
            TESTCASE_TAG => {
                let mut attrs = attributes(element)?;
                let name = attrs.remove("name").unwrap_or_default();
                let class_name = attrs
                    .remove("classname")
                    .or_else(|| self.open_suites.last().map(|s| s.name.clone()))
                    .unwrap_or_default();
                let mut case = TestCase::new(class_name, name);
                case.time = parse_time(&attrs, &case.name)?;
                case.computer_name = self.open_suites.last().and_then(|s| s.hostname.clone());
                self.open_case = Some(case);
            }
            FAILURE_TAG | ERROR_TAG => {
                if let Some(ref mut case) = self.open_case {
                    let mut attrs = attributes(element)?;
                    let problem = Problem {
                        message: attrs.remove("message"),
                        kind: attrs.remove("type"),
                        stack_trace: None,
                    };
                    case.outcome = if name == FAILURE_TAG {
                        Outcome::Failed(problem)
                    } else {
                        Outcome::Errored(problem)
                    };
                }
            }
            SKIPPED_TAG => {
                if let Some(ref mut case) = self.open_case {
                    case.outcome = Outcome::Skipped {
                        message: attributes(element)?.remove("message"),
                    };
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &str) {
        match name {
            TESTCASE_TAG => {
                if let Some(case) = self.open_case.take() {
                    match self.open_suites.last_mut() {
                        Some(suite) => suite.cases.push(case),
                        // 스위트 밖의 테스트 케이스는 클래스 이름으로 묶음
                        None => self.run.push_case(case),
                    }
                }
            }
            // 중첩된 스위트는 평탄화
            TESTSUITE_TAG => {
                if let Some(suite) = self.open_suites.pop() {
                    self.run.suites.push(suite);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let parent = self.stack.last().map(String::as_str);
        if let Some(ref mut case) = self.open_case {
            match (parent, &mut case.outcome) {
                (Some(FAILURE_TAG), Outcome::Failed(p)) | (Some(ERROR_TAG), Outcome::Errored(p)) => {
                    append_text(&mut p.stack_trace, text)
                }
                (Some(SKIPPED_TAG), Outcome::Skipped { message }) => {
                    if message.is_none() {
                        *message = Some(text.to_string());
                    }
                }
                (Some(SYSTEM_OUT_TAG), _) => append_text(&mut case.system_out, text),
                (Some(SYSTEM_ERR_TAG), _) => append_text(&mut case.system_err, text),
                _ => {}
            }
        } else if let Some(suite) = self.open_suites.last_mut() {
            match parent {
                Some(SYSTEM_OUT_TAG) => append_text(&mut suite.system_out, text),
                Some(SYSTEM_ERR_TAG) => append_text(&mut suite.system_err, text),
                _ => {}
            }
        }
    }
}

fn parse_time(attrs: &HashMap<String, String>, name: &str) -> Result<std::time::Duration> {
    match attrs.get("time") {
        Some(value) => parse_seconds(value).ok_or_else(|| Trx2JunitError::InvalidReport {
            format: FORMAT,
            reason: format!("잘못된 time 값 ({}): {}", name, value),
        }),
        None => Ok(std::time::Duration::ZERO),
    }
}

/// JUnit XML 문서 파싱
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

    Ok(state.run)
}

fn check_root(seen_root: &mut bool, name: &str) -> Result<()> {
    if *seen_root {
        return Ok(());
    }
    if name != TESTSUITES_TAG && name != TESTSUITE_TAG {
        return Err(Trx2JunitError::InvalidReport {
            format: FORMAT,
            reason: format!("루트 요소가 testsuites/testsuite가 아닙니다: <{}>", name),
        });
    }
    *seen_root = true;
    Ok(())
}

/// JUnit XML 문서 출력
pub(crate) fn write<W: Write>(results: &TestResults, output: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(output, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let counts = results.counts();
    let mut testsuites = BytesStart::new(TESTSUITES_TAG);
    if let Some(ref name) = results.name {
        testsuites.push_attribute(("name", name.as_str()));
    }
    testsuites.push_attribute(("tests", counts.tests.to_string().as_str()));
    testsuites.push_attribute(("failures", counts.failures.to_string().as_str()));
    testsuites.push_attribute(("errors", counts.errors.to_string().as_str()));
    testsuites.push_attribute(("skipped", counts.skipped.to_string().as_str()));
    testsuites.push_attribute(("time", format_seconds(results.time()).as_str()));

    if results.suites.is_empty() {
        writer.write_event(Event::Empty(testsuites))?;
    } else {
        writer.write_event(Event::Start(testsuites))?;
        for (id, suite) in results.suites.iter().enumerate() {
            write_suite(&mut writer, id, suite)?;
        }
        writer.write_event(Event::End(BytesEnd::new(TESTSUITES_TAG)))?;
    }

    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_suite<W: Write>(writer: &mut Writer<W>, id: usize, suite: &TestSuite) -> Result<()> {
    let counts = suite.counts();
    let mut element = BytesStart::new(TESTSUITE_TAG);
    element.push_attribute(("name", suite.name.as_str()));
    if let Some(ref hostname) = suite.hostname {
        element.push_attribute(("hostname", hostname.as_str()));
    }
    element.push_attribute(("id", id.to_string().as_str()));
    element.push_attribute(("package", suite.name.as_str()));
    element.push_attribute(("tests", counts.tests.to_string().as_str()));
    element.push_attribute(("failures", counts.failures.to_string().as_str()));
    element.push_attribute(("errors", counts.errors.to_string().as_str()));
    element.push_attribute(("skipped", counts.skipped.to_string().as_str()));
    element.push_attribute(("time", format_seconds(suite.time()).as_str()));
    if let Some(ts) = suite.start_time() {
        element.push_attribute(("timestamp", format_junit_timestamp(&ts).as_str()));
    }
    writer.write_event(Event::Start(element))?;

    for case in &suite.cases {
        write_case(writer, case)?;
    }
    if let Some(ref out) = suite.system_out {
        write_text_element(writer, SYSTEM_OUT_TAG, out)?;
    }
    if let Some(ref err) = suite.system_err {
        write_text_element(writer, SYSTEM_ERR_TAG, err)?;
    }

    writer.write_event(Event::End(BytesEnd::new(TESTSUITE_TAG)))?;
    Ok(())
}

fn write_case<W: Write>(writer: &mut Writer<W>, case: &TestCase) -> Result<()> {
    let mut element = BytesStart::new(TESTCASE_TAG);
    element.push_attribute(("name", case.name.as_str()));
    element.push_attribute(("classname", case.class_name.as_str()));
    element.push_attribute(("time", format_seconds(case.time).as_str()));

    let has_children = !matches!(case.outcome, Outcome::Passed)
        || case.system_out.is_some()
        || case.system_err.is_some();
    if !has_children {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }
    writer.write_event(Event::Start(element))?;

    match &case.outcome {
        Outcome::Passed => {}
        Outcome::Failed(problem) => write_problem(writer, FAILURE_TAG, problem)?,
        Outcome::Errored(problem) => write_problem(writer, ERROR_TAG, problem)?,
        Outcome::Skipped { message } => {
            let mut skipped = BytesStart::new(SKIPPED_TAG);
            if let Some(message) = message {
                skipped.push_attribute(("message", message.as_str()));
            }
            writer.write_event(Event::Empty(skipped))?;
        }
    }

    if let Some(ref out) = case.system_out {
        write_text_element(writer, SYSTEM_OUT_TAG, out)?;
    }
    if let Some(ref err) = case.system_err {
        write_text_element(writer, SYSTEM_ERR_TAG, err)?;
    }

    writer.write_event(Event::End(BytesEnd::new(TESTCASE_TAG)))?;
    Ok(())
}

fn write_problem<W: Write>(writer: &mut Writer<W>, tag: &str, problem: &Problem) -> Result<()> {
    let mut element = BytesStart::new(tag);
    if let Some(ref message) = problem.message {
        element.push_attribute(("message", message.as_str()));
    }
    if let Some(ref kind) = problem.kind {
        element.push_attribute(("type", kind.as_str()));
    }
    match problem.stack_trace {
        Some(ref stack_trace) => {
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Text(quick_xml::events::BytesText::new(stack_trace)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        None => writer.write_event(Event::Empty(element))?,
    }
    Ok(())
}
