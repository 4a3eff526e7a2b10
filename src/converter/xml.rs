//! XML 읽기/쓰기 공통 도우미

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use crate::error::Result;
pub(crate) use crate::stats::format_seconds;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 BOM 제거
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// 요소의 속성을 로컬 이름 기준 맵으로 수집
pub(crate) fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in element.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

/// 요소의 로컬 이름
pub(crate) fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// 텍스트를 기존 값 뒤에 이어 붙임 (CDATA와 텍스트가 섞인 경우)
pub(crate) fn append_text(target: &mut Option<String>, text: &str) {
    match target {
        Some(existing) => existing.push_str(text),
        None => *target = Some(text.to_string()),
    }
}

/// JUnit `time` 속성 파싱 (천 단위 구분자 허용)
pub(crate) fn parse_seconds(value: &str) -> Option<Duration> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Some(Duration::ZERO);
    }
    let seconds: f64 = cleaned.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(seconds))
}

/// TRX `duration` 형식 (`[d.]hh:mm:ss[.fffffff]`) 파싱
pub(crate) fn parse_timespan(value: &str) -> Option<Duration> {
    let mut parts = value.trim().split(':');
    let hours_part = parts.next()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds_part = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let (days, hours) = match hours_part.split_once('.') {
        Some((d, h)) => (d.parse::<u64>().ok()?, h.parse::<u64>().ok()?),
        None => (0, hours_part.parse::<u64>().ok()?),
    };

    let (whole, fraction) = match seconds_part.split_once('.') {
        Some((s, f)) => (s.parse::<u64>().ok()?, f),
        None => (seconds_part.parse::<u64>().ok()?, ""),
    };

    // 100ns 틱 단위까지, 나노초로 변환
    let mut nanos: u32 = 0;
    for (i, c) in fraction.chars().take(9).enumerate() {
        let digit = c.to_digit(10)?;
        nanos += digit * 10u32.pow(8 - i as u32);
    }

    let secs = ((days * 24 + hours) * 60 + minutes) * 60 + whole;
    Some(Duration::new(secs, nanos))
}

/// TRX `duration` 형식으로 출력
pub(crate) fn format_timespan(duration: Duration) -> String {
    let secs = duration.as_secs();
    let ticks = duration.subsec_nanos() / 100;
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    format!("{:02}:{:02}:{:02}.{:07}", hours, minutes, seconds, ticks)
}

/// RFC 3339 또는 오프셋 없는 ISO 8601 시각 파싱 (오프셋이 없으면 UTC)
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts);
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Some(Utc.from_utc_datetime(&naive).fixed_offset())
}

/// JUnit `timestamp` 형식 (UTC, 오프셋 없음)
pub(crate) fn format_junit_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// TRX 시각 형식 (`2024-01-01T12:00:00.0000000+01:00`)
pub(crate) fn format_trx_timestamp(ts: &DateTime<FixedOffset>) -> String {
    format!(
        "{}.{:07}{}",
        ts.format("%Y-%m-%dT%H:%M:%S"),
        ts.timestamp_subsec_nanos() / 100,
        ts.format("%:z")
    )
}

/// 텍스트 요소 출력 (`<tag>text</tag>`)
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(b"\xEF\xBB\xBF<a/>"), b"<a/>");
        assert_eq!(strip_bom(b"<a/>"), b"<a/>");
    }

    #[test]
    fn test_parse_timespan() {
        assert_eq!(
            parse_timespan("00:00:01.5000000"),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            parse_timespan("01:02:03"),
            Some(Duration::from_secs(3723))
        );
        assert_eq!(
            parse_timespan("1.00:00:00"),
            Some(Duration::from_secs(86400))
        );
        assert_eq!(
            parse_timespan("00:00:00.0001234"),
            Some(Duration::from_nanos(123_400))
        );
        assert_eq!(parse_timespan("garbage"), None);
        assert_eq!(parse_timespan("00:0x:00"), None);
    }

    #[test]
    fn test_format_timespan() {
        assert_eq!(format_timespan(Duration::from_millis(1500)), "00:00:01.5000000");
        assert_eq!(format_timespan(Duration::from_secs(3723)), "01:02:03.0000000");
    }

    #[test]
    fn test_parse_and_format_seconds() {
        assert_eq!(parse_seconds("1.25"), Some(Duration::from_millis(1250)));
        assert_eq!(parse_seconds("1,234.5"), Some(Duration::from_millis(1_234_500)));
        assert_eq!(parse_seconds(""), Some(Duration::ZERO));
        assert_eq!(parse_seconds("abc"), None);
        assert_eq!(parse_seconds("-1"), None);
        assert_eq!(format_seconds(Duration::from_millis(1250)), "1.250");
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-03-01T10:15:30.1234567+02:00").unwrap();
        assert_eq!(format_junit_timestamp(&ts), "2024-03-01T08:15:30");
        assert_eq!(format_trx_timestamp(&ts), "2024-03-01T10:15:30.1234567+02:00");

        let naive = parse_timestamp("2024-03-01T10:15:30").unwrap();
        assert_eq!(format_trx_timestamp(&naive), "2024-03-01T10:15:30.0000000+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }
}
