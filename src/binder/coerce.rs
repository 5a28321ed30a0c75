//! Conversion of raw request values into [`BoundValue`]s.
//!
//! Text values (path, query, header, cookie, and JSON strings) follow strict parsing:
//! surrounding whitespace is never trimmed for non-string types, numbers must be finite,
//! and enumeration members are matched case-sensitively.

use super::value::BoundValue;
use crate::spec::ValueType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Coerce a text value into a scalar of `value_type`.
///
/// Returns `None` when the text is not a valid value of the type. Arrays and objects are
/// never produced from a single text value.
#[must_use]
pub fn coerce_text(value_type: &ValueType, raw: &str) -> Option<BoundValue> {
    let text_like = matches!(value_type, ValueType::String | ValueType::Enum(_));
    if !text_like && raw.trim() != raw {
        return None;
    }

    match value_type {
        ValueType::String => Some(BoundValue::Str(raw.to_owned())),
        ValueType::Integer => raw.parse::<i64>().ok().map(BoundValue::Int),
        ValueType::Number => parse_number(raw).map(BoundValue::Float),
        ValueType::Boolean => parse_boolean(raw).map(BoundValue::Bool),
        ValueType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(BoundValue::Date),
        ValueType::DateTime => parse_datetime(raw).map(BoundValue::DateTime),
        ValueType::Time => parse_time(raw).map(BoundValue::Time),
        ValueType::Duration => parse_duration(raw).map(BoundValue::Duration),
        ValueType::Uuid => Uuid::parse_str(raw).ok().map(BoundValue::Uuid),
        ValueType::Url => parse_http_url(raw).map(BoundValue::Url),
        ValueType::Enum(members) => members
            .iter()
            .any(|m| m == raw)
            .then(|| BoundValue::Str(raw.to_owned())),
        ValueType::Array(_) | ValueType::Object(_) => None,
    }
}

/// Coerce a JSON scalar into a scalar of `value_type`.
///
/// JSON strings go through [`coerce_text`], so `"16.25"` binds as a number.
#[must_use]
pub fn coerce_json_scalar(value_type: &ValueType, value: &Value) -> Option<BoundValue> {
    match (value_type, value) {
        (_, Value::String(s)) => coerce_text(value_type, s),
        (ValueType::Integer, Value::Number(n)) => {
            n.as_i64().or_else(|| n.as_f64().and_then(integral)).map(BoundValue::Int)
        }
        (ValueType::Number, Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(BoundValue::Float),
        (ValueType::Boolean, Value::Bool(b)) => Some(BoundValue::Bool(*b)),
        (ValueType::Boolean, Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(BoundValue::Bool(false)),
            Some(1) => Some(BoundValue::Bool(true)),
            _ => None,
        },
        (ValueType::Duration, Value::Number(n)) => n
            .as_f64()
            .and_then(seconds_to_delta)
            .map(BoundValue::Duration),
        _ => None,
    }
}

/// `5.0` → `5`; fractional, non-finite and out-of-range values are rejected.
#[allow(clippy::cast_possible_truncation)]
fn integral(value: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.is_finite() && value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value))
        .then(|| value as i64)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().into())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn parse_http_url(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().filter(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}

/// Seconds (possibly fractional) or an ISO 8601 duration such as `P1DT2H30M`.
fn parse_duration(raw: &str) -> Option<TimeDelta> {
    if let Some(seconds) = parse_number(raw) {
        return seconds_to_delta(seconds);
    }
    parse_iso8601_duration(raw)
}

fn seconds_to_delta(seconds: f64) -> Option<TimeDelta> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

fn parse_iso8601_duration(raw: &str) -> Option<TimeDelta> {
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    let mut seconds = 0.0;
    let mut seen_unit = false;
    for (unit, amount) in designators(date_part)? {
        let scale = match unit {
            'W' => 604_800.0,
            'D' => 86_400.0,
            _ => return None,
        };
        seconds += amount * scale;
        seen_unit = true;
    }
    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return None;
        }
        for (unit, amount) in designators(time_part)? {
            let scale = match unit {
                'H' => 3_600.0,
                'M' => 60.0,
                'S' => 1.0,
                _ => return None,
            };
            seconds += amount * scale;
            seen_unit = true;
        }
    }
    if !seen_unit {
        return None;
    }
    seconds_to_delta(if negative { -seconds } else { seconds })
}

/// Split `3DT` style runs into `(unit, amount)` pairs.
fn designators(part: &str) -> Option<Vec<(char, f64)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, ch) in part.char_indices() {
        if ch.is_ascii_alphabetic() {
            let number = &part[start..idx];
            if number.is_empty() || number.starts_with(['+', '-']) {
                return None;
            }
            out.push((ch, number.parse::<f64>().ok()?));
            start = idx + ch.len_utf8();
        }
    }
    if start != part.len() {
        return None;
    }
    Some(out)
}
