// Tolerant timestamp parsing for historical records.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Number, Value};

use crate::model::RecordTime;

/// Integer epochs above this are milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Interpret a record's timestamp field.
///
/// Accepts integer or float epochs (seconds, or milliseconds above 10^11),
/// numeric strings, RFC 3339, and naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]`
/// (taken as UTC). Anything else yields `received_at` flagged approximate.
pub fn parse_record_time(raw: Option<&Value>, received_at: DateTime<Utc>) -> RecordTime {
    let parsed = match raw {
        Some(Value::Number(n)) => from_number(n),
        Some(Value::String(s)) => from_text(s),
        _ => None,
    };
    parsed.map_or_else(|| RecordTime::approximate(received_at), RecordTime::exact)
}

fn from_number(n: &Number) -> Option<DateTime<Utc>> {
    match n.as_i64() {
        Some(i) => from_epoch_int(i),
        None => n.as_f64().and_then(from_epoch_float),
    }
}

fn from_epoch_int(i: i64) -> Option<DateTime<Utc>> {
    if i <= 0 {
        None
    } else if i > MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(i)
    } else {
        DateTime::from_timestamp(i, 0)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions,
    clippy::cast_precision_loss
)]
fn from_epoch_float(f: f64) -> Option<DateTime<Utc>> {
    if !f.is_finite() || f <= 0.0 || f >= i64::MAX as f64 {
        return None;
    }
    if f > MILLIS_THRESHOLD as f64 {
        return DateTime::from_timestamp_millis(f.round() as i64);
    }
    let secs = f.trunc();
    let nanos = (((f - secs) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(secs as i64, nanos)
}

fn from_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return from_epoch_int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return from_epoch_float(f);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn parse(v: &Value) -> RecordTime {
        parse_record_time(Some(v), received())
    }

    fn exact(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> RecordTime {
        RecordTime::exact(Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap())
    }

    #[test]
    fn integer_seconds() {
        assert_eq!(parse(&json!(1_700_000_000)), exact(2023, 11, 14, 22, 13, 20));
    }

    #[test]
    fn integer_millis() {
        assert_eq!(parse(&json!(1_700_000_000_000_i64)), exact(2023, 11, 14, 22, 13, 20));
    }

    #[test]
    fn float_seconds_keep_fraction() {
        let t = parse(&json!(1_700_000_000.5));
        assert!(!t.approximate);
        assert_eq!(t.at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn numeric_string() {
        assert_eq!(parse(&json!("1700000000")), exact(2023, 11, 14, 22, 13, 20));
    }

    #[test]
    fn rfc3339_with_offset() {
        assert_eq!(
            parse(&json!("2024-03-01T20:00:00+08:00")),
            exact(2024, 3, 1, 12, 0, 0)
        );
    }

    #[test]
    fn naive_forms_are_utc() {
        assert_eq!(parse(&json!("2024-03-01T12:00:00")), exact(2024, 3, 1, 12, 0, 0));
        assert_eq!(parse(&json!("2024-03-01 12:00:00")), exact(2024, 3, 1, 12, 0, 0));
        let with_fraction = parse(&json!("2024-03-01 12:00:00.250"));
        assert_eq!(with_fraction.at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn unreadable_values_fall_back_to_receipt_time() {
        for v in [json!("soon"), json!(""), json!(-5), json!(0), json!(true), json!({})] {
            assert_eq!(parse(&v), RecordTime::approximate(received()), "{v}");
        }
        assert_eq!(
            parse_record_time(None, received()),
            RecordTime::approximate(received())
        );
    }
}
