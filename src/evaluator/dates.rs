//! Date built-ins.
//!
//! Dates are handled in UTC. A date argument is either an ISO-8601 string or
//! a number of milliseconds since the epoch; omitted arguments default to the
//! configured clock's current time.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;

use super::{EvalError, Evaluator};
use crate::{ast::Builtin, value::Value};

const MILLIS_PER_DAY: i64 = 86_400_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 date or date-time. Offsets are converted to UTC and
/// times without an offset are taken as UTC.
pub fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn date_argument(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_iso(s),
        Value::Numeric(n) => n.trunc().to_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Length of the month `offset` months after `year`/`month`.
fn days_in_month(year: i32, month: u32, offset: i64) -> Option<i64> {
    let total = (i64::from(year) * 12 + i64::from(month) - 1).checked_add(offset)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days())
}

impl Evaluator<'_> {
    pub(super) fn call_date(&self, function: Builtin, values: &[Value]) -> Result<Value, EvalError> {
        let now_millis = self.config.now_millis();
        let now = DateTime::from_timestamp_millis(now_millis).ok_or_else(|| {
            EvalError::Internal(format!("clock time {} is out of range", now_millis))
        })?;
        let date = || match values.first() {
            None => Some(now),
            Some(value) => date_argument(value),
        };
        let elapsed = |unit: i64| {
            date_argument(&values[0])
                .map(|d| Value::from((now_millis - d.timestamp_millis()) / unit))
                .unwrap_or(Value::Null)
        };

        let result = match function {
            Builtin::Day => date().map(|d| Value::from(i64::from(d.day()))),
            Builtin::Month => date().map(|d| Value::from(i64::from(d.month()))),
            Builtin::Year => date().map(|d| Value::from(i64::from(d.year()))),
            Builtin::DayOfYear => date().map(|d| Value::from(i64::from(d.ordinal()))),
            Builtin::DaysInMonth => {
                let days = match values.first() {
                    None => days_in_month(now.year(), now.month(), 0),
                    Some(Value::Numeric(offset)) => offset
                        .trunc()
                        .to_i64()
                        .and_then(|offset| days_in_month(now.year(), now.month(), offset)),
                    Some(other) => {
                        date_argument(other).and_then(|d| days_in_month(d.year(), d.month(), 0))
                    }
                };
                days.map(Value::from)
            }
            Builtin::Now => Some(Value::from(now_millis)),
            Builtin::Iso => match &values[0] {
                Value::String(s) => parse_iso(s).map(|d| Value::from(d.timestamp_millis())),
                Value::Numeric(n) => Some(Value::Numeric(*n)),
                _ => None,
            },
            Builtin::DaysBeforeNow => Some(elapsed(MILLIS_PER_DAY)),
            Builtin::HoursBeforeNow => Some(elapsed(MILLIS_PER_HOUR)),
            other => {
                return Err(EvalError::Internal(format!("{}() is not a date function", other)));
            }
        };
        Ok(result.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Scope, Variables, config::FixedClock, parser::parse_program};

    fn eval_at(now: &str, source: &str) -> Value {
        let clock = FixedClock::from_iso(now).unwrap();
        let config = Config::default().with_clock(clock);
        let program = parse_program(source, &config).unwrap();
        Evaluator::new(&config)
            .execute(&program, &mut Variables::new(), &Scope::new())
            .unwrap()
    }

    #[test]
    fn test_parse_iso_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
            .and_utc();
        assert_eq!(parse_iso("2024-03-05T10:30:00Z"), Some(expected));
        assert_eq!(parse_iso("2024-03-05T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_iso("2024-03-05 10:30:00"), Some(expected));
        assert_eq!(parse_iso("2024-03-05T10:30"), Some(expected));
        assert!(parse_iso("2024-03-05").is_some());
        assert_eq!(parse_iso("March 5th"), None);
    }

    #[test]
    fn test_date_parts_default_to_now() {
        let now = "2024-02-10T08:00:00Z";
        assert_eq!(eval_at(now, "day()"), Value::from(10));
        assert_eq!(eval_at(now, "month()"), Value::from(2));
        assert_eq!(eval_at(now, "year()"), Value::from(2024));
        assert_eq!(eval_at(now, "day_of_year(\"2024-12-31\")"), Value::from(366));
        assert_eq!(eval_at(now, "day(\"not a date\")"), Value::Null);
    }

    #[test]
    fn test_days_in_month() {
        let now = "2024-02-10T08:00:00Z";
        assert_eq!(eval_at(now, "days_in_month()"), Value::from(29));
        assert_eq!(eval_at(now, "days_in_month(1)"), Value::from(31));
        assert_eq!(eval_at(now, "days_in_month(-2)"), Value::from(31));
        assert_eq!(eval_at(now, "days_in_month(\"2023-02-01\")"), Value::from(28));
    }

    #[test]
    fn test_days_in_month_out_of_range_offset_is_null() {
        let now = "2024-02-10T08:00:00Z";
        assert_eq!(eval_at(now, "days_in_month(9223372036854775807)"), Value::Null);
        assert_eq!(eval_at(now, "days_in_month(-9223372036854775807)"), Value::Null);
        assert_eq!(eval_at(now, "days_in_month(99999999999999999999)"), Value::Null);
        assert_eq!(eval_at(now, "days_in_month(3600000)"), Value::Null);
    }

    #[test]
    fn test_elapsed_time() {
        let now = "2024-02-10T08:00:00Z";
        assert_eq!(eval_at(now, "days_before_now(\"2024-02-01\")"), Value::from(9));
        assert_eq!(eval_at(now, "hours_before_now(\"2024-02-10T05:30:00Z\")"), Value::from(2));
        assert_eq!(eval_at(now, "days_before_now(iso(\"2024-02-11\"))"), Value::from(0));
        assert_eq!(eval_at(now, "now()"), eval_at(now, "iso(\"2024-02-10T08:00:00Z\")"));
    }
}
