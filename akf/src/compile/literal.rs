//! Coercion of literal text into typed values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use super::duration::parse_duration;
use crate::schema::{FType, Schema, StatusValue};
use crate::{Error, Result};

pub(crate) fn boolean(raw: &str) -> Result<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::invalid_literal(FType::Boolean, raw, "expected true or false"))
    }
}

pub(crate) fn number(raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|e| {
        let reason = match e.kind() {
            std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                "out of range for a 64-bit integer".to_string()
            }
            _ => e.to_string(),
        };
        Error::invalid_literal(FType::Number, raw, reason)
    })
}

/// RFC 3339 with an offset, or a naive datetime/date taken as UTC.
pub(crate) fn date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| {
            Error::invalid_literal(
                FType::Date,
                raw,
                "expected an ISO-8601 datetime such as 2024-12-28T14:00:00Z",
            )
        })
}

pub(crate) fn duration(raw: &str) -> Result<TimeDelta> {
    parse_duration(raw).map_err(|reason| Error::invalid_literal(FType::Duration, raw, reason))
}

pub(crate) fn status(schema: &Schema, raw: &str) -> Result<StatusValue> {
    schema.status(raw).ok_or_else(|| {
        let known: Vec<String> = schema
            .statuses()
            .unwrap_or_default()
            .iter()
            .map(StatusValue::to_string)
            .collect();
        Error::invalid_literal(
            FType::Status,
            raw,
            format!("expected one of: {}", known.join(", ")),
        )
    })
}
