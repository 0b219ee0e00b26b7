//! Duration literal parsing.
//!
//! Two notations are accepted, both with an optional leading `-`:
//!
//! - ISO-8601: `P[nY][nM][nW][nD][T[nH][nM][n[.f]S]]`, where a year counts as
//!   365 days and a month as 30 days.
//! - Clock: `[D.]HH:MM:SS[.f]`, the form the ArmoniK API prints.

use chrono::TimeDelta;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_DAY: i128 = 86_400 * NANOS_PER_SECOND;

const DATE_UNITS: [(char, i128); 4] = [
    ('Y', 365 * NANOS_PER_DAY),
    ('M', 30 * NANOS_PER_DAY),
    ('W', 7 * NANOS_PER_DAY),
    ('D', NANOS_PER_DAY),
];

const TIME_UNITS: [(char, i128); 3] = [
    ('H', 3_600 * NANOS_PER_SECOND),
    ('M', 60 * NANOS_PER_SECOND),
    ('S', NANOS_PER_SECOND),
];

/// Parse a duration literal; the error is a human-readable reason.
pub(crate) fn parse_duration(raw: &str) -> Result<TimeDelta, String> {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, raw),
    };
    let nanos = if let Some(iso) = body.strip_prefix(['P', 'p']) {
        parse_iso(iso)?
    } else if body.contains(':') {
        parse_clock(body)?
    } else {
        return Err("expected an ISO-8601 duration such as P1DT2H30M or [D.]HH:MM:SS".into());
    };

    let seconds = i64::try_from(nanos / NANOS_PER_SECOND).map_err(|_| out_of_range())?;
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    let delta = TimeDelta::new(seconds, subsec).ok_or_else(out_of_range)?;
    Ok(if negative { -delta } else { delta })
}

fn out_of_range() -> String {
    "duration out of range".to_string()
}

fn parse_iso(body: &str) -> Result<i128, String> {
    let (date, time) = match body.find(['T', 't']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    if time == Some("") {
        return Err("'T' must be followed by hours, minutes or seconds".into());
    }
    if date.is_empty() && time.is_none() {
        return Err("duration has no components".into());
    }
    let days = components(date, &DATE_UNITS)?;
    let clock = match time {
        Some(time) => components(time, &TIME_UNITS)?,
        None => 0,
    };
    days.checked_add(clock).ok_or_else(out_of_range)
}

/// Sum `<number><unit>` pairs; units must appear in table order, at most once.
fn components(mut rest: &str, units: &[(char, i128)]) -> Result<i128, String> {
    let mut total: i128 = 0;
    let mut next = 0;
    while !rest.is_empty() {
        let len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(len);
        let Some(unit) = tail.chars().next() else {
            return Err(format!("missing unit after '{}'", number));
        };
        let upper = unit.to_ascii_uppercase();
        let index = units[next..]
            .iter()
            .position(|(u, _)| *u == upper)
            .map(|i| i + next)
            .ok_or_else(|| format!("unexpected '{}'", unit))?;
        let scale = units[index].1;

        let value = match number.split_once('.') {
            Some((whole, fraction)) if upper == 'S' && index == units.len() - 1 => {
                scaled(integer(whole)?, scale)? + fraction_nanos(fraction)?
            }
            Some(_) => {
                return Err(format!("only seconds may have a fraction, got '{}{}'", number, unit))
            }
            None => scaled(integer(number)?, scale)?,
        };
        total = total.checked_add(value).ok_or_else(out_of_range)?;
        next = index + 1;
        rest = &tail[unit.len_utf8()..];
    }
    Ok(total)
}

fn parse_clock(body: &str) -> Result<i128, String> {
    let colon = body.find(':').unwrap_or(body.len());
    let (days, clock) = match body[..colon].split_once('.') {
        Some((days, _)) => (integer(days)?, &body[days.len() + 1..]),
        None => (0, body),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err("expected HH:MM:SS".into());
    };
    let hours = bounded(hours, 23, "hours")?;
    let minutes = bounded(minutes, 59, "minutes")?;
    let (seconds, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (bounded(whole, 59, "seconds")?, fraction_nanos(fraction)?),
        None => (bounded(seconds, 59, "seconds")?, 0),
    };
    let clock = (hours * 3_600 + minutes * 60 + seconds) * NANOS_PER_SECOND + fraction;
    scaled(days, NANOS_PER_DAY)?
        .checked_add(clock)
        .ok_or_else(out_of_range)
}

fn scaled(value: i128, scale: i128) -> Result<i128, String> {
    value.checked_mul(scale).ok_or_else(out_of_range)
}

fn integer(digits: &str) -> Result<i128, String> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a number", digits));
    }
    digits.parse::<i128>().map_err(|_| out_of_range())
}

fn bounded(digits: &str, max: i128, unit: &str) -> Result<i128, String> {
    let value = integer(digits)?;
    if value > max {
        return Err(format!("{} must be at most {}", unit, max));
    }
    Ok(value)
}

/// Nanoseconds in a decimal fraction of a second (`5` is half a second).
fn fraction_nanos(digits: &str) -> Result<i128, String> {
    if digits.is_empty() || digits.len() > 9 {
        return Err("fraction of a second must have 1 to 9 digits".into());
    }
    Ok(integer(digits)? * 10_i128.pow(9 - digits.len() as u32))
}
