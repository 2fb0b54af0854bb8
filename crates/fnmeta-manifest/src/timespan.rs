//! Interval text used by retry annotations and emitted retry policies
//!
//! Accepted forms are `[-]d` (whole days) and `[-][d.]hh:mm[:ss[.fffffff]]`, plus
//! `[-]d:hh:mm:ss[.fffffff]`. Values are counted in 100ns ticks so that fractional seconds
//! up to seven digits survive a parse/format cycle.

use smallvec::SmallVec;
use std::time::Duration;

pub const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_MINUTE: i64 = TICKS_PER_SECOND * 60;
const TICKS_PER_HOUR: i64 = TICKS_PER_MINUTE * 60;
const TICKS_PER_DAY: i64 = TICKS_PER_HOUR * 24;
const FRACTION_DIGITS: usize = 7;

/// Parse interval text into signed ticks, `None` when the text is not an interval
pub fn parse_ticks(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let ticks = if body.contains(':') {
        parse_clock(body)?
    } else {
        parse_number(body)?.checked_mul(TICKS_PER_DAY)?
    };

    Some(if negative { -ticks } else { ticks })
}

/// Parse a non-negative interval
pub fn parse_interval(text: &str) -> Option<Duration> {
    let ticks = parse_ticks(text)?;
    if ticks < 0 {
        return None;
    }
    Some(ticks_to_duration(ticks))
}

pub fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::from_nanos(ticks.unsigned_abs().saturating_mul(100))
}

/// Render as `[d.]hh:mm:ss[.fffffff]`
pub fn format_interval(value: Duration) -> String {
    let ticks = (value.as_nanos() / 100).min(i64::MAX as u128) as i64;
    let days = ticks / TICKS_PER_DAY;
    let hours = (ticks % TICKS_PER_DAY) / TICKS_PER_HOUR;
    let minutes = (ticks % TICKS_PER_HOUR) / TICKS_PER_MINUTE;
    let seconds = (ticks % TICKS_PER_MINUTE) / TICKS_PER_SECOND;
    let fraction = ticks % TICKS_PER_SECOND;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{}.", days));
    }
    out.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if fraction > 0 {
        out.push_str(&format!(".{:07}", fraction));
    }
    out
}

fn parse_clock(body: &str) -> Option<i64> {
    let parts: SmallVec<[&str; 4]> = body.split(':').collect();
    let (days, hours, minutes, seconds) = match parts.as_slice() {
        [head, minutes] => {
            let (days, hours) = split_days(head)?;
            (days, hours, *minutes, None)
        }
        [head, minutes, seconds] => {
            let (days, hours) = split_days(head)?;
            (days, hours, *minutes, Some(*seconds))
        }
        [days, hours, minutes, seconds] => (parse_number(days)?, *hours, *minutes, Some(*seconds)),
        _ => return None,
    };

    let hours = parse_bounded(hours, 23)?;
    let minutes = parse_bounded(minutes, 59)?;
    let (seconds, fraction) = match seconds {
        Some(text) => {
            let (whole, fraction) = match text.split_once('.') {
                Some((whole, fraction)) => (whole, Some(fraction)),
                None => (text, None),
            };
            (parse_bounded(whole, 59)?, parse_fraction(fraction)?)
        }
        None => (0, 0),
    };

    days.checked_mul(TICKS_PER_DAY)?.checked_add(
        hours * TICKS_PER_HOUR + minutes * TICKS_PER_MINUTE + seconds * TICKS_PER_SECOND + fraction,
    )
}

fn split_days(head: &str) -> Option<(i64, &str)> {
    match head.split_once('.') {
        Some((days, hours)) => Some((parse_number(days)?, hours)),
        None => Some((0, head)),
    }
}

fn parse_number(part: &str) -> Option<i64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_bounded(part: &str, max: i64) -> Option<i64> {
    let value = parse_number(part)?;
    (value <= max).then_some(value)
}

fn parse_fraction(fraction: Option<&str>) -> Option<i64> {
    match fraction {
        None => Some(0),
        Some(digits) if (1..=FRACTION_DIGITS).contains(&digits.len()) => {
            let value = parse_number(digits)?;
            Some(value * 10_i64.pow((FRACTION_DIGITS - digits.len()) as u32))
        }
        Some(_) => None,
    }
}

/// Serde adapter storing a `Duration` as interval text
pub mod serde_interval {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_interval(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_interval(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid interval '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_forms() {
        assert_eq!(parse_interval("00:00:10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_interval("00:20:00"), Some(Duration::from_secs(1200)));
        assert_eq!(parse_interval("01:30"), Some(Duration::from_secs(5400)));
        assert_eq!(
            parse_interval("1.00:00:00"),
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(
            parse_interval("2:01:00:00"),
            Some(Duration::from_secs(2 * 86_400 + 3600))
        );
        assert_eq!(
            parse_interval("00:00:00.5"),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_bare_number_is_days() {
        assert_eq!(parse_interval("1"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_ticks("-3"), Some(-3 * TICKS_PER_DAY));
    }

    #[test]
    fn test_negative_is_not_an_interval() {
        assert_eq!(parse_ticks("-00:00:10"), Some(-10 * TICKS_PER_SECOND));
        assert_eq!(parse_interval("-00:00:10"), None);
    }

    #[test]
    fn test_rejects_malformed_text() {
        for text in [
            "invalidInterval",
            "",
            "-",
            "24:00:00",
            "00:60:00",
            "00:00:60",
            "00:00:01.12345678",
            "1:2:3:4:5",
            "00:+1:00",
        ] {
            assert_eq!(parse_ticks(text), None, "{text} should not parse");
        }
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(10)), "00:00:10");
        assert_eq!(format_interval(Duration::from_secs(86_400)), "1.00:00:00");
        assert_eq!(
            format_interval(Duration::from_millis(1500)),
            "00:00:01.5000000"
        );
    }
}
