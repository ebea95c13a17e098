//! Timecode parsing and formatting for in/out points.
//!
//! ffmpeg receives `hh:mm:ss.fff`; the terminal shows `hh:mm:ss`.

use crate::errors::{CutterError, Result};
use std::time::Duration;

/// Placeholder shown for an unset in/out point.
pub const UNSET_DISPLAY: &str = "--:--:--";

/// `hh:mm:ss.fff`, as passed to `-ss` / `-t`.
pub fn format_timecode(d: Duration) -> String {
    let total_ms = d.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// `hh:mm:ss`, truncating sub-second precision.
pub fn format_display(d: Duration) -> String {
    let secs = d.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )
}

/// Renders an optional point, falling back to [`UNSET_DISPLAY`].
pub fn format_point(label: &str, point: Option<Duration>) -> String {
    match point {
        Some(d) => format!("{}: {}", label, format_display(d)),
        None => format!("{}: {}", label, UNSET_DISPLAY),
    }
}

/// Parses `hh:mm:ss[.fff]`, `mm:ss[.fff]` or plain seconds `ss[.fff]`.
pub fn parse_timecode(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CutterError::invalid_timecode(input, "empty timecode"));
    }
    if trimmed.starts_with('-') {
        return Err(CutterError::invalid_timecode(input, "negative timecode"));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds_part) = match parts.as_slice() {
        [s] => (0u64, 0u64, *s),
        [m, s] => (0, parse_field(input, m, "minutes")?, *s),
        [h, m, s] => (
            parse_field(input, h, "hours")?,
            parse_field(input, m, "minutes")?,
            *s,
        ),
        _ => {
            return Err(CutterError::invalid_timecode(
                input,
                "expected hh:mm:ss[.fff], mm:ss[.fff] or seconds",
            ))
        }
    };

    let seconds: f64 = seconds_part
        .parse()
        .map_err(|_| CutterError::invalid_timecode(input, "seconds are not a number"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CutterError::invalid_timecode(input, "seconds out of range"));
    }

    if parts.len() > 1 {
        if minutes >= 60 {
            return Err(CutterError::invalid_timecode(input, "minutes must be below 60"));
        }
        if seconds >= 60.0 {
            return Err(CutterError::invalid_timecode(input, "seconds must be below 60"));
        }
    }

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60))
        .map(Duration::from_secs)
        .ok_or_else(|| CutterError::invalid_timecode(input, "hours out of range"))?;

    // Round to milliseconds, the resolution used on the command line.
    let millis = (seconds * 1000.0).round();
    if millis >= u64::MAX as f64 {
        return Err(CutterError::invalid_timecode(input, "seconds out of range"));
    }
    whole
        .checked_add(Duration::from_millis(millis as u64))
        .ok_or_else(|| CutterError::invalid_timecode(input, "timecode out of range"))
}

fn parse_field(input: &str, field: &str, name: &str) -> Result<u64> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(CutterError::invalid_timecode(
            input,
            format!("{} are not a whole number", name),
        ));
    }
    field
        .parse()
        .map_err(|_| CutterError::invalid_timecode(input, format!("{} out of range", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timecode() {
        let cases: &[(u64, &str)] = &[
            (0, "00:00:00.000"),
            (1_500, "00:00:01.500"),
            (61_001, "00:01:01.001"),
            (3_723_456, "01:02:03.456"),
            (360_000_000, "100:00:00.000"),
        ];
        for (ms, expected) in cases {
            assert_eq!(format_timecode(Duration::from_millis(*ms)), *expected);
        }
    }

    #[test]
    fn test_format_display_truncates_millis() {
        assert_eq!(format_display(Duration::from_millis(3_723_999)), "01:02:03");
    }

    #[test]
    fn test_format_point() {
        assert_eq!(format_point("In", None), "In: --:--:--");
        assert_eq!(
            format_point("Out", Some(Duration::from_secs(75))),
            "Out: 00:01:15"
        );
    }

    #[test]
    fn test_parse_timecode_forms() {
        assert_eq!(
            parse_timecode("01:02:03.456").unwrap(),
            Duration::from_millis(3_723_456)
        );
        assert_eq!(parse_timecode("02:03").unwrap(), Duration::from_secs(123));
        assert_eq!(parse_timecode("12.5").unwrap(), Duration::from_millis(12_500));
        assert_eq!(parse_timecode("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_timecode(" 00:00:01 ").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_timecode_rejects_garbage() {
        for bad in [
            "", "-5", "abc", "1:2:3:4", "00:61:00", "00:00:60", "75:00", "a:00", "1:-2",
        ] {
            assert!(parse_timecode(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_parse_timecode_rejects_out_of_range() {
        for bad in ["9999999999999999:00:00", "18446744073709551615:00:00", "1e30"] {
            let err = parse_timecode(bad).unwrap_err();
            assert!(
                err.to_string().contains("out of range"),
                "{:?} gave {}",
                bad,
                err
            );
        }
    }
}
