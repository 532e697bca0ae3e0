use crate::comment::Timestamp;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

pub const MIN_FONT_SIZE: u32 = 25;
pub const MAX_FONT_SIZE: u32 = 36;

/// Content at or below this many chars gets the largest font
const SHORT_TEXT_THRESHOLD: usize = 100;
/// Content at or above this many chars gets the smallest font
const LONG_TEXT_THRESHOLD: usize = 800;

/// Font size for the comment body of the preview image, shrinking linearly
/// as the content gets longer.
pub fn calculate_font_size(len: usize) -> u32 {
    if len <= SHORT_TEXT_THRESHOLD {
        return MAX_FONT_SIZE;
    }
    if len >= LONG_TEXT_THRESHOLD {
        return MIN_FONT_SIZE;
    }

    let ratio = (len - SHORT_TEXT_THRESHOLD) as f64
        / (LONG_TEXT_THRESHOLD - SHORT_TEXT_THRESHOLD) as f64;
    let span = (MAX_FONT_SIZE - MIN_FONT_SIZE) as f64;
    (MAX_FONT_SIZE as f64 - ratio * span).round() as u32
}

/// `Jan 5, 2024` in the local timezone. `None` when the timestamp does not
/// describe a representable date.
pub fn format_date(timestamp: &Timestamp) -> Option<String> {
    format_date_in(timestamp, &Local)
}

pub fn format_date_in<Tz>(timestamp: &Timestamp, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = to_utc(timestamp)?;
    Some(date.with_timezone(tz).format("%b %-d, %Y").to_string())
}

fn to_utc(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
    match timestamp {
        Timestamp::Date(date) => Some(*date),
        Timestamp::Seconds(secs) => {
            let millis = secs * 1000.0;
            if !millis.is_finite() {
                return None;
            }
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        Timestamp::SecondsStr(text) => {
            let millis = parse_int_prefix(text)?.checked_mul(1000)?;
            Utc.timestamp_millis_opt(millis).single()
        }
    }
}

/// Leading integer of `text` the way `parseInt` reads it: surrounding
/// whitespace, an optional sign, then as many digits as there are.
fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_bounds() {
        assert_eq!(calculate_font_size(0), 36);
        assert_eq!(calculate_font_size(100), 36);
        assert_eq!(calculate_font_size(800), 25);
        assert_eq!(calculate_font_size(2000), 25);
    }

    #[test]
    fn test_font_size_interpolates() {
        assert_eq!(calculate_font_size(450), 31);
        assert_eq!(calculate_font_size(101), 36);
        assert_eq!(calculate_font_size(799), 25);

        let mut last = MAX_FONT_SIZE;
        for len in 100..=800 {
            let size = calculate_font_size(len);
            assert!(size <= last, "font grew at {len}");
            last = size;
        }
    }

    #[test]
    fn test_format_date_utc() {
        // 2024-01-05 12:00:00 UTC
        let ts = Timestamp::Seconds(1704456000.0);
        assert_eq!(format_date_in(&ts, &Utc).as_deref(), Some("Jan 5, 2024"));

        let date = Timestamp::Date(Utc.with_ymd_and_hms(2023, 11, 21, 8, 30, 0).unwrap());
        assert_eq!(format_date_in(&date, &Utc).as_deref(), Some("Nov 21, 2023"));
    }

    #[test]
    fn test_numeric_and_string_agree() {
        let number = Timestamp::Seconds(1704456000.0);
        let text = Timestamp::SecondsStr("1704456000".to_string());
        assert_eq!(format_date(&number), format_date(&text));
        assert!(format_date(&number).is_some());
    }

    #[test]
    fn test_string_parsed_like_parse_int() {
        let ts = Timestamp::SecondsStr("  1704456000.75s".to_string());
        assert_eq!(format_date_in(&ts, &Utc).as_deref(), Some("Jan 5, 2024"));

        assert_eq!(format_date(&Timestamp::SecondsStr("yesterday".to_string())), None);
        assert_eq!(format_date(&Timestamp::SecondsStr("".to_string())), None);
        assert_eq!(format_date(&Timestamp::Seconds(f64::NAN)), None);
    }
}
