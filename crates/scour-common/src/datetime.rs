//! Lenient datetime parsing shared by connectors, converters, and rules.

use chrono::{NaiveDate, NaiveDateTime};

/// Parse with an explicit chrono format, falling back to a date-only parse
/// at midnight when the format has no time component.
pub fn parse_datetime_with(value: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Try a fixed set of common datetime and date layouts.
pub fn parse_datetime_auto(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_accepts_common_layouts() {
        assert!(parse_datetime_auto("2024-05-01").is_some());
        assert!(parse_datetime_auto("2024-05-01 10:30:00").is_some());
        assert!(parse_datetime_auto("2024/05/01").is_some());
        assert!(parse_datetime_auto("01.05.2024").is_none());
        assert!(parse_datetime_auto("").is_none());
    }

    #[test]
    fn explicit_format_falls_back_to_midnight() {
        let parsed = parse_datetime_with("2024-05-01", "%Y-%m-%d").unwrap();
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "00:00:00");
        assert!(parse_datetime_with("2024-05-01", "%d/%m/%Y").is_none());
    }
}
