//! Date and timestamp parsing for registry values.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Configuration for date format handling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DateFormatConfig {
    /// List of date format strings to try when parsing dates
    pub date_formats: Vec<String>,
    /// Enable heuristic format detection
    pub enable_format_detection: bool,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO format: 2023-01-15
                "%m/%d/%Y".to_string(), // US: 01/15/2023
                "%Y/%m/%d".to_string(), // 2023/01/15
                "%Y%m%d".to_string(),   // Compact: 20230115
            ],
            enable_format_detection: true,
        }
    }
}

/// Parse a date string with multiple format attempts
#[must_use]
pub fn parse_date_string(s: &str, config: &DateFormatConfig) -> Option<NaiveDate> {
    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    // Exports sometimes carry a time part on date fields
    if config.enable_format_detection {
        // Values arrive lower-cased, which turns the ISO separator into 't'
        let s = s.to_ascii_uppercase();
        if let Some(detected_format) = detect_date_format(&s) {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(&s, detected_format) {
                return Some(datetime.date());
            }
        }
    }

    None
}

/// Try to detect a date-with-time format based on string patterns
#[must_use]
pub fn detect_date_format(s: &str) -> Option<&'static str> {
    let bytes = s.as_bytes();
    if bytes.len() < 16 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    match (bytes[10], s.len()) {
        (b' ', 16) => Some("%Y-%m-%d %H:%M"),
        (b' ', 19) => Some("%Y-%m-%d %H:%M:%S"),
        (b'T', 19) => Some("%Y-%m-%dT%H:%M:%S"),
        _ => None,
    }
}

/// Parse an optional date; empty values are `Ok(None)`
pub fn parse_optional_date(
    value: &str,
    config: &DateFormatConfig,
) -> std::result::Result<Option<NaiveDate>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_date_string(value, config)
        .map(Some)
        .ok_or_else(|| format!("unrecognised date '{value}'"))
}

/// Parse an optional timestamp; empty values are `Ok(None)`
pub fn parse_optional_timestamp(
    value: &str,
    format: &str,
) -> std::result::Result<Option<NaiveDateTime>, chrono::ParseError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, format).map(Some)
}
