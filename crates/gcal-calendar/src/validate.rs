//! Input validation shared by every presentation adapter
//!
//! Tool arguments arrive as strings; these helpers turn them into
//! checked values or a [`CalendarError::Validation`] before anything
//! reaches the provider.

use crate::error::{CalendarError, Result};

/// Default number of events returned by list/search
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Upper bound accepted for `max_results`
pub const MAX_RESULTS_LIMIT: u32 = 50;

/// Parse a string-typed `max_results` argument
///
/// Blank input falls back to [`DEFAULT_MAX_RESULTS`].
pub fn parse_max_results(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(DEFAULT_MAX_RESULTS);
    }

    let value: i64 = raw.parse().map_err(|_| {
        CalendarError::Validation(format!("max_results must be a whole number, got '{}'", raw))
    })?;

    check_max_results(value)
}

/// Range check for an already numeric `max_results`
pub fn check_max_results(value: i64) -> Result<u32> {
    if !(1..=i64::from(MAX_RESULTS_LIMIT)).contains(&value) {
        return Err(CalendarError::Validation(format!(
            "max_results must be between 1 and {}",
            MAX_RESULTS_LIMIT
        )));
    }
    Ok(value as u32)
}

/// Require a non-blank value, returning it trimmed
pub fn require<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CalendarError::Validation(message.to_string()));
    }
    Ok(trimmed)
}

/// Treat blank optional text as absent
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_max_results_default() {
        assert_eq!(parse_max_results("").unwrap(), 10);
        assert_eq!(parse_max_results("   ").unwrap(), 10);
    }

    #[test]
    fn test_parse_max_results_range() {
        assert_eq!(parse_max_results("1").unwrap(), 1);
        assert_eq!(parse_max_results(" 50 ").unwrap(), 50);

        for bad in ["0", "51", "-3"] {
            let err = parse_max_results(bad).unwrap_err();
            assert_eq!(err.to_string(), "max_results must be between 1 and 50");
        }
    }

    #[test]
    fn test_parse_max_results_not_a_number() {
        let err = parse_max_results("ten").unwrap_err();
        assert!(matches!(err, CalendarError::Validation(_)));
        assert!(err.to_string().contains("'ten'"));
    }

    #[test]
    fn test_require() {
        assert_eq!(require("  abc ", "missing").unwrap(), "abc");
        let err = require(" ", "Event ID is required").unwrap_err();
        assert_eq!(err.to_string(), "Event ID is required");
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(Some(" Tokyo ")), Some("Tokyo".to_string()));
        assert_eq!(optional(Some("  ")), None);
        assert_eq!(optional(None), None);
    }
}
