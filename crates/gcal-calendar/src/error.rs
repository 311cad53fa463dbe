//! Error types for gcal-calendar

use thiserror::Error;

/// gcal-calendar error type
#[derive(Error, Debug)]
pub enum CalendarError {
    /// Missing or out-of-range input, detected before any provider call
    #[error("{0}")]
    Validation(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    /// Provider refused a write because the calendar changed underneath us
    #[error("Calendar conflict: {0}")]
    Conflict(String),

    #[error("Google Calendar API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Availability check failed: {0}")]
    AvailabilityCheck(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalendarError {
    /// Whether the error originated at the calendar provider
    /// (as opposed to local validation or the network)
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Conflict(_) | Self::Api { .. } | Self::Authentication(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CalendarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_classification() {
        assert!(CalendarError::NotFound("x".into()).is_provider());
        assert!(CalendarError::Api { status: 403, message: "quota".into() }.is_provider());
        assert!(!CalendarError::Validation("x".into()).is_provider());
        assert!(!CalendarError::AvailabilityCheck("x".into()).is_provider());
    }

    #[test]
    fn test_api_display() {
        let err = CalendarError::Api { status: 400, message: "Bad Request".into() };
        assert_eq!(err.to_string(), "Google Calendar API error (HTTP 400): Bad Request");
    }
}
