//! エラー型定義 (gcal-api)

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gcal_calendar::CalendarError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// gcal-api のエラー型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthFailed,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, ApiError>;

/// JSON body of every error response
///
/// `kind` and `detail` let [`crate::ApiClient`] rebuild the
/// [`CalendarError`] the server saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Upstream HTTP status for provider errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorBody {
    fn new(error: String, kind: &str, detail: Option<String>, status: Option<u16>) -> Self {
        Self {
            error,
            kind: kind.to_string(),
            detail,
            status,
        }
    }

    /// Inverse of the server-side mapping; unknown kinds become
    /// [`CalendarError::Api`] with the response status
    pub fn into_calendar_error(self, http_status: StatusCode) -> CalendarError {
        let detail = self.detail.unwrap_or_else(|| self.error.clone());
        match self.kind.as_str() {
            "validation" | "bad_request" => CalendarError::Validation(detail),
            "not_found" => CalendarError::NotFound(detail),
            "conflict" => CalendarError::Conflict(detail),
            "authentication" => CalendarError::Authentication(detail),
            "availability_check" => CalendarError::AvailabilityCheck(detail),
            "provider" => CalendarError::Api {
                status: self.status.unwrap_or(http_status.as_u16()),
                message: detail,
            },
            "unauthorized" => CalendarError::Authentication(format!(
                "API server rejected the request: {}",
                self.error
            )),
            _ => CalendarError::Api {
                status: http_status.as_u16(),
                message: self.error,
            },
        }
    }
}

fn classify(e: &CalendarError) -> (StatusCode, ErrorBody) {
    let error = e.to_string();
    match e {
        CalendarError::Validation(m) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new(error, "validation", Some(m.clone()), None),
        ),
        CalendarError::NotFound(m) => (
            StatusCode::NOT_FOUND,
            ErrorBody::new(error, "not_found", Some(m.clone()), None),
        ),
        CalendarError::Conflict(m) => (
            StatusCode::CONFLICT,
            ErrorBody::new(error, "conflict", Some(m.clone()), None),
        ),
        CalendarError::Api { status, message } => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::new(error, "provider", Some(message.clone()), Some(*status)),
        ),
        CalendarError::Authentication(m) => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::new(error, "authentication", Some(m.clone()), None),
        ),
        CalendarError::AvailabilityCheck(m) => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::new(error, "availability_check", Some(m.clone()), None),
        ),
        CalendarError::Http(_) | CalendarError::Json(_) => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::new(error, "transport", None, None),
        ),
        CalendarError::Credentials(_) | CalendarError::Configuration(_) | CalendarError::Io(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new(error, "internal", None, None),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::AuthFailed => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new(self.to_string(), "unauthorized", None, None),
            ),
            ApiError::InvalidRequest(m) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(self.to_string(), "bad_request", Some(m.clone()), None),
            ),
            ApiError::Calendar(e) => classify(e),
        };

        if status.is_server_error() {
            error!("Request failed: {}", body.error);
        } else {
            warn!("Request rejected ({}): {}", status, body.error);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_error_survives_round_trip() {
        let cases = vec![
            CalendarError::Validation("Search query is required".into()),
            CalendarError::NotFound("nope".into()),
            CalendarError::Conflict("duplicate".into()),
            CalendarError::Api { status: 403, message: "Rate Limit Exceeded".into() },
            CalendarError::AvailabilityCheck("global/notFound".into()),
        ];

        for original in cases {
            let expected = original.to_string();
            let (status, body) = classify(&original);
            let rebuilt = body.into_calendar_error(status);
            assert_eq!(rebuilt.to_string(), expected);
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(classify(&CalendarError::Validation("x".into())).0, StatusCode::BAD_REQUEST);
        assert_eq!(classify(&CalendarError::NotFound("x".into())).0, StatusCode::NOT_FOUND);
        assert_eq!(classify(&CalendarError::Conflict("x".into())).0, StatusCode::CONFLICT);
        assert_eq!(
            classify(&CalendarError::Api { status: 500, message: "x".into() }).0,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            classify(&CalendarError::Credentials("x".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unknown_kind_falls_back_to_status() {
        let body = ErrorBody::new("boom".into(), "internal", None, None);
        let err = body.into_calendar_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, CalendarError::Api { status: 500, ref message } if message == "boom"));
    }
}
