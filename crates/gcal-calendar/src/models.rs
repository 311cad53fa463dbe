//! Data models for calendar integration
//!
//! Field names follow the Google Calendar v3 JSON representation so
//! the same types serve the provider client, the HTTP API and the
//! bridge without translation.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validate::{optional, require};

/// Start or end of an event: a timestamp, or a date for all-day events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// `YYYY-MM-DD` for all-day events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// A timed value annotated with a timezone
    pub fn timed(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            date: None,
            time_zone: Some(time_zone.into()),
        }
    }

    /// The timestamp, falling back to the all-day date
    pub fn value(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }

    pub fn is_all_day(&self) -> bool {
        self.date_time.is_none() && self.date.is_some()
    }
}

/// Calendar event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Provider-assigned identifier (empty until created)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    /// Shareable web link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

impl Event {
    /// Title for display
    pub fn title(&self) -> &str {
        self.title_or("(No title)")
    }

    /// Title, or `fallback` when the event has none
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// A busy interval reported by a free/busy query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

impl TimePeriod {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Window submitted to an availability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    /// Both ends are required; ordering and format are left to the provider
    pub fn new(start: &str, end: &str) -> Result<Self> {
        let message = "Both start_time and end_time are required";
        let start = require(start, message)?;
        let end = require(end, message)?;
        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

/// Validated input for event creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub summary: String,
    pub start: String,
    pub end: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl EventDraft {
    pub fn new(
        summary: &str,
        start: &str,
        end: &str,
        description: Option<&str>,
        location: Option<&str>,
    ) -> Result<Self> {
        let summary = require(summary, "Event summary (title) is required")?;
        let start = require(start, "Start time is required (format: 2025-01-15T14:00:00)")?;
        let end = require(end, "End time is required (format: 2025-01-15T15:00:00)")?;

        Ok(Self {
            summary: summary.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            description: optional(description),
            location: optional(location),
        })
    }

    /// The window this event would occupy
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    /// Build the insert body with both ends annotated with `time_zone`
    pub fn to_event(&self, time_zone: &str) -> Event {
        Event {
            id: String::new(),
            summary: Some(self.summary.clone()),
            description: self.description.clone(),
            location: self.location.clone(),
            start: EventDateTime::timed(&self.start, time_zone),
            end: EventDateTime::timed(&self.end, time_zone),
            html_link: None,
        }
    }
}

/// Parameters of an events.list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub max_results: u32,
    /// Lower bound on event end time (upcoming only)
    pub time_min: Option<String>,
    /// Free-text search matched by the provider
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CalendarError;
    use serde_json::json;

    #[test]
    fn test_event_deserialize_google_shape() {
        let event: Event = serde_json::from_value(json!({
            "kind": "calendar#event",
            "id": "abc123",
            "summary": "Lunch",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc",
            "start": {"dateTime": "2025-02-15T12:00:00+09:00", "timeZone": "Asia/Tokyo"},
            "end": {"dateTime": "2025-02-15T13:00:00+09:00", "timeZone": "Asia/Tokyo"}
        }))
        .unwrap();

        assert_eq!(event.id, "abc123");
        assert_eq!(event.title(), "Lunch");
        assert_eq!(event.start.value(), Some("2025-02-15T12:00:00+09:00"));
        assert!(event.location.is_none());
    }

    #[test]
    fn test_all_day_event() {
        let event: Event = serde_json::from_value(json!({
            "id": "holiday",
            "start": {"date": "2025-01-01"},
            "end": {"date": "2025-01-02"}
        }))
        .unwrap();

        assert!(event.start.is_all_day());
        assert_eq!(event.start.value(), Some("2025-01-01"));
        assert_eq!(event.title(), "(No title)");
        assert_eq!(event.title_or("Untitled Event"), "Untitled Event");
    }

    #[test]
    fn test_draft_validation_messages() {
        let err = EventDraft::new("", "2025-01-15T14:00:00", "2025-01-15T15:00:00", None, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Event summary (title) is required");

        let err = EventDraft::new("Lunch", " ", "2025-01-15T15:00:00", None, None).unwrap_err();
        assert!(err.to_string().starts_with("Start time is required"));

        let err = EventDraft::new("Lunch", "2025-01-15T14:00:00", "", None, None).unwrap_err();
        assert!(matches!(err, CalendarError::Validation(_)));
        assert!(err.to_string().starts_with("End time is required"));
    }

    #[test]
    fn test_draft_to_event_body() {
        let draft = EventDraft::new(
            "Lunch",
            "2025-02-15T12:00:00+09:00",
            "2025-02-15T13:00:00+09:00",
            Some("Sushi"),
            Some("  "),
        )
        .unwrap();

        let body = serde_json::to_value(draft.to_event("Asia/Tokyo")).unwrap();
        assert_eq!(
            body,
            json!({
                "summary": "Lunch",
                "description": "Sushi",
                "start": {"dateTime": "2025-02-15T12:00:00+09:00", "timeZone": "Asia/Tokyo"},
                "end": {"dateTime": "2025-02-15T13:00:00+09:00", "timeZone": "Asia/Tokyo"}
            })
        );
    }

    #[test]
    fn test_time_window_requires_both() {
        assert!(TimeWindow::new("2025-01-15T14:00:00Z", "").is_err());
        let window = TimeWindow::new(" 2025-01-15T14:00:00Z ", "2025-01-15T15:00:00Z").unwrap();
        assert_eq!(window.start, "2025-01-15T14:00:00Z");
    }
}
