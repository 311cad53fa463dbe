//! Google Calendar v3 REST client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use gcal_core::GoogleConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::auth::TokenManager;
use crate::error::{CalendarError, Result};
use crate::models::{Event, EventQuery, TimePeriod, TimeWindow};
use crate::provider::CalendarProvider;

/// Authenticated client for one Google calendar
pub struct GoogleCalendarClient {
    http: Client,
    base_url: Url,
    calendar_id: String,
    tokens: TokenManager,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<TimePeriod>,
    #[serde(default)]
    errors: Vec<FreeBusyError>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyError {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
}

impl GoogleCalendarClient {
    /// Create a client for `config.calendar_id`
    pub fn new(config: &GoogleConfig, tokens: TokenManager) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = Url::parse(config.api_base_url.trim_end_matches('/')).map_err(|e| {
            CalendarError::Configuration(format!(
                "invalid api_base_url '{}': {}",
                config.api_base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CalendarError::Configuration(format!(
                "api_base_url '{}' cannot be used as a base URL",
                config.api_base_url
            )));
        }

        info!("Calendar client initialized for: {} ({})", base_url, config.calendar_id);

        Ok(Self {
            http,
            base_url,
            calendar_id: config.calendar_id.clone(),
            tokens,
        })
    }

    /// `{base}/{segments...}` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn events_url(&self) -> Url {
        self.url(&["calendars", &self.calendar_id, "events"])
    }

    fn event_url(&self, event_id: &str) -> Url {
        self.url(&["calendars", &self.calendar_id, "events", event_id])
    }

    /// Attach the bearer token, send, and map non-success statuses
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let access_token = self.tokens.access_token().await?;
        let response = request.bearer_auth(access_token).send().await?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(Self::error_from_response(response).await)
    }

    async fn error_from_response(response: Response) -> CalendarError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleErrorBody>(&body)
            .map(|b| b.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);

        error!("Calendar API request failed: {} - {}", status, message);

        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => CalendarError::NotFound(message),
            StatusCode::CONFLICT => CalendarError::Conflict(message),
            StatusCode::UNAUTHORIZED => CalendarError::Authentication(message),
            _ => CalendarError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>> {
        let mut params = vec![
            ("maxResults", query.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(time_min) = &query.time_min {
            params.push(("timeMin", time_min.clone()));
        }
        if let Some(text) = &query.text {
            params.push(("q", text.clone()));
        }

        debug!("Fetching events: {:?}", params);
        let response = self
            .send(self.http.get(self.events_url()).query(&params))
            .await?;

        let list: EventList = response.json().await?;
        info!("Fetched {} events", list.items.len());
        Ok(list.items)
    }

    async fn get_event(&self, event_id: &str) -> Result<Event> {
        let response = self.send(self.http.get(self.event_url(event_id))).await?;
        Ok(response.json().await?)
    }

    async fn insert_event(&self, event: &Event) -> Result<Event> {
        debug!("Creating event: {}", event.title());
        let response = self
            .send(self.http.post(self.events_url()).json(event))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        debug!("Deleting event: {}", event_id);
        self.send(self.http.delete(self.event_url(event_id))).await?;
        Ok(())
    }

    async fn query_free_busy(&self, window: &TimeWindow) -> Result<Vec<TimePeriod>> {
        let body = json!({
            "timeMin": window.start,
            "timeMax": window.end,
            "items": [{"id": self.calendar_id}],
        });

        let response = self
            .send(self.http.post(self.url(&["freeBusy"])).json(&body))
            .await?;
        let mut free_busy: FreeBusyResponse = response.json().await?;

        let calendar = free_busy
            .calendars
            .remove(&self.calendar_id)
            .ok_or_else(|| {
                CalendarError::AvailabilityCheck(format!(
                    "calendar '{}' missing from free/busy response",
                    self.calendar_id
                ))
            })?;

        if !calendar.errors.is_empty() {
            let reasons: Vec<String> = calendar
                .errors
                .iter()
                .map(|e| format!("{}/{}", e.domain, e.reason))
                .collect();
            return Err(CalendarError::AvailabilityCheck(reasons.join(", ")));
        }

        Ok(calendar.busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StoredToken;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::Value;
    use std::path::PathBuf;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer test-token")
    }

    /// Minimal stand-in for the Calendar API
    fn fake_google() -> Router {
        Router::new()
            .route(
                "/calendars/{calendar}/events",
                get(
                    |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                        if !authorized(&headers) {
                            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({"error": {"code": 401, "message": "Invalid Credentials"}})));
                        }
                        assert_eq!(q.get("singleEvents").map(String::as_str), Some("true"));
                        assert_eq!(q.get("orderBy").map(String::as_str), Some("startTime"));
                        let summary = q.get("q").cloned().unwrap_or_else(|| "Standup".into());
                        (
                            StatusCode::OK,
                            Json(serde_json::json!({
                                "items": [{
                                    "id": "e1",
                                    "summary": summary,
                                    "start": {"dateTime": "2025-02-15T09:00:00+09:00"},
                                    "end": {"dateTime": "2025-02-15T09:15:00+09:00"}
                                }]
                            })),
                        )
                    },
                )
                .post(|Json(body): Json<Value>| async move {
                    let mut created = body;
                    created["id"] = "new-id".into();
                    created["htmlLink"] = "https://www.google.com/calendar/event?eid=new".into();
                    (StatusCode::OK, Json(created))
                }),
            )
            .route(
                "/calendars/{calendar}/events/{id}",
                get(|Path((_, id)): Path<(String, String)>| async move {
                    if id == "known" {
                        (StatusCode::OK, Json(serde_json::json!({"id": "known", "summary": "Dentist"})))
                    } else {
                        (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": {"code": 404, "message": "Not Found"}})))
                    }
                })
                .delete(|| async { StatusCode::NO_CONTENT }),
            )
            .route(
                "/freeBusy",
                post(|Json(body): Json<Value>| async move {
                    let busy = if body["timeMin"] == "2025-02-15T12:00:00+09:00" {
                        serde_json::json!([{"start": "2025-02-15T03:00:00Z", "end": "2025-02-15T04:00:00Z"}])
                    } else {
                        serde_json::json!([])
                    };
                    let calendar = if body["timeMin"] == "bad" {
                        serde_json::json!({"errors": [{"domain": "global", "reason": "notFound"}]})
                    } else {
                        serde_json::json!({"busy": busy})
                    };
                    Json(serde_json::json!({"kind": "calendar#freeBusy", "calendars": {"primary": calendar}}))
                }),
            )
    }

    async fn client_for(access_token: &str) -> GoogleCalendarClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, fake_google()).await.unwrap() });

        let token = StoredToken {
            token: access_token.to_string(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: vec![],
            expiry: None,
            extra: serde_json::Map::new(),
        };
        let tokens = TokenManager::new(token, PathBuf::from("unused.json"), "http://127.0.0.1:9/token", None, Client::new());

        let config = GoogleConfig {
            api_base_url: format!("http://{}/", addr),
            ..Default::default()
        };
        GoogleCalendarClient::new(&config, tokens).unwrap()
    }

    #[tokio::test]
    async fn test_list_events() {
        let client = client_for("test-token").await;
        let query = EventQuery {
            max_results: 5,
            time_min: Some("2025-01-01T00:00:00Z".into()),
            text: Some("Lunch".into()),
        };

        let events = client.list_events(&query).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title(), "Lunch");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication() {
        let client = client_for("wrong-token").await;
        let query = EventQuery { max_results: 5, time_min: None, text: None };

        let err = client.list_events(&query).await.unwrap_err();
        assert!(matches!(err, CalendarError::Authentication(ref m) if m == "Invalid Credentials"));
    }

    #[tokio::test]
    async fn test_get_event_not_found() {
        let client = client_for("test-token").await;

        assert_eq!(client.get_event("known").await.unwrap().title(), "Dentist");
        let err = client.get_event("missing").await.unwrap_err();
        assert!(matches!(err, CalendarError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_and_delete() {
        let client = client_for("test-token").await;
        let draft = crate::EventDraft::new(
            "Lunch",
            "2025-02-15T12:00:00+09:00",
            "2025-02-15T13:00:00+09:00",
            None,
            None,
        )
        .unwrap();

        let created = client.insert_event(&draft.to_event("Asia/Tokyo")).await.unwrap();
        assert_eq!(created.id, "new-id");
        assert_eq!(created.start.time_zone.as_deref(), Some("Asia/Tokyo"));
        assert!(created.html_link.is_some());

        client.delete_event("known").await.unwrap();
    }

    #[tokio::test]
    async fn test_free_busy() {
        let client = client_for("test-token").await;

        let busy_window = TimeWindow::new("2025-02-15T12:00:00+09:00", "2025-02-15T13:00:00+09:00").unwrap();
        assert_eq!(client.query_free_busy(&busy_window).await.unwrap().len(), 1);

        let free_window = TimeWindow::new("2025-02-16T12:00:00+09:00", "2025-02-16T13:00:00+09:00").unwrap();
        assert!(client.query_free_busy(&free_window).await.unwrap().is_empty());

        let bad_window = TimeWindow::new("bad", "bad").unwrap();
        let err = client.query_free_busy(&bad_window).await.unwrap_err();
        assert!(matches!(err, CalendarError::AvailabilityCheck(ref m) if m == "global/notFound"));
    }

    #[test]
    fn test_event_url_is_encoded() {
        let token = StoredToken {
            token: "t".into(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: vec![],
            expiry: None,
            extra: serde_json::Map::new(),
        };
        let tokens = TokenManager::new(token, PathBuf::from("unused.json"), "http://127.0.0.1:9/token", None, Client::new());
        let config = GoogleConfig {
            calendar_id: "team@group.calendar.google.com".into(),
            ..Default::default()
        };
        let client = GoogleCalendarClient::new(&config, tokens).unwrap();

        assert_eq!(
            client.event_url("a/b").as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team@group.calendar.google.com/events/a%2Fb"
        );
    }
}
