//! HTTP client for the calendar API (bridge mode)
//!
//! [`ApiClient`] implements [`EventService`] by calling a running
//! `gcal-gateway --api` instance, so the MCP tools can be served from a
//! process that holds no Google credentials.

use std::time::Duration;

use async_trait::async_trait;
use gcal_calendar::validate::require;
use gcal_calendar::{
    Availability, CalendarError, CreateOutcome, Event, EventDateTime, EventDraft, EventService,
    Result, TimeWindow,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ErrorBody;
use crate::handlers::{
    AvailabilityResponse, CreateEventRequest, CreatedResponse, DeletedResponse, EventsResponse,
    OccupiedResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`EventService`] backed by the HTTP API
pub struct ApiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(api_url: &str, api_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(api_url).map_err(|e| {
            CalendarError::Configuration(format!("invalid bridge api_url '{}': {}", api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CalendarError::Configuration(format!(
                "bridge api_url '{}' cannot be used as a base URL",
                api_url
            )));
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        info!("Bridge client targeting {}", base_url);
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        Ok(request.send().await?)
    }

    /// Turn a non-success response back into the error the server saw
    async fn error_from(response: Response) -> CalendarError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.into_calendar_error(status),
            Err(_) => CalendarError::Api {
                status: status.as_u16(),
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    text
                },
            },
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .send(self.http.get(self.url(segments)).query(query))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl EventService for ApiClient {
    async fn list_upcoming(&self, max_results: u32) -> Result<Vec<Event>> {
        let response: EventsResponse = self
            .get_json(&["list-events"], &[("max_results", max_results.to_string())])
            .await?;
        debug!("Bridge listed {} events", response.result.len());
        Ok(response.result)
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Event>> {
        let response: EventsResponse = self
            .get_json(
                &["search-events"],
                &[
                    ("query", query.to_string()),
                    ("max_results", max_results.to_string()),
                ],
            )
            .await?;
        Ok(response.result)
    }

    async fn check_availability(&self, window: &TimeWindow) -> Availability {
        let result: Result<AvailabilityResponse> = self
            .get_json(
                &["check-free-time"],
                &[
                    ("start_time", window.start.clone()),
                    ("end_time", window.end.clone()),
                ],
            )
            .await;

        match result {
            Ok(r) if r.available => Availability::Available,
            Ok(r) => Availability::Occupied(r.busy),
            Err(CalendarError::AvailabilityCheck(reason)) => Availability::CheckFailed(reason),
            Err(e) => {
                warn!("Bridge availability check failed: {}", e);
                Availability::CheckFailed(e.to_string())
            }
        }
    }

    async fn create_event(&self, draft: EventDraft) -> Result<CreateOutcome> {
        let body = CreateEventRequest {
            summary: draft.summary.clone(),
            description: draft.description.clone(),
            start: draft.start.clone(),
            end: draft.end.clone(),
            location: draft.location.clone(),
        };

        let response = self
            .send(self.http.post(self.url(&["create-event"])).json(&body))
            .await?;

        match response.status() {
            s if s.is_success() => {
                let created: CreatedResponse = response.json().await?;
                Ok(CreateOutcome::Created(Event {
                    id: created.id,
                    summary: Some(draft.summary),
                    description: draft.description,
                    location: draft.location,
                    start: EventDateTime {
                        date_time: Some(draft.start),
                        ..Default::default()
                    },
                    end: EventDateTime {
                        date_time: Some(draft.end),
                        ..Default::default()
                    },
                    html_link: created.link,
                }))
            }
            StatusCode::CONFLICT => {
                // 409 は「埋まっている」か「insert 時の競合」のどちらか
                let value: Value = response.json().await?;
                if value.get("busy").is_some() {
                    let occupied: OccupiedResponse = serde_json::from_value(value)?;
                    return Ok(CreateOutcome::Occupied(occupied.busy));
                }
                let body: ErrorBody = serde_json::from_value(value)?;
                Err(body.into_calendar_error(StatusCode::CONFLICT))
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn delete_event(&self, event_id: &str) -> Result<Event> {
        let event_id = require(event_id, "Event ID is required")?;

        let response = self
            .send(self.http.delete(self.url(&["events", event_id])))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let deleted: DeletedResponse = response.json().await?;
        Ok(Event {
            id: deleted.id,
            summary: Some(deleted.summary),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_url() {
        assert!(matches!(
            ApiClient::new("not a url", None),
            Err(CalendarError::Configuration(_))
        ));
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = ApiClient::new("http://localhost:8000/gcal/", None).unwrap();
        assert_eq!(
            client.url(&["events", "a b"]).as_str(),
            "http://localhost:8000/gcal/events/a%20b"
        );

        let client = ApiClient::new("http://localhost:8000", None).unwrap();
        assert_eq!(client.url(&["list-events"]).as_str(), "http://localhost:8000/list-events");
    }
}
