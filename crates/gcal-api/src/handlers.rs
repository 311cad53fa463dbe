//! HTTP API handlers
//!
//! Thin adapters over [`gcal_calendar::EventService`].

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gcal_calendar::validate::parse_max_results;
use gcal_calendar::{
    Availability, CalendarError, CreateOutcome, Event, EventDraft, TimePeriod, TimeWindow,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// `?max_results=` (string, as the tools receive it)
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub max_results: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub max_results: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FreeTimeQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Create event payload
///
/// Required fields default to empty so that a missing field gets the
/// same validation message as a blank one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventsResponse {
    pub result: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
    pub link: Option<String>,
}

/// 409 body when the requested slot is busy
#[derive(Debug, Serialize, Deserialize)]
pub struct OccupiedResponse {
    pub message: String,
    pub busy: Vec<TimePeriod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub busy: Vec<TimePeriod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub message: String,
    pub id: String,
    pub summary: String,
}

// ============================================================================
// Handler functions
// ============================================================================

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"message": format!("running on port {}", state.config.port)}))
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<EventsResponse>> {
    let max_results = parse_max_results(query.max_results.as_deref().unwrap_or_default())?;
    debug!("List request: max_results={}", max_results);

    let events = state.service.list_upcoming(max_results).await?;
    Ok(Json(EventsResponse { result: events }))
}

pub async fn search_events(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<EventsResponse>> {
    let text = query.query.unwrap_or_default();
    let max_results = parse_max_results(query.max_results.as_deref().unwrap_or_default())?;
    debug!("Search request: '{}' max_results={}", text, max_results);

    let events = state.service.search(&text, max_results).await?;
    Ok(Json(EventsResponse { result: events }))
}

pub async fn check_free_time(
    State(state): State<AppState>,
    Query(query): Query<FreeTimeQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let window = TimeWindow::new(
        query.start_time.as_deref().unwrap_or_default(),
        query.end_time.as_deref().unwrap_or_default(),
    )?;

    match state.service.check_availability(&window).await {
        Availability::Available => Ok(Json(AvailabilityResponse {
            available: true,
            busy: Vec::new(),
        })),
        Availability::Occupied(busy) => Ok(Json(AvailabilityResponse {
            available: false,
            busy,
        })),
        Availability::CheckFailed(reason) => {
            Err(CalendarError::AvailabilityCheck(reason).into())
        }
    }
}

/// Create an event unless its slot is busy
pub async fn create_event(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    info!("Create request: {}", req.summary);

    let draft = EventDraft::new(
        &req.summary,
        &req.start,
        &req.end,
        req.description.as_deref(),
        req.location.as_deref(),
    )?;

    let response = match state.service.create_event(draft).await? {
        CreateOutcome::Created(event) => (
            StatusCode::CREATED,
            Json(CreatedResponse {
                message: "Event created".to_string(),
                id: event.id,
                link: event.html_link,
            }),
        )
            .into_response(),
        CreateOutcome::Occupied(busy) => (
            StatusCode::CONFLICT,
            Json(OccupiedResponse {
                message: "Time slot is already occupied".to_string(),
                busy,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    info!("Delete request: {}", event_id);

    let deleted = state.service.delete_event(&event_id).await?;
    Ok(Json(DeletedResponse {
        message: "Event deleted".to_string(),
        id: event_id.trim().to_string(),
        summary: deleted.title_or("Untitled Event").to_string(),
    }))
}
