//! Availability-gated event service
//!
//! The one place where event operations are decided. The MCP tools and
//! the HTTP handlers are thin adapters over [`EventService`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CalendarError, Result};
use crate::models::{Event, EventDraft, EventQuery, TimePeriod, TimeWindow};
use crate::provider::CalendarProvider;
use crate::validate::{check_max_results, require};

/// Outcome of a free/busy check
///
/// A failed check is its own variant so it can never be read as
/// "occupied" (or, worse, as "available").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Occupied(Vec<TimePeriod>),
    CheckFailed(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Outcome of a create request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Event),
    /// The window was busy; nothing was inserted
    Occupied(Vec<TimePeriod>),
}

/// Event operations exposed to presentation adapters
#[async_trait]
pub trait EventService: Send + Sync {
    /// Upcoming events from now, at most `max_results` (1..=50)
    async fn list_upcoming(&self, max_results: u32) -> Result<Vec<Event>>;

    /// Free-text search, at most `max_results` (1..=50)
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Event>>;

    /// Free/busy check over `window`
    async fn check_availability(&self, window: &TimeWindow) -> Availability;

    /// Insert `draft` unless its window is busy
    ///
    /// A failed availability check is returned as
    /// [`CalendarError::AvailabilityCheck`] and nothing is inserted.
    async fn create_event(&self, draft: EventDraft) -> Result<CreateOutcome>;

    /// Delete by id, returning the event as it was before deletion
    async fn delete_event(&self, event_id: &str) -> Result<Event>;
}

/// [`EventService`] backed by a [`CalendarProvider`]
pub struct CalendarService {
    provider: Arc<dyn CalendarProvider>,
    timezone: String,
}

impl CalendarService {
    /// `timezone` is attached to both ends of every created event
    pub fn new(provider: Arc<dyn CalendarProvider>, timezone: impl Into<String>) -> Self {
        Self {
            provider,
            timezone: timezone.into(),
        }
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }
}

#[async_trait]
impl EventService for CalendarService {
    async fn list_upcoming(&self, max_results: u32) -> Result<Vec<Event>> {
        let max_results = check_max_results(i64::from(max_results))?;
        let query = EventQuery {
            max_results,
            time_min: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            text: None,
        };

        let events = self.provider.list_events(&query).await?;
        debug!("Listed {} upcoming events", events.len());
        Ok(events)
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Event>> {
        let text = require(query, "Search query is required")?;
        let max_results = check_max_results(i64::from(max_results))?;
        let query = EventQuery {
            max_results,
            time_min: None,
            text: Some(text.to_string()),
        };

        let events = self.provider.list_events(&query).await?;
        debug!("Search '{}' matched {} events", text, events.len());
        Ok(events)
    }

    async fn check_availability(&self, window: &TimeWindow) -> Availability {
        match self.provider.query_free_busy(window).await {
            Ok(busy) if busy.is_empty() => Availability::Available,
            Ok(busy) => {
                debug!("{} busy slot(s) in {} .. {}", busy.len(), window.start, window.end);
                Availability::Occupied(busy)
            }
            Err(e) => {
                warn!("Free/busy query failed: {}", e);
                Availability::CheckFailed(e.to_string())
            }
        }
    }

    async fn create_event(&self, draft: EventDraft) -> Result<CreateOutcome> {
        match self.check_availability(&draft.window()).await {
            Availability::Available => {}
            Availability::Occupied(busy) => {
                info!("Refusing to create '{}': time slot occupied", draft.summary);
                return Ok(CreateOutcome::Occupied(busy));
            }
            Availability::CheckFailed(reason) => {
                return Err(CalendarError::AvailabilityCheck(reason));
            }
        }

        // The window may fill up between the check and the insert; a
        // provider-side conflict surfaces as CalendarError::Conflict.
        let created = self
            .provider
            .insert_event(&draft.to_event(&self.timezone))
            .await?;

        info!("Created event {} ('{}')", created.id, draft.summary);
        Ok(CreateOutcome::Created(created))
    }

    async fn delete_event(&self, event_id: &str) -> Result<Event> {
        let event_id = require(event_id, "Event ID is required")?;

        let event = self.provider.get_event(event_id).await?;
        self.provider.delete_event(event_id).await?;

        info!("Deleted event {} ('{}')", event_id, event.title());
        Ok(event)
    }
}
