//! Calendar provider abstraction
//!
//! The seam between the event service and the remote calendar. The
//! production implementation is [`crate::GoogleCalendarClient`]; tests
//! substitute in-memory stubs.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Event, EventQuery, TimePeriod, TimeWindow};

/// Raw operations against one calendar
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// events.list, ordered by start time by the provider
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>>;

    /// events.get; a missing event is [`crate::CalendarError::NotFound`]
    async fn get_event(&self, event_id: &str) -> Result<Event>;

    /// events.insert, returning the stored event with its id and link
    async fn insert_event(&self, event: &Event) -> Result<Event>;

    /// events.delete
    async fn delete_event(&self, event_id: &str) -> Result<()>;

    /// freebusy.query for this calendar over `window`
    async fn query_free_busy(&self, window: &TimeWindow) -> Result<Vec<TimePeriod>>;
}
