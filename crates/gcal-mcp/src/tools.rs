//! Calendar tools
//!
//! Five tools over one [`EventService`]. The service decides; these
//! only read arguments and render text.

use std::sync::Arc;

use async_trait::async_trait;
use gcal_calendar::validate::{parse_max_results, require};
use gcal_calendar::{
    Availability, CalendarError, CreateOutcome, EventDraft, EventService, TimeWindow,
};
use gcal_core::{Result, SchemaBuilder, Tool, ToolManager, ToolResult};
use serde_json::Value;
use tracing::{error, info};

use crate::format;

/// String argument; numbers and booleans are accepted in their text form
fn arg(input: &Value, key: &str) -> String {
    match input.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn report(action: &str, err: &CalendarError) -> ToolResult {
    match err {
        CalendarError::Validation(_) => {}
        e => error!("Failed to {}: {}", action, e),
    }
    ToolResult::error(format::failure(action, err))
}

/// Register the five calendar tools backed by `service`
pub fn register_calendar_tools(manager: &mut ToolManager, service: Arc<dyn EventService>) {
    manager.register(Arc::new(ListEventsTool::new(service.clone())));
    manager.register(Arc::new(CreateEventTool::new(service.clone())));
    manager.register(Arc::new(DeleteEventTool::new(service.clone())));
    manager.register(Arc::new(SearchEventsTool::new(service.clone())));
    manager.register(Arc::new(CheckFreeTimeTool::new(service)));
}

/// `list_events`
pub struct ListEventsTool {
    service: Arc<dyn EventService>,
}

impl ListEventsTool {
    pub fn new(service: Arc<dyn EventService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn name(&self) -> &str {
        "list_events"
    }

    fn description(&self) -> &str {
        "List upcoming Google Calendar events with optional limit."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema_with_descriptions(vec![(
            "max_results",
            "string",
            "Maximum number of events to return, 1-50 (default: 10)",
            false,
        )])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let raw = arg(&input, "max_results");
        info!("Listing up to {} events", if raw.is_empty() { "10" } else { raw.as_str() });

        let events = match parse_max_results(&raw) {
            Ok(max_results) => self.service.list_upcoming(max_results).await,
            Err(e) => Err(e),
        };

        Ok(match events {
            Ok(events) => ToolResult::success(format::event_list(&events)),
            Err(e) => report("list events", &e),
        })
    }
}

/// `create_event`
pub struct CreateEventTool {
    service: Arc<dyn EventService>,
}

impl CreateEventTool {
    pub fn new(service: Arc<dyn EventService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for CreateEventTool {
    fn name(&self) -> &str {
        "create_event"
    }

    fn description(&self) -> &str {
        "Create a new Google Calendar event with title, start time, end time, and optional description and location. \
         The event is only created when the time slot is free."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema_with_descriptions(vec![
            ("summary", "string", "Event title", true),
            ("start_time", "string", "Start time in ISO 8601 (e.g. 2025-01-15T14:00:00)", true),
            ("end_time", "string", "End time in ISO 8601 (e.g. 2025-01-15T15:00:00)", true),
            ("description", "string", "Event description", false),
            ("location", "string", "Event location", false),
        ])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let summary = arg(&input, "summary");
        info!("Creating event: {}", summary);

        let draft = match EventDraft::new(
            &summary,
            &arg(&input, "start_time"),
            &arg(&input, "end_time"),
            Some(arg(&input, "description").as_str()),
            Some(arg(&input, "location").as_str()),
        ) {
            Ok(draft) => draft,
            Err(e) => return Ok(report("create event", &e)),
        };

        Ok(match self.service.create_event(draft.clone()).await {
            Ok(CreateOutcome::Created(created)) => ToolResult::success(format::event_created(
                &draft.summary,
                &draft.start,
                &draft.end,
                draft.location.as_deref(),
                &created,
            )),
            Ok(CreateOutcome::Occupied(busy)) => {
                ToolResult::error(format::slot_already_occupied(&busy))
            }
            Err(e) => report("create event", &e),
        })
    }
}

/// `delete_event`
pub struct DeleteEventTool {
    service: Arc<dyn EventService>,
}

impl DeleteEventTool {
    pub fn new(service: Arc<dyn EventService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn name(&self) -> &str {
        "delete_event"
    }

    fn description(&self) -> &str {
        "Delete a Google Calendar event by its ID."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema_with_descriptions(vec![(
            "event_id",
            "string",
            "ID of the event to delete (shown as 🆔 in list and search results)",
            true,
        )])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let event_id = arg(&input, "event_id");
        info!("Deleting event: {}", event_id);

        Ok(match self.service.delete_event(&event_id).await {
            Ok(deleted) => ToolResult::success(format::event_deleted(
                deleted.title_or(format::UNTITLED_EVENT),
                event_id.trim(),
            )),
            Err(CalendarError::NotFound(_)) => {
                ToolResult::error(format::event_not_found(event_id.trim()))
            }
            Err(e) => report("delete event", &e),
        })
    }
}

/// `search_events`
pub struct SearchEventsTool {
    service: Arc<dyn EventService>,
}

impl SearchEventsTool {
    pub fn new(service: Arc<dyn EventService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SearchEventsTool {
    fn name(&self) -> &str {
        "search_events"
    }

    fn description(&self) -> &str {
        "Search for events by keyword in title, description, or location."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema_with_descriptions(vec![
            ("query", "string", "Keyword to search for", true),
            ("max_results", "string", "Maximum number of events to return, 1-50 (default: 10)", false),
        ])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let query = arg(&input, "query");
        info!("Searching events: {}", query);

        // クエリの必須チェックを件数チェックより先に行う
        let events = match require(&query, "Search query is required")
            .and_then(|_| parse_max_results(&arg(&input, "max_results")))
        {
            Ok(max_results) => self.service.search(&query, max_results).await,
            Err(e) => Err(e),
        };

        Ok(match events {
            Ok(events) => ToolResult::success(format::search_results(query.trim(), &events)),
            Err(e) => report("search events", &e),
        })
    }
}

/// `check_free_time`
pub struct CheckFreeTimeTool {
    service: Arc<dyn EventService>,
}

impl CheckFreeTimeTool {
    pub fn new(service: Arc<dyn EventService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for CheckFreeTimeTool {
    fn name(&self) -> &str {
        "check_free_time"
    }

    fn description(&self) -> &str {
        "Check if a time slot is available in your calendar."
    }

    fn input_schema(&self) -> Value {
        SchemaBuilder::object_schema_with_descriptions(vec![
            ("start_time", "string", "Start of the slot in ISO 8601", true),
            ("end_time", "string", "End of the slot in ISO 8601", true),
        ])
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let start = arg(&input, "start_time");
        let end = arg(&input, "end_time");
        info!("Checking availability: {} to {}", start, end);

        let window = match TimeWindow::new(&start, &end) {
            Ok(window) => window,
            Err(e) => return Ok(report("check availability", &e)),
        };

        Ok(match self.service.check_availability(&window).await {
            Availability::Available => ToolResult::success(format::slot_available(&window)),
            Availability::Occupied(_) => ToolResult::success(format::slot_occupied(&window)),
            Availability::CheckFailed(reason) => {
                report("check availability", &CalendarError::AvailabilityCheck(reason))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arg_accepts_strings_and_numbers() {
        let input = json!({"max_results": 5, "query": "Lunch", "flag": true, "none": null});
        assert_eq!(arg(&input, "max_results"), "5");
        assert_eq!(arg(&input, "query"), "Lunch");
        assert_eq!(arg(&input, "flag"), "true");
        assert_eq!(arg(&input, "none"), "");
        assert_eq!(arg(&input, "missing"), "");
    }
}
