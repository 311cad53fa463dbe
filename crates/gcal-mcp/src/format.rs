//! ツール出力のテキスト整形
//!
//! MCP クライアント (LLM) にそのまま見せる絵文字付きのテキストを作ります。

use chrono::{DateTime, NaiveDateTime};
use gcal_calendar::{CalendarError, Event, TimePeriod, TimeWindow};

/// `YYYY-MM-DD HH:MM` when the value parses as a timestamp, raw otherwise
pub fn format_datetime(value: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    // Offset-less input such as 2025-01-15T14:00:00
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

fn event_start(event: &Event) -> String {
    event
        .start
        .value()
        .map(format_datetime)
        .unwrap_or_default()
}

pub fn event_list(events: &[Event]) -> String {
    if events.is_empty() {
        return "📭 No upcoming events found.".to_string();
    }

    let items: Vec<String> = events
        .iter()
        .map(|event| {
            let mut item = format!("• **{}**\n  📅 {}", event.title(), event_start(event));
            if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
                item.push_str(&format!("\n  📍 {}", location));
            }
            item.push_str(&format!("\n  🆔 {}", event.id));
            item
        })
        .collect();

    format!(
        "📅 **Upcoming Events ({}):**\n\n{}",
        events.len(),
        items.join("\n\n")
    )
}

pub fn search_results(query: &str, events: &[Event]) -> String {
    if events.is_empty() {
        return format!("🔍 No events found matching: '{}'", query);
    }

    let items: Vec<String> = events
        .iter()
        .map(|event| {
            format!(
                "• **{}**\n  📅 {}\n  🆔 {}",
                event.title(),
                event_start(event),
                event.id
            )
        })
        .collect();

    format!(
        "🔍 **Search Results for '{}' ({}):**\n\n{}",
        query,
        events.len(),
        items.join("\n\n")
    )
}

/// Confirmation for a created event
///
/// Title, times and location echo the request; id and link come from
/// the provider.
pub fn event_created(
    summary: &str,
    start: &str,
    end: &str,
    location: Option<&str>,
    created: &Event,
) -> String {
    let mut text = String::from("✅ **Event Created Successfully!**\n\n");
    text.push_str(&format!("📋 **Title:** {}\n", summary));
    text.push_str(&format!("📅 **Start:** {}\n", format_datetime(start)));
    text.push_str(&format!("📅 **End:** {}\n", format_datetime(end)));
    if let Some(location) = location {
        text.push_str(&format!("📍 **Location:** {}\n", location));
    }
    text.push_str(&format!("🆔 **ID:** {}\n", created.id));
    text.push_str(&format!(
        "🔗 **Link:** {}",
        created.html_link.as_deref().unwrap_or("-")
    ));
    text
}

pub fn slot_already_occupied(busy: &[TimePeriod]) -> String {
    let mut text = String::from("⚠️ Time slot is already occupied!\n\n");
    for period in busy {
        text.push_str(&format!(
            "⏰ Busy: {} to {}\n",
            format_datetime(&period.start),
            format_datetime(&period.end)
        ));
    }
    if !busy.is_empty() {
        text.push('\n');
    }
    text.push_str("Please choose a different time or check your calendar.");
    text
}

/// Title shown for a deleted event without one
pub const UNTITLED_EVENT: &str = "Untitled Event";

pub fn event_deleted(title: &str, event_id: &str) -> String {
    format!(
        "✅ **Event Deleted Successfully!**\n\n📋 Deleted: {}\n🆔 ID: {}",
        title, event_id
    )
}

pub fn event_not_found(event_id: &str) -> String {
    format!("❌ Event not found with ID: {}", event_id)
}

pub fn slot_available(window: &TimeWindow) -> String {
    format!(
        "✅ **Time Slot Available!**\n\n📅 {} to {}\n\nYou can schedule an event during this time.",
        format_datetime(&window.start),
        format_datetime(&window.end)
    )
}

pub fn slot_occupied(window: &TimeWindow) -> String {
    format!(
        "⚠️ **Time Slot Occupied**\n\n📅 {} to {}\n\nYou already have an event during this time.",
        format_datetime(&window.start),
        format_datetime(&window.end)
    )
}

/// Failure text for `action` ("list events", "create event", ...)
pub fn failure(action: &str, err: &CalendarError) -> String {
    match err {
        CalendarError::Validation(message) => format!("❌ Error: {}", message),
        CalendarError::AvailabilityCheck(reason) => {
            format!("❌ Failed to check availability: {}", reason)
        }
        CalendarError::Api { .. } => format!("❌ {}", err),
        e if e.is_provider() => format!("❌ Google Calendar API error: {}", e),
        e => format!("❌ Failed to {}: {}", action, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcal_calendar::EventDateTime;

    fn event(id: &str, summary: &str, start: &str, location: Option<&str>) -> Event {
        Event {
            id: id.to_string(),
            summary: Some(summary.to_string()),
            location: location.map(String::from),
            start: EventDateTime {
                date_time: Some(start.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_format_datetime() {
        assert_eq!(format_datetime("2025-02-15T12:00:00+09:00"), "2025-02-15 12:00");
        assert_eq!(format_datetime("2025-01-15T14:00:00Z"), "2025-01-15 14:00");
        assert_eq!(format_datetime("2025-01-15T14:00:00"), "2025-01-15 14:00");
        assert_eq!(format_datetime("2025-01-01"), "2025-01-01");
        assert_eq!(format_datetime("tomorrow"), "tomorrow");
    }

    #[test]
    fn test_event_list() {
        assert_eq!(event_list(&[]), "📭 No upcoming events found.");

        let text = event_list(&[
            event("a1", "Standup", "2025-02-15T09:00:00+09:00", None),
            event("b2", "Lunch", "2025-02-15T12:00:00+09:00", Some("Cafeteria")),
        ]);
        assert_eq!(
            text,
            "📅 **Upcoming Events (2):**\n\n\
             • **Standup**\n  📅 2025-02-15 09:00\n  🆔 a1\n\n\
             • **Lunch**\n  📅 2025-02-15 12:00\n  📍 Cafeteria\n  🆔 b2"
        );
    }

    #[test]
    fn test_search_results_omit_location() {
        assert_eq!(search_results("Lunch", &[]), "🔍 No events found matching: 'Lunch'");

        let text = search_results(
            "Lunch",
            &[event("b2", "Lunch", "2025-02-15T12:00:00+09:00", Some("Cafeteria"))],
        );
        assert!(text.starts_with("🔍 **Search Results for 'Lunch' (1):**"));
        assert!(!text.contains("Cafeteria"));
    }

    #[test]
    fn test_event_created() {
        let mut created = event("new-id", "Lunch", "2025-02-15T12:00:00+09:00", None);
        created.html_link = Some("https://calendar.example/e".into());

        let text = event_created(
            "Lunch",
            "2025-02-15T12:00:00+09:00",
            "2025-02-15T13:00:00+09:00",
            None,
            &created,
        );
        assert_eq!(
            text,
            "✅ **Event Created Successfully!**\n\n\
             📋 **Title:** Lunch\n\
             📅 **Start:** 2025-02-15 12:00\n\
             📅 **End:** 2025-02-15 13:00\n\
             🆔 **ID:** new-id\n\
             🔗 **Link:** https://calendar.example/e"
        );
    }

    #[test]
    fn test_slot_already_occupied() {
        assert_eq!(
            slot_already_occupied(&[]),
            "⚠️ Time slot is already occupied!\n\nPlease choose a different time or check your calendar."
        );

        let text = slot_already_occupied(&[TimePeriod::new("2025-02-15T03:00:00Z", "2025-02-15T04:00:00Z")]);
        assert!(text.contains("⏰ Busy: 2025-02-15 03:00 to 2025-02-15 04:00"));
        assert!(text.ends_with("Please choose a different time or check your calendar."));
    }

    #[test]
    fn test_failure_prefixes() {
        let validation = CalendarError::Validation("Event ID is required".into());
        assert_eq!(failure("delete event", &validation), "❌ Error: Event ID is required");

        let provider = CalendarError::Api { status: 403, message: "Rate Limit Exceeded".into() };
        assert_eq!(
            failure("list events", &provider),
            "❌ Google Calendar API error (HTTP 403): Rate Limit Exceeded"
        );

        let conflict = CalendarError::Conflict("The requested identifier already exists.".into());
        assert!(failure("create event", &conflict).starts_with("❌ Google Calendar API error: Calendar conflict"));

        let check = CalendarError::AvailabilityCheck("timeout".into());
        assert_eq!(failure("create event", &check), "❌ Failed to check availability: timeout");

        let io = CalendarError::Io(std::io::Error::other("broken pipe"));
        assert_eq!(failure("search events", &io), "❌ Failed to search events: IO error: broken pipe");
    }
}
