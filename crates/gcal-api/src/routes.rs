//! Route definitions
//!
//! `/` と `/health` は認証なし、それ以外は API キー (設定時) が必要です。

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::handlers::{
    check_free_time, create_event, delete_event, health, list_events, root, search_events,
};
use crate::server::AppState;

/// Routes reachable without an API key
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Health check
        .route("/health", get(health))
}

/// Calendar endpoints
pub fn calendar_routes() -> Router<AppState> {
    Router::new()
        .route("/list-events", get(list_events))
        .route("/search-events", get(search_events))
        .route("/check-free-time", get(check_free_time))
        .route("/create-event", post(create_event))
        .route("/events/{event_id}", delete(delete_event))
}
