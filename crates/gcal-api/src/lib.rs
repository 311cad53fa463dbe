//! gcal-api: HTTP API for gcal-gateway
//!
//! カレンダー操作を JSON エンドポイントとして公開します (axum)。
//! 同じ API を呼ぶ [`ApiClient`] も含み、bridge モードの MCP サーバーが使います。

pub mod client;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use client::ApiClient;
pub use error::{ApiError, ErrorBody, Result};
pub use server::{AppState, build_router, start_server};
