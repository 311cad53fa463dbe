//! gcal-mcp: Google Calendar tools over MCP
//!
//! カレンダー操作を MCP (Model Context Protocol) のツールとして stdio で公開します。
//! ツールは [`gcal_calendar::EventService`] の上に載っているので、
//! Google API 直結でも HTTP API 経由 (bridge) でも同じテキストを返します。

pub mod format;
pub mod server;
pub mod tools;

pub use server::{CalendarMcpServer, SERVER_NAME, serve_stdio};
pub use tools::{
    CheckFreeTimeTool, CreateEventTool, DeleteEventTool, ListEventsTool, SearchEventsTool,
    register_calendar_tools,
};
