//! Tool system
//!
//! MCP サーバーが公開するツールを登録・実行するための仕組みです。

pub mod definition;
pub mod manager;
pub mod traits;

pub use definition::{SchemaBuilder, ToolDefinition};
pub use manager::ToolManager;
pub use traits::{Tool, ToolResult};
