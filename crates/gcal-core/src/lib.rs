//! gcal-core: shared foundation for gcal-gateway
//!
//! 設定の読み込み、共通エラー型、そして MCP サーバーと
//! ブリッジの両方が使うツールシステムを提供します。

pub mod config;
pub mod error;
pub mod tool;

pub use config::{ApiConfig, BridgeConfig, Config, GoogleConfig};
pub use error::{Error, Result};
pub use tool::{SchemaBuilder, Tool, ToolDefinition, ToolManager, ToolResult};
