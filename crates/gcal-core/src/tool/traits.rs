//! Tool trait definition
//!
//! Defines the core trait for tools exposed to an agent runtime.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::Result;

/// Tool execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Human-readable output text
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// A named operation callable by the agent runtime
///
/// Failures the user should see are reported through
/// [`ToolResult::error`]; the `Err` path is reserved for
/// failures of the tool machinery itself.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised to the runtime
    fn name(&self) -> &str;

    /// Tool description (shown to the model when selecting tools)
    fn description(&self) -> &str;

    /// JSON schema for the tool's input parameters
    fn input_schema(&self) -> JsonValue;

    /// Execute the tool with the given input
    async fn execute(&self, input: JsonValue) -> Result<ToolResult>;
}
