//! MCP server
//!
//! [`ToolManager`] に登録されたツールを rmcp の `ServerHandler` として公開します。

use std::sync::Arc;

use rmcp::{
    ErrorData, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool as McpTool,
    },
    service::RequestContext,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use gcal_core::{ToolDefinition, ToolManager};

/// Server name reported during the MCP handshake
pub const SERVER_NAME: &str = "google-calendar";

/// rmcp handler over a set of registered tools
#[derive(Clone)]
pub struct CalendarMcpServer {
    tools: Arc<ToolManager>,
}

impl CalendarMcpServer {
    pub fn new(tools: ToolManager) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }

    fn to_mcp_tool(definition: ToolDefinition) -> McpTool {
        let schema = match definition.input_schema {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        McpTool::new(definition.name, definition.description, Arc::new(schema))
    }
}

impl ServerHandler for CalendarMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info.instructions = Some(
            "Google Calendar tools. Check a slot with check_free_time before proposing it; \
             create_event refuses occupied slots. Times are ISO 8601 (2025-01-15T14:00:00)."
                .to_string(),
        );
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self
            .tools
            .definitions()
            .into_iter()
            .map(Self::to_mcp_tool)
            .collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let name = request.name.to_string();
        if !self.tools.contains(&name) {
            warn!("Unknown tool requested: {}", name);
            return Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            ));
        }

        let input = Value::Object(request.arguments.unwrap_or_default());
        debug!(tool = %name, "Calling tool");

        match self.tools.execute(&name, input).await {
            Ok(result) if result.is_error => {
                Ok(CallToolResult::error(vec![Content::text(result.output)]))
            }
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(result.output)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "❌ Error: {}",
                e
            ))])),
        }
    }
}

/// Serve `tools` over stdin/stdout until the client disconnects
pub async fn serve_stdio(tools: ToolManager) -> anyhow::Result<()> {
    info!("Starting Google Calendar MCP server ({} tools)", tools.len());

    let service = CalendarMcpServer::new(tools)
        .serve(rmcp::transport::stdio())
        .await?;
    let reason = service.waiting().await?;

    info!("MCP server stopped: {:?}", reason);
    Ok(())
}
