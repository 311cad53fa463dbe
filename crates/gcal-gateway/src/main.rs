//! gcal-gateway: Google Calendar MCP Gateway
//!
//! Main entry point for the gcal-gateway application.
//!
//! Usage:
//!   gcal-gateway             - MCP server on stdio (Google API direct)
//!   gcal-gateway --api       - HTTP API server
//!   gcal-gateway --bridge    - MCP server on stdio, forwarding to the HTTP API
//!   gcal-gateway --auth      - Authorize with Google and write the token file
//!   gcal-gateway --help      - Show help

use std::sync::Arc;

use anyhow::Context;
use gcal_api::ApiClient;
use gcal_calendar::{CalendarService, EventService, GoogleCalendarClient, TokenManager};
use gcal_core::{Config, ToolManager};
use gcal_mcp::register_calendar_tools;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// MCP over stdio, backed by the Google Calendar API
    Mcp,
    /// HTTP API server
    Api,
    /// MCP over stdio, backed by the HTTP API
    Bridge,
    /// OAuth authorization flow
    Auth,
    /// Show help
    Help,
    /// Show version
    Version,
}

impl RunMode {
    /// stdout carries the MCP protocol in these modes
    fn speaks_stdio(self) -> bool {
        matches!(self, Self::Mcp | Self::Bridge)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1));

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("gcal-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Load .env file
    dotenvy::dotenv().ok();

    init_logging(mode);

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    match mode {
        RunMode::Mcp => run_mcp(&config).await,
        RunMode::Api => run_api(&config).await,
        RunMode::Bridge => run_bridge(&config).await,
        RunMode::Auth => run_auth(&config).await,
        RunMode::Help | RunMode::Version => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> RunMode {
    for arg in args {
        match arg.as_str() {
            "--mcp" => return RunMode::Mcp,
            "--api" | "-a" => return RunMode::Api,
            "--bridge" | "-b" => return RunMode::Bridge,
            "--auth" => return RunMode::Auth,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Mcp
}

/// Initialize logging
///
/// In the stdio modes logs go to stderr so stdout stays protocol-clean.
fn init_logging(mode: RunMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if mode.speaks_stdio() {
        builder.with_writer(std::io::stderr).with_ansi(false).init();
    } else {
        builder.init();
    }
}

/// Print help message
fn print_help() {
    println!("gcal-gateway - Google Calendar tools for MCP clients");
    println!();
    println!("Usage:");
    println!("  gcal-gateway [--mcp]   MCP server on stdio, calling Google Calendar directly");
    println!("  gcal-gateway --api     HTTP API server");
    println!("  gcal-gateway --bridge  MCP server on stdio, forwarding to the HTTP API");
    println!("  gcal-gateway --auth    Authorize with Google and save the token file");
    println!("  gcal-gateway --help    Show this help message");
    println!("  gcal-gateway --version Show version");
    println!();
    println!("Configuration is read from ./gcal-gateway.toml when present.");
    println!();
    println!("Environment Variables:");
    println!("  GOOGLE_CREDENTIALS_PATH  OAuth client secret file (default: credentials.json)");
    println!("  GOOGLE_TOKEN_PATH        OAuth token file (default: token.json)");
    println!("  GCAL_CALENDAR_ID         Calendar to use (default: primary)");
    println!("  GCAL_TIMEZONE            Timezone for created events (default: Asia/Tokyo)");
    println!("  GOOGLE_AUTH_PORT         Loopback port for --auth (default: 8080)");
    println!("  API_HOST                 HTTP API bind host (default: 127.0.0.1)");
    println!("  API_PORT                 HTTP API port (default: 8000)");
    println!("  API_KEY                  Bearer key for the HTTP API (optional)");
    println!("  BRIDGE_API_URL           HTTP API used by --bridge (default: http://localhost:8000)");
    println!("  RUST_LOG                 Log filter (default: info)");
}

/// Build the Google-backed event service
///
/// Fails before anything is served when the token file is missing.
fn calendar_service(config: &Config) -> anyhow::Result<Arc<dyn EventService>> {
    let tokens = TokenManager::load(&config.google).context("Failed to load Google credentials")?;
    let client = GoogleCalendarClient::new(&config.google, tokens)
        .context("Failed to create calendar client")?;

    tracing::info!(
        "Using calendar '{}' (timezone {})",
        config.google.calendar_id,
        config.google.timezone
    );
    Ok(Arc::new(CalendarService::new(
        Arc::new(client),
        config.google.timezone.clone(),
    )))
}

async fn serve_tools(service: Arc<dyn EventService>) -> anyhow::Result<()> {
    let mut tool_manager = ToolManager::new();
    register_calendar_tools(&mut tool_manager, service);

    tracing::info!(
        "Registered {} tools: {:?}",
        tool_manager.len(),
        tool_manager.tool_names()
    );

    gcal_mcp::serve_stdio(tool_manager).await
}

/// Run MCP mode
async fn run_mcp(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting gcal-gateway (MCP)...");
    let service = calendar_service(config)?;
    serve_tools(service).await
}

/// Run bridge mode
async fn run_bridge(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting gcal-gateway (bridge to {})...", config.bridge.api_url);
    let client = ApiClient::new(&config.bridge.api_url, config.api.key.clone())
        .context("Failed to create bridge client")?;
    serve_tools(Arc::new(client)).await
}

/// Run HTTP API mode until Ctrl+C
async fn run_api(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting gcal-gateway (HTTP API)...");
    let service = calendar_service(config)?;

    tracing::info!("Press Ctrl+C to exit");
    gcal_api::start_server(config.api.clone(), service, shutdown_signal()).await
}

/// Run the OAuth flow and write the token file
async fn run_auth(config: &Config) -> anyhow::Result<()> {
    let token = gcal_calendar::auth::authorize(&config.google)
        .await
        .context("Authorization failed")?;

    println!(
        "✅ Authorized. Token saved to {} (scopes: {})",
        config.google.token_path,
        token.scopes.join(" ")
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    tracing::info!("Shutting down...");
}
