//! OAuth credentials for the Google Calendar API
//!
//! Two local files are involved:
//!
//! - the client secret (`credentials.json`) downloaded from the Google
//!   Cloud Console, with an `installed` or `web` section
//! - the token file (`token.json`) holding the access and refresh
//!   token; written by [`authorize`] and rewritten on every refresh
//!
//! The token file layout is compatible with the one written by Google's
//! own client libraries, so an existing `token.json` can be reused.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use chrono::{DateTime, Utc};
use gcal_core::GoogleConfig;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use crate::error::{CalendarError, Result};

/// Scopes requested by the authorization flow
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/calendar.freebusy",
];

/// Refresh this long before the recorded expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// How long the callback server may keep serving after the redirect
const CALLBACK_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Persisted OAuth token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Access token
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields written by other tools, preserved on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StoredToken {
    /// Read a token file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Credentials(format!(
                "cannot read token file {}: {} (run `gcal-gateway --auth` first)",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            CalendarError::Credentials(format!("invalid token file {}: {}", path.display(), e))
        })
    }

    /// Write the token file
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Whether the access token must be refreshed at `now`
    ///
    /// A token without a recorded expiry is treated as valid.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - chrono::Duration::seconds(EXPIRY_MARGIN_SECS) <= now,
            None => false,
        }
    }
}

/// OAuth client identity from the client secret file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Read `credentials.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Credentials(format!(
                "cannot read client secret file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(content)?;
        file.installed.or(file.web).ok_or_else(|| {
            CalendarError::Credentials(
                "client secret file has neither an 'installed' nor a 'web' section".to_string(),
            )
        })
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + chrono::Duration::seconds(self.expires_in.unwrap_or(3600))
    }
}

/// Hands out a valid access token, refreshing and persisting it as needed
#[derive(Clone)]
pub struct TokenManager {
    token: Arc<Mutex<StoredToken>>,
    path: PathBuf,
    token_uri: String,
    client_secret: Option<ClientSecret>,
    http: Client,
}

impl TokenManager {
    /// Load the token file named in `config`
    ///
    /// Fails with [`CalendarError::Credentials`] when the token file is
    /// absent or unreadable, so the process stops before serving.
    pub fn load(config: &GoogleConfig) -> Result<Self> {
        let path = PathBuf::from(&config.token_path);
        let token = StoredToken::from_file(&path)?;

        let secret_path = Path::new(&config.credentials_path);
        let client_secret = if secret_path.exists() {
            Some(ClientSecret::from_file(secret_path)?)
        } else {
            debug!("No client secret file at {}", secret_path.display());
            None
        };

        let token_uri = token
            .token_uri
            .clone()
            .unwrap_or_else(|| config.token_uri.clone());

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!("Loaded OAuth token from {}", path.display());
        Ok(Self::new(token, path, token_uri, client_secret, http))
    }

    pub fn new(
        token: StoredToken,
        path: PathBuf,
        token_uri: impl Into<String>,
        client_secret: Option<ClientSecret>,
        http: Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            path,
            token_uri: token_uri.into(),
            client_secret,
            http,
        }
    }

    /// Current access token, refreshed first if it is about to expire
    pub async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;

        if token.needs_refresh(Utc::now()) {
            self.refresh(&mut token).await?;
        }

        Ok(token.token.clone())
    }

    async fn refresh(&self, token: &mut StoredToken) -> Result<()> {
        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            CalendarError::Authentication(
                "access token expired and no refresh token is stored".to_string(),
            )
        })?;

        let (client_id, client_secret) = self.client_credentials(token)?;

        debug!("Refreshing OAuth access token");
        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(&self.token_uri).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(CalendarError::Authentication(format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let fresh: TokenResponse = response.json().await?;
        token.expiry = Some(fresh.expiry(Utc::now()));
        token.token = fresh.access_token;
        if let Some(rotated) = fresh.refresh_token {
            token.refresh_token = Some(rotated);
        }

        info!("OAuth access token refreshed");
        if let Err(e) = token.save(&self.path).await {
            // The refreshed token is still usable in memory
            warn!("Failed to persist refreshed token to {}: {}", self.path.display(), e);
        }

        Ok(())
    }

    fn client_credentials(&self, token: &StoredToken) -> Result<(String, String)> {
        if let (Some(id), Some(secret)) = (&token.client_id, &token.client_secret) {
            return Ok((id.clone(), secret.clone()));
        }
        self.client_secret
            .as_ref()
            .map(|s| (s.client_id.clone(), s.client_secret.clone()))
            .ok_or_else(|| {
                CalendarError::Authentication(
                    "no OAuth client id/secret available for token refresh".to_string(),
                )
            })
    }
}

// ============================================================================
// Installed-app authorization flow
// ============================================================================

/// Consent URL for the installed-app loopback flow
pub fn authorization_url(secret: &ClientSecret, redirect_uri: &str, state: &str) -> Result<Url> {
    let scope = SCOPES.join(" ");
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| CalendarError::Configuration(format!("invalid auth_uri: {}", e)))
}

/// Extract the authorization code from the redirect's query parameters
pub fn callback_code(params: &HashMap<String, String>, expected_state: &str) -> Result<String> {
    if let Some(error) = params.get("error") {
        return Err(CalendarError::Authentication(format!(
            "authorization denied: {}",
            error
        )));
    }

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(CalendarError::Authentication(
            "state mismatch in authorization callback".to_string(),
        ));
    }

    params.get("code").cloned().ok_or_else(|| {
        CalendarError::Authentication("no authorization code found in callback".to_string())
    })
}

/// Redirect handler state; the sender is taken by the first real redirect
#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    sender: Arc<Mutex<Option<oneshot::Sender<Result<String>>>>>,
}

async fn handle_callback(
    State(callback): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    // プリコネクトやリロードなど code/error を持たないリクエストは無視する
    if !params.contains_key("code") && !params.contains_key("error") {
        return (StatusCode::NOT_FOUND, "Waiting for the authorization redirect.");
    }

    let outcome = callback_code(&params, &callback.expected_state);
    let body = match &outcome {
        Ok(_) => "Authorization successful! You can close this window.",
        Err(_) => "Authorization failed. Check the terminal for details.",
    };

    match callback.sender.lock().await.take() {
        Some(sender) => {
            let _ = sender.send(outcome);
        }
        None => debug!("Ignoring repeated authorization callback"),
    }

    (StatusCode::OK, body)
}

/// Run the installed-app flow and write the token file
///
/// Prints the consent URL, waits for the redirect on
/// `127.0.0.1:<auth_port>`, exchanges the code and saves the result to
/// `token_path`.
pub async fn authorize(config: &GoogleConfig) -> Result<StoredToken> {
    let listener = TcpListener::bind(("127.0.0.1", config.auth_port)).await?;

    authorize_on(config, listener, |auth_url, redirect_uri| {
        println!("Open this URL in a browser to authorize Google Calendar access:");
        println!();
        println!("  {}", auth_url);
        println!();
        println!("Waiting for authorization callback on {} ...", redirect_uri);
    })
    .await
}

/// [`authorize`] on an already bound listener
///
/// `show_consent` receives the consent URL and the redirect URI.
pub async fn authorize_on(
    config: &GoogleConfig,
    listener: TcpListener,
    show_consent: impl FnOnce(&Url, &str),
) -> Result<StoredToken> {
    let secret = ClientSecret::from_file(Path::new(&config.credentials_path))?;
    let token_uri = secret
        .token_uri
        .clone()
        .unwrap_or_else(|| config.token_uri.clone());

    let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = authorization_url(&secret, &redirect_uri, &state)?;

    let (code_tx, code_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let app = Router::new()
        .route("/", get(handle_callback))
        .with_state(CallbackState {
            expected_state: Arc::from(state.as_str()),
            sender: Arc::new(Mutex::new(Some(code_tx))),
        });

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
            })
            .await
    });

    show_consent(&auth_url, &redirect_uri);

    let outcome = code_rx.await.map_err(|_| {
        CalendarError::Authentication(
            "callback server stopped before the redirect arrived".to_string(),
        )
    });

    let _ = stop_tx.send(());
    match tokio::time::timeout(CALLBACK_SHUTDOWN_GRACE, server).await {
        Ok(Ok(Err(e))) => warn!("Authorization callback server error: {}", e),
        Ok(Err(e)) => warn!("Authorization callback server task failed: {}", e),
        Err(_) => debug!("Callback server still had open connections at shutdown"),
        Ok(Ok(Ok(()))) => {}
    }

    let code = outcome??;

    let http = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    let params = [
        ("client_id", secret.client_id.as_str()),
        ("client_secret", secret.client_secret.as_str()),
        ("code", code.as_str()),
        ("redirect_uri", redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];
    let response = http.post(&token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(CalendarError::Authentication(format!(
            "Failed to get token: HTTP {} - {}",
            status, error_text
        )));
    }

    let granted: TokenResponse = response.json().await?;
    let scopes = granted
        .scope
        .as_deref()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_else(|| SCOPES.iter().map(|s| s.to_string()).collect());

    let token = StoredToken {
        expiry: Some(granted.expiry(Utc::now())),
        token: granted.access_token,
        refresh_token: granted.refresh_token,
        token_uri: Some(token_uri),
        client_id: Some(secret.client_id),
        client_secret: Some(secret.client_secret),
        scopes,
        extra: serde_json::Map::new(),
    };

    let path = PathBuf::from(&config.token_path);
    token.save(&path).await?;
    info!("Token saved to {}", path.display());

    Ok(token)
}
