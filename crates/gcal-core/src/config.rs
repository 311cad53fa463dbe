//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. gcal-gateway.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// デフォルトの設定ファイル名
pub const DEFAULT_CONFIG_FILE: &str = "gcal-gateway.toml";

/// Google Calendar API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client secret file (downloaded from Google Cloud Console)
    pub credentials_path: String,

    /// OAuth token file (access + refresh token)
    pub token_path: String,

    /// Calendar to operate on
    pub calendar_id: String,

    /// Timezone annotation attached to created events
    pub timezone: String,

    /// Calendar API base URL
    pub api_base_url: String,

    /// OAuth token endpoint
    pub token_uri: String,

    /// Loopback port used by the authorization flow
    pub auth_port: u16,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
            calendar_id: default_calendar_id(),
            timezone: default_timezone(),
            api_base_url: default_api_base_url(),
            token_uri: default_token_uri(),
            auth_port: default_auth_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// Port for HTTP API server
    pub port: u16,

    /// Bearer key for HTTP API authentication (disabled when None)
    pub key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            key: None,
        }
    }
}

/// Bridge configuration (MCP stdio → HTTP API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the HTTP API the bridge forwards to
    pub api_url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: default_bridge_api_url(),
        }
    }
}

/// Main configuration for gcal-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Google Calendar configuration
    #[serde(default)]
    pub google: GoogleConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Bridge configuration
    #[serde(default)]
    pub bridge: BridgeConfig,
}

fn default_credentials_path() -> String {
    "credentials.json".to_string()
}

fn default_token_path() -> String {
    "token.json".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_auth_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_bridge_api_url() -> String {
    "http://localhost:8000".to_string()
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;

        // 既存の環境変数で上書き（環境変数が優先）
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// TOML 文字列をパースする（環境変数は展開するが上書きはしない）
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        let toml: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Ok(Self::from_toml_config(toml))
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// `./gcal-gateway.toml` があればそれを使い、
    /// 見つからない場合は環境変数のみで構築します。
    pub fn load() -> crate::Result<Self> {
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            tracing::debug!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        let google = toml.google.unwrap_or_default();
        let google_config = GoogleConfig {
            credentials_path: google
                .credentials_path
                .unwrap_or_else(default_credentials_path),
            token_path: google.token_path.unwrap_or_else(default_token_path),
            calendar_id: google.calendar_id.unwrap_or_else(default_calendar_id),
            timezone: google.timezone.unwrap_or_else(default_timezone),
            api_base_url: google.api_base_url.unwrap_or_else(default_api_base_url),
            token_uri: google.token_uri.unwrap_or_else(default_token_uri),
            auth_port: google.auth_port.unwrap_or_else(default_auth_port),
            request_timeout_secs: google
                .request_timeout_secs
                .unwrap_or_else(default_request_timeout_secs),
        };

        let api = toml.api.unwrap_or_default();
        let api_config = ApiConfig {
            host: api.host.unwrap_or_else(default_api_host),
            port: api.port.unwrap_or_else(default_api_port),
            key: api.key.filter(|k| !k.is_empty()),
        };

        let bridge = toml.bridge.unwrap_or_default();
        let bridge_config = BridgeConfig {
            api_url: bridge.api_url.unwrap_or_else(default_bridge_api_url),
        };

        Config {
            google: google_config,
            api: api_config,
            bridge: bridge_config,
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        // Google 設定の上書き
        if let Some(path) = non_empty_env("GOOGLE_CREDENTIALS_PATH") {
            self.google.credentials_path = path;
        }
        if let Some(path) = non_empty_env("GOOGLE_TOKEN_PATH") {
            self.google.token_path = path;
        }
        if let Some(id) = non_empty_env("GCAL_CALENDAR_ID") {
            self.google.calendar_id = id;
        }
        if let Some(tz) = non_empty_env("GCAL_TIMEZONE") {
            self.google.timezone = tz;
        }
        if let Some(url) = non_empty_env("GOOGLE_API_BASE_URL") {
            self.google.api_base_url = url;
        }
        if let Some(port) = non_empty_env("GOOGLE_AUTH_PORT") {
            if let Ok(p) = port.parse() {
                self.google.auth_port = p;
            }
        }

        // API 設定の上書き
        if let Some(host) = non_empty_env("API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = non_empty_env("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Some(key) = non_empty_env("API_KEY") {
            self.api.key = Some(key);
        }

        // Bridge 設定の上書き
        if let Some(url) = non_empty_env("BRIDGE_API_URL") {
            self.bridge.api_url = url;
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    /// Google 設定
    google: Option<TomlGoogleConfig>,
    /// HTTP API 設定
    api: Option<TomlApiConfig>,
    /// ブリッジ設定
    bridge: Option<TomlBridgeConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlGoogleConfig {
    #[serde(default)]
    credentials_path: Option<String>,
    #[serde(default)]
    token_path: Option<String>,
    #[serde(default)]
    calendar_id: Option<String>,
    /// タイムゾーン (例: "Asia/Tokyo")
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    api_base_url: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    auth_port: Option<u16>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    host: Option<String>,
    /// ポート番号
    #[serde(default)]
    port: Option<u16>,
    /// API キー (オプション)
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlBridgeConfig {
    #[serde(default)]
    api_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_config_default() {
        let config = GoogleConfig::default();
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.timezone, "Asia/Tokyo");
        assert_eq!(config.token_path, "token.json");
        assert_eq!(config.credentials_path, "credentials.json");
        assert_eq!(config.api_base_url, "https://www.googleapis.com/calendar/v3");
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.key.is_none());
    }

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000");
    }

    #[test]
    fn test_from_toml_str_partial() {
        let cfg = Config::from_toml_str(
            r#"
[google]
timezone = "Europe/Helsinki"

[api]
port = 9100
key = ""
"#,
        )
        .unwrap();

        assert_eq!(cfg.google.timezone, "Europe/Helsinki");
        assert_eq!(cfg.google.calendar_id, "primary");
        assert_eq!(cfg.api.port, 9100);
        // 空のキーは無効扱い
        assert!(cfg.api.key.is_none());
        assert_eq!(cfg.bridge.api_url, "http://localhost:8000");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = Config::from_toml_str("[api]\nport = \"not a number\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcal-gateway.toml");
        std::fs::write(&path, "[google]\ntoken_path = \"secrets/token.json\"\n").unwrap();

        let cfg = Config::from_toml_file(&path).unwrap();
        // GOOGLE_TOKEN_PATH が設定されていればそちらが優先される
        if std::env::var("GOOGLE_TOKEN_PATH").is_err() {
            assert_eq!(cfg.google.token_path, "secrets/token.json");
        }
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("GCAL_GATEWAY_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${GCAL_GATEWAY_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // 存在しない環境変数
        let result = Config::expand_env_vars("prefix_${GCAL_GATEWAY_NONEXISTENT}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("GCAL_GATEWAY_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here $HOME");
        assert_eq!(result, "no_vars_here $HOME");
    }

    #[test]
    fn test_expand_env_vars_empty_name() {
        let result = Config::expand_env_vars("${}_content");
        assert_eq!(result, "_content");
    }
}
