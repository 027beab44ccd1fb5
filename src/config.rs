//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub photos: PhotosConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the record store and the photo bucket live
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("showroom").to_string_lossy().to_string())
        .unwrap_or_else(|| "./showroom_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL clients use to reach this server; embedded in photo URLs
    #[serde(default = "default_public_url")]
    pub public_url: String,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_public_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Photo gallery limits
#[derive(Debug, Clone, Deserialize)]
pub struct PhotosConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_max_photos")]
    pub max_photos: usize,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

fn default_bucket() -> String {
    "car-photos".to_string()
}

fn default_max_photos() -> usize {
    10
}

fn default_max_file_size() -> usize {
    5 * 1024 * 1024 // 5 MB
}

fn default_allowed_types() -> Vec<String> {
    ["image/jpeg", "image/jpg", "image/png", "image/webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            max_photos: default_max_photos(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

/// Inventory sync (webhook agent) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Outbound webhook the Sync Function forwards to (`WEBHOOK_AGENT_URL`)
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Remote Sync Function endpoint. When unset the car form calls the
    /// in-process forwarder instead.
    #[serde(default)]
    pub function_url: Option<String>,

    #[serde(default = "default_sync_timeout")]
    pub timeout_ms: u64,
}

fn default_sync_timeout() -> u64 {
    10_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            function_url: None,
            timeout_ms: default_sync_timeout(),
        }
    }
}

/// Session guard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_enabled")]
    pub enabled: bool,

    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,

    #[serde(default)]
    pub operators: Vec<OperatorConfig>,
}

fn default_auth_enabled() -> bool {
    true
}

fn default_session_ttl() -> i64 {
    12
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_auth_enabled(),
            session_ttl_hours: default_session_ttl(),
            operators: Vec::new(),
        }
    }
}

/// A back-office operator allowed to open sessions
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OperatorConfig {
    pub email: String,
    pub access_key: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("showroom").join("config.toml")),
            Some(PathBuf::from("/etc/showroom/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the process environment in production)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(data_dir) = lookup("SHOWROOM_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Some(host) = lookup("SHOWROOM_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SHOWROOM_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Some(url) = lookup("SHOWROOM_PUBLIC_URL") {
            self.api.public_url = url;
        }

        if let Some(url) = lookup("WEBHOOK_AGENT_URL") {
            self.sync.webhook_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(url) = lookup("SHOWROOM_SYNC_FUNCTION_URL") {
            self.sync.function_url = Some(url).filter(|u| !u.trim().is_empty());
        }

        if let (Some(email), Some(access_key)) = (
            lookup("SHOWROOM_OPERATOR_EMAIL"),
            lookup("SHOWROOM_OPERATOR_KEY"),
        ) {
            let operator = OperatorConfig { email, access_key };
            if !self.auth.operators.contains(&operator) {
                self.auth.operators.push(operator);
            }
        }

        if let Some(level) = lookup("SHOWROOM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SHOWROOM_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Showroom Configuration
#
# Environment variables override these settings:
# - SHOWROOM_DATA_DIR
# - SHOWROOM_API_HOST
# - SHOWROOM_API_PORT
# - SHOWROOM_PUBLIC_URL
# - WEBHOOK_AGENT_URL
# - SHOWROOM_SYNC_FUNCTION_URL
# - SHOWROOM_OPERATOR_EMAIL / SHOWROOM_OPERATOR_KEY
# - SHOWROOM_LOG_LEVEL
# - SHOWROOM_LOG_FORMAT

[storage]
# Directory holding showroom.db and the photo buckets
data_dir = "~/.local/share/showroom"

[api]
host = "0.0.0.0"
port = 8082

# Base URL embedded in public photo URLs
public_url = "http://localhost:8082"

cors_origins = []
request_timeout_secs = 30

[photos]
bucket = "car-photos"

# Maximum photos per gallery (external and internal are separate galleries)
max_photos = 10

# Maximum size per photo (bytes)
max_file_size = 5242880

allowed_types = ["image/jpeg", "image/jpg", "image/png", "image/webp"]

[sync]
# Webhook the inventory agent listens on
# webhook_url = "https://agent.example.com/webhook"

# Remote sync function; unset means the in-process forwarder is used
# function_url = "https://functions.example.com/functions/v1/sync-agent"

timeout_ms = 10000

[auth]
# Require a session on /api/v1 routes
enabled = true
session_ttl_hours = 12

# [[auth.operators]]
# email = "gerente@concessionaria.com"
# access_key = "change-me"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.photos.bucket, "car-photos");
        assert_eq!(config.photos.max_photos, 10);
        assert_eq!(config.photos.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.photos.allowed_types.len(), 4);
        assert!(config.sync.webhook_url.is_none());
        assert!(config.auth.enabled);
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.photos.max_photos, 10);
        assert!(config.auth.operators.is_empty());
    }

    #[test]
    fn test_parse_operators() {
        let config = Config::parse(
            r#"
            [auth]
            enabled = true

            [[auth.operators]]
            email = "ana@loja.com"
            access_key = "k1"
            "#,
        )
        .unwrap();
        assert_eq!(config.auth.operators.len(), 1);
        assert_eq!(config.auth.operators[0].email, "ana@loja.com");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SHOWROOM_API_PORT", "9000"),
            ("WEBHOOK_AGENT_URL", "http://agent.local/hook"),
            ("SHOWROOM_OPERATOR_EMAIL", "ana@loja.com"),
            ("SHOWROOM_OPERATOR_KEY", "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api.port, 9000);
        assert_eq!(
            config.sync.webhook_url.as_deref(),
            Some("http://agent.local/hook")
        );
        assert_eq!(config.auth.operators.len(), 1);
    }

    #[test]
    fn test_blank_webhook_is_unset() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "WEBHOOK_AGENT_URL").then(|| "  ".to_string()));
        assert!(config.sync.webhook_url.is_none());
    }
}
