//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub authorization: AuthorizationConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
    /// Origins allowed to call the API from a browser
    ///
    /// `*` allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Socket address string to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Root-author authorization configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationConfig {
    /// Handles (user@host) whose threads may be served
    ///
    /// Empty means every thread is served.
    #[serde(default)]
    pub allowed_root_accounts: Vec<String>,
    /// Maximum number of cached decisions (default: 1024)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            allowed_root_accounts: Vec::new(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> u64 {
    1024
}

/// Settings for requests sent to remote Mastodon servers
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Upper bound on pages followed for favourited-by/boosted-by (default: 100)
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// User-Agent header sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_pages() -> usize {
    100
}

fn default_user_agent() -> String {
    format!("retoots/{}", env!("CARGO_PKG_VERSION"))
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (RETOOTS__*), lists comma-separated
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.allowed_origins", vec!["http://localhost:8000"])?
            .set_default("authorization.allowed_root_accounts", Vec::<String>::new())?
            .set_default("authorization.cache_capacity", 1024)?
            .set_default("upstream.timeout_seconds", 30)?
            .set_default("upstream.max_pages", 100)?
            .set_default("upstream.user_agent", default_user_agent())?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("RETOOTS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .with_list_parse_key("authorization.allowed_root_accounts")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.authorization.cache_capacity == 0 {
            return Err(crate::error::AppError::Config(
                "authorization.cache_capacity must be greater than 0".to_string(),
            ));
        }

        if self.upstream.max_pages == 0 {
            return Err(crate::error::AppError::Config(
                "upstream.max_pages must be greater than 0".to_string(),
            ));
        }

        if self.upstream.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "upstream.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for account in &self.authorization.allowed_root_accounts {
            if !is_qualified_handle(account) {
                return Err(crate::error::AppError::Config(format!(
                    "authorization.allowed_root_accounts entry {account:?} must be in user@host form"
                )));
            }
        }

        if self.authorization.allowed_root_accounts.is_empty() {
            tracing::warn!("No allowed root accounts configured; every status will be served");
        }

        Ok(())
    }
}

fn is_qualified_handle(handle: &str) -> bool {
    match handle.split_once('@') {
        Some((user, host)) => !user.is_empty() && !host.is_empty() && !host.contains('@'),
        None => false,
    }
}
