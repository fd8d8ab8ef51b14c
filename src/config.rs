//! Centralized configuration management for rosecandle

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

pub const DEFAULT_API_BASE: &str = "https://rose-candle-co.onrender.com";
pub const DEFAULT_RECOVERY_BASE: &str = "https://rose-candle-co-1.onrender.com";
pub const DEFAULT_PAGE_SIZE: usize = 13;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API (without the `/api` suffix)
    pub api_base: String,
    /// Base URL of the password recovery service
    pub recovery_base: String,
    /// Number of items shown per list page
    pub page_size: usize,
    /// File where the signed-in session is persisted
    pub session_path: PathBuf,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "rosecandle/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            recovery_base: DEFAULT_RECOVERY_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            session_path: PathBuf::from("./.rosecandle-session.json"),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let api_base = std::env::var("ROSECANDLE_API_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);

        let recovery_base = std::env::var("ROSECANDLE_RECOVERY_BASE")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.recovery_base);

        let session_path = std::env::var("ROSECANDLE_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);

        let http = HttpConfig {
            timeout_seconds: parse_env_var("ROSECANDLE_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("ROSECANDLE_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            api_base,
            recovery_base,
            page_size: parse_env_var("ROSECANDLE_PAGE_SIZE")?.unwrap_or(defaults.page_size),
            session_path,
            http,
        })
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(anyhow::anyhow!("Page size must be at least 1"));
        }

        for (name, url) in [("API base", &self.api_base), ("Recovery base", &self.recovery_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow::anyhow!("{} must be an http(s) URL: {}", name, url));
            }
        }

        if let Some(parent) = self.session_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Session directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
