//! Centralized configuration management for tablekit

use std::time::Duration;
use anyhow::{Result, Context};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote API
    pub api_url: String,
    /// Address shown in the generic "something went wrong" flash
    pub contact_email: String,
    /// Default page size for list controllers
    pub per_page: u32,
    /// Loader and flash timing
    pub timing: TimingConfig,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Timers used by the loading indicator and the flash queue
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// How long a request must stay pending before the loader shows (milliseconds)
    pub loader_grace_ms: u64,
    /// Lifetime of a non-persistent flash message (milliseconds)
    pub flash_remove_delay_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            loader_grace_ms: 200,
            flash_remove_delay_ms: 10_000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "tablekit/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            contact_email: "support@example.com".to_string(),
            per_page: 25,
            timing: TimingConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let api_url = std::env::var("TABLEKIT_API_URL").unwrap_or(defaults.api_url);
        let contact_email =
            std::env::var("TABLEKIT_CONTACT_EMAIL").unwrap_or(defaults.contact_email);

        let timing = TimingConfig {
            loader_grace_ms: parse_env_var("TABLEKIT_LOADER_GRACE_MS")?
                .unwrap_or(defaults.timing.loader_grace_ms),
            flash_remove_delay_ms: parse_env_var("TABLEKIT_FLASH_REMOVE_DELAY_MS")?
                .unwrap_or(defaults.timing.flash_remove_delay_ms),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("TABLEKIT_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("TABLEKIT_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            api_url,
            contact_email,
            per_page: parse_env_var("TABLEKIT_PER_PAGE")?.unwrap_or(defaults.per_page),
            timing,
            http,
        })
    }

    /// Get loader grace period as Duration
    pub fn loader_grace(&self) -> Duration {
        Duration::from_millis(self.timing.loader_grace_ms)
    }

    /// Get flash lifetime as Duration
    pub fn flash_remove_delay(&self) -> Duration {
        Duration::from_millis(self.timing.flash_remove_delay_ms)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "API URL must start with http:// or https://: {}",
                self.api_url
            ));
        }

        if self.per_page == 0 {
            return Err(anyhow::anyhow!("Page size must be greater than zero"));
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
