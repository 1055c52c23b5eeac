use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default Safe Browsing API server.
pub const DEFAULT_SERVER_URL: &str = "https://safebrowsing.googleapis.com";

/// Maximum number of URLs sent in a single threatMatches request.
pub const DEFAULT_BATCH_SIZE: usize = 20_000;

/// Retry policy parameters (optional section in config.toml).
///
/// Without this section lookups are attempted exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per batch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Settings rejected before any lookup is dispatched.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
    #[error("max_concurrent_lookups must be at least 1")]
    ZeroConcurrency,
    #[error("request_timeout_secs must be at least 1")]
    ZeroTimeout,
}

/// Global configuration loaded from `~/.config/sblookup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Base URL of the threatMatches API server; the path is fixed.
    pub server_url: String,
    /// API key appended as the `key` query parameter.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Maximum number of URLs per lookup request.
    pub batch_size: usize,
    /// Maximum number of lookup requests in flight at once.
    pub max_concurrent_lookups: usize,
    /// Deadline for a single lookup request, in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout for a single lookup request, in seconds.
    pub connect_timeout_secs: u64,
    /// Client identity sent with every request.
    pub client_id: String,
    pub client_version: String,
    /// Optional retry policy; if missing, failed batches are not retried.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_lookups: 4,
            request_timeout_secs: 30,
            connect_timeout_secs: 15,
            client_id: "NSRG".to_string(),
            client_version: "1.0".to_string(),
            retry: None,
        }
    }
}

impl LookupConfig {
    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_concurrent_lookups == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Retry policy in effect: the `[retry]` section, or a single attempt.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_else(RetryPolicy::no_retry)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("sblookup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LookupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LookupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_from(path: &Path) -> Result<LookupConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: LookupConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}
