//! Sync Configuration
//!
//! Timing and endpoint settings, loaded from JSON or environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Environment variable prefix for `SyncConfig::from_env`
pub const ENV_PREFIX: &str = "REORDER_SYNC_";

/// Sync configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Collection endpoint, e.g. `http://localhost:3000/api/todo`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Delay between a drop and the commit of its new order
    #[serde(default = "default_commit_deferral_ms")]
    pub commit_deferral_ms: u64,
    /// Gap between list items, presentation only
    #[serde(default = "default_item_gap_px")]
    pub item_gap_px: u32,
    /// Artificial latency before content updates. Pure reorder writes never wait.
    #[serde(default)]
    pub update_delay_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_endpoint() -> String {
    "/api/todo".to_string()
}

fn default_commit_deferral_ms() -> u64 {
    600
}

fn default_item_gap_px() -> u32 {
    6
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            commit_deferral_ms: default_commit_deferral_ms(),
            item_gap_px: default_item_gap_px(),
            update_delay_ms: 0,
            log_level: default_log_level(),
        }
    }
}

impl SyncConfig {
    /// Defaults overlaid with `REORDER_SYNC_*` environment variables
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(endpoint) = var("ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(raw) = var("COMMIT_DEFERRAL_MS") {
            config.commit_deferral_ms = parse_number("COMMIT_DEFERRAL_MS", &raw)?;
        }
        if let Some(raw) = var("ITEM_GAP_PX") {
            config.item_gap_px = parse_number("ITEM_GAP_PX", &raw)?;
        }
        if let Some(raw) = var("UPDATE_DELAY_MS") {
            config.update_delay_ms = parse_number("UPDATE_DELAY_MS", &raw)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.log_level = level;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SyncError::InvalidInput(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SyncResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(SyncError::InvalidInput("endpoint must not be empty".to_string()));
        }
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| SyncError::InvalidInput(format!("unknown log level {}", self.log_level)))?;
        Ok(())
    }

    pub fn commit_deferral(&self) -> Duration {
        Duration::from_millis(self.commit_deferral_ms)
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.update_delay_ms)
    }

    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> SyncResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| SyncError::InvalidInput(format!("{}{} is not a number: {}", ENV_PREFIX, name, raw)))
}
