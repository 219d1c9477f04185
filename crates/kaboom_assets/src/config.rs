//! Loader tuning, read from a JSON file with every field optional.
//!
//! ```json
//! {
//!   "asset_origin": "http://localhost:3000/",
//!   "fetch_timeout_ms": 5000,
//!   "fetch_retries": 2,
//!   "critical_deadline_ms": 8000,
//!   "batch_sizes": { "critical": 6, "high": 3, "medium": 3, "low": 2 }
//! }
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use kaboom_core::LoadPriority;
use url::Url;

use crate::fetch::FetchPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub asset_origin: String,
    pub fetch_timeout_ms: u64,
    pub fetch_retries: u32,
    pub retry_backoff_ms: u64,
    /// Hard wall-clock budget for the critical phase.
    pub critical_deadline_ms: u64,
    /// Leading frames per critical animation fetched before gameplay starts.
    pub critical_frame_limit: u32,
    pub batch_sizes: BatchSizes,
    /// Extra pause after the cooperative yield between batches.
    pub batch_pause_ms: u64,
    pub sprite_size: u32,
    /// Start the background pass as soon as the critical phase returns.
    pub auto_background: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_origin: "http://localhost:3000/".to_string(),
            fetch_timeout_ms: 5000,
            fetch_retries: 2,
            retry_backoff_ms: 100,
            critical_deadline_ms: 8000,
            critical_frame_limit: 1,
            batch_sizes: BatchSizes::default(),
            batch_pause_ms: 25,
            sprite_size: 64,
            auto_background: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSizes {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self {
            critical: LoadPriority::Critical.default_batch_size(),
            high: LoadPriority::High.default_batch_size(),
            medium: LoadPriority::Medium.default_batch_size(),
            low: LoadPriority::Low.default_batch_size(),
        }
    }
}

impl BatchSizes {
    pub fn for_priority(&self, priority: LoadPriority) -> usize {
        match priority {
            LoadPriority::Critical => self.critical,
            LoadPriority::High => self.high,
            LoadPriority::Medium => self.medium,
            LoadPriority::Low => self.low,
        }
    }
}

impl LoaderConfig {
    pub fn origin(&self) -> Result<Url, String> {
        Url::parse(&self.asset_origin)
            .map_err(|e| format!("Invalid asset_origin '{}': {e}", self.asset_origin))
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_millis(self.fetch_timeout_ms),
            retries: self.fetch_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn critical_deadline(&self) -> Duration {
        Duration::from_millis(self.critical_deadline_ms)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<LoaderConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read loader config {}: {e}", path.display()))?;
    let config: LoaderConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse loader config {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &LoaderConfig) -> Result<(), String> {
    config.origin()?;
    if config.fetch_timeout_ms == 0 {
        return Err("Config validation failed: fetch_timeout_ms must be > 0".to_string());
    }
    if config.critical_deadline_ms == 0 {
        return Err("Config validation failed: critical_deadline_ms must be > 0".to_string());
    }
    if config.critical_frame_limit == 0 {
        return Err("Config validation failed: critical_frame_limit must be > 0".to_string());
    }
    for &tier in LoadPriority::ALL {
        if config.batch_sizes.for_priority(tier) == 0 {
            return Err(format!(
                "Config validation failed: batch size for '{}' must be > 0",
                tier
            ));
        }
    }
    // sprite_size is checked by Synthesizer::new.
    Ok(())
}
