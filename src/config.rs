//! Project configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; the user's file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [publish]
//! api_url = "https://neocities.org/api"  # Remote host API base URL
//! remote_root = ""                       # Remote directory mirroring the output dir ("" = site root)
//! upload_timeout_secs = 60               # Per-upload timeout; expiry fails that file only
//!
//! [processing]
//! max_processes = 4         # Max parallel recipe parsers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! The API key is not part of the config file. It is read from the file given
//! to `publish --api-key-file` by [`read_api_key`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Cannot read API key file {path}: {source}")]
    MissingCredential { path: PathBuf, source: io::Error },
    #[error("API key file {0} is empty")]
    EmptyCredential(PathBuf),
}

/// Project configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Remote host settings used by `publish`.
    pub publish: PublishConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish.upload_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "publish.upload_timeout_secs must be greater than 0".into(),
            ));
        }
        if !(self.publish.api_url.starts_with("https://")
            || self.publish.api_url.starts_with("http://"))
        {
            return Err(ConfigError::Validation(
                "publish.api_url must be an http(s) URL".into(),
            ));
        }
        if self.publish.remote_root.split('/').any(|part| part == "..") {
            return Err(ConfigError::Validation(
                "publish.remote_root must not contain '..'".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Remote host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Base URL of the host's API.
    pub api_url: String,
    /// Remote directory that mirrors the local output directory.
    pub remote_root: String,
    /// Timeout for a single upload request, in seconds.
    pub upload_timeout_secs: u64,
}

impl PublishConfig {
    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            api_url: crate::remote::DEFAULT_API_URL.to_string(),
            remote_root: String::new(),
            upload_timeout_secs: 60,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel recipe parsing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults if it is absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Read the API key: the first line of `path`, trimmed.
pub fn read_api_key(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::MissingCredential {
        path: path.to_path_buf(),
        source,
    })?;
    let key = content.lines().next().unwrap_or("").trim();
    if key.is_empty() {
        return Err(ConfigError::EmptyCredential(path.to_path_buf()));
    }
    Ok(key.to_string())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Recipe Site Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Publishing
# ---------------------------------------------------------------------------
[publish]
# Base URL of the Neocities API.
api_url = "https://neocities.org/api"

# Remote directory that mirrors the local output directory.
# "" publishes to the site root.
remote_root = ""

# Timeout for a single upload, in seconds. A file whose upload times out is
# reported as failed; the remaining files are still uploaded.
upload_timeout_secs = 60

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel recipe parsers. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
