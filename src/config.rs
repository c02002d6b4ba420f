//! Engine connection configuration.
//!
//! Resolution order: explicit `--config` file, the per-user config file when
//! present, then built-in defaults. `NORMFLOW_ENGINE_URL` and `--engine-url`
//! override the base URL afterwards, in that order.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `engine.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const ENGINE_URL_ENV: &str = "NORMFLOW_ENGINE_URL";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5002";
const DEFAULT_EXECUTE_PATH: &str = "/run_etl";
const DEFAULT_UPLOAD_PATH: &str = "/upload_csv";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub schema_version: u32,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_execute_path")]
    pub execute_path: String,
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_execute_path() -> String {
    DEFAULT_EXECUTE_PATH.to_string()
}

fn default_upload_path() -> String {
    DEFAULT_UPLOAD_PATH.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

pub fn default_config() -> EngineConfig {
    EngineConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        base_url: default_base_url(),
        execute_path: default_execute_path(),
        upload_path: default_upload_path(),
        timeout_ms: default_timeout_ms(),
    }
}

/// Per-user config location (`<config dir>/normflow/engine.json`).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("normflow").join("engine.json"))
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: EngineConfig =
        serde_json::from_slice(&bytes).context("parse engine config JSON")?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported engine config schema_version {}",
            config.schema_version
        ));
    }
    let base_url = config.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(anyhow!(
            "base_url must be an http(s) URL (got {:?})",
            config.base_url
        ));
    }
    for (label, path) in [
        ("execute_path", &config.execute_path),
        ("upload_path", &config.upload_path),
    ] {
        if !path.starts_with('/') {
            return Err(anyhow!("{label} must start with '/' (got {path:?})"));
        }
    }
    if config.timeout_ms == 0 {
        return Err(anyhow!("timeout_ms must be greater than zero"));
    }
    Ok(())
}

/// Resolve the effective config: explicit file > user file > defaults, then
/// env var > explicit URL for the base URL.
pub fn resolve_config(
    explicit_path: Option<&Path>,
    explicit_url: Option<&str>,
) -> Result<EngineConfig> {
    let env_url = env::var(ENGINE_URL_ENV).ok();
    resolve_config_with(
        explicit_path,
        user_config_path().as_deref(),
        env_url.as_deref(),
        explicit_url,
    )
}

fn resolve_config_with(
    explicit_path: Option<&Path>,
    user_path: Option<&Path>,
    env_url: Option<&str>,
    explicit_url: Option<&str>,
) -> Result<EngineConfig> {
    let mut config = match (explicit_path, user_path) {
        (Some(path), _) => load_config(path)?,
        (None, Some(path)) if path.is_file() => load_config(path)?,
        _ => default_config(),
    };
    if let Some(url) = env_url.filter(|url| !url.trim().is_empty()) {
        config.base_url = url.trim().to_string();
    }
    if let Some(url) = explicit_url {
        config.base_url = url.trim().to_string();
    }
    validate_config(&config)?;
    tracing::debug!(
        base_url = %config.base_url,
        timeout_ms = config.timeout_ms,
        "engine config resolved"
    );
    Ok(config)
}
