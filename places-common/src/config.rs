//! Configuration loading and API key resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every field is optional;
//! a missing file logs a warning and falls back to built-in defaults.
//!
//! # Config File Priority
//! 1. Explicit path (command-line `--config`)
//! 2. `PLACES_CONFIG` environment variable
//! 3. `<config dir>/places-autocomplete/config.toml`
//! 4. Built-in defaults (no file)
//!
//! # API Key Priority
//! Command line → `PLACES_API_KEY` environment variable → TOML `api_key`

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an alternate config file
pub const CONFIG_ENV_VAR: &str = "PLACES_CONFIG";

/// Environment variable holding the place-search API key
pub const API_KEY_ENV_VAR: &str = "PLACES_API_KEY";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Place-search API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override for the remote service base URL
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout applied by the HTTP transport (milliseconds)
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Search option overrides
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[search]` section: raw search option values, validated by the client crate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    pub min_length: Option<usize>,
    pub debounce_ms: Option<u64>,
    pub leading: Option<bool>,
    pub trailing: Option<bool>,
    pub max_wait_ms: Option<u64>,
    pub language: Option<String>,
    /// One of `address`, `geocode`, `cities`, `establishment`, `combined`
    pub query_types: Option<String>,
    pub components: Option<String>,
    pub radius: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub strict_bounds: Option<bool>,
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Default config file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("places-autocomplete").join("config.toml"))
}

/// Resolve which config file to read, if any
///
/// An explicit path is returned as-is (even when missing, so the caller can report it).
/// Environment and default locations are only returned when the file exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        warn!("{} points to missing file {}", CONFIG_ENV_VAR, path.display());
    }

    default_config_path().filter(|p| p.exists())
}

/// Load configuration following the priority order
///
/// A missing explicit file is an error; otherwise absence of a file yields defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = TomlConfig::load(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the API key from command line, environment, then TOML
pub fn resolve_api_key(cli_key: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV_VAR).ok();

    let candidates = [
        ("command line", cli_key.map(str::to_string)),
        ("environment", env_key),
        ("TOML", toml_config.api_key.clone()),
    ];

    let valid: Vec<(&str, String)> = candidates
        .into_iter()
        .filter_map(|(source, key)| key.filter(|k| is_valid_key(k)).map(|k| (source, k)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(s, _)| *s).collect();
        warn!(
            "API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match valid.into_iter().next() {
        Some((source, key)) => {
            info!("API key loaded from {}", source);
            Ok(key)
        }
        None => Err(Error::Config(format!(
            "API key not configured. Provide one of:\n\
             1. Command line: --api-key <key>\n\
             2. Environment: {}=<key>\n\
             3. TOML config: api_key = \"<key>\"",
            API_KEY_ENV_VAR
        ))),
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
