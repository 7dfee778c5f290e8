//! Configuration Loader
//!
//! Loads and validates the TOML configuration. Every section is optional:
//! a missing section falls back to its defaults, so an empty file is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::strategy::params::{AnalysisParams, ParamsError};

/// Environment variable naming the default config file
pub const CONFIG_PATH_ENV: &str = "DEALER_EDGE_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisParams,
    pub logging: LoggingSection,
    pub output: OutputSection,
}

/// Logging configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error" (default: "warn")
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "warn".to_string() }
    }
}

/// Report output section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Pretty-print the JSON report (default: false)
    pub pretty: bool,
    /// Write the report to this file instead of stdout; `~` is expanded
    pub path: Option<String>,
}

impl OutputSection {
    /// Output path with `~` expanded
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.as_deref().map(expand_path)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to render TOML: {0}")]
    RenderError(#[from] toml::ser::Error),
    #[error("Validation failed: {0}")]
    ValidationError(#[from] ParamsError),
    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Pick the config file: explicit argument first, then `DEALER_EDGE_CONFIG`
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .filter(|p| !p.trim().is_empty())
        .map(|p| expand_path(&p))
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let config = parse_config(&content)?;
    tracing::debug!("Loaded config from {}", path.as_ref().display());
    Ok(config)
}

/// Load the resolved config file, or defaults when none is configured
pub fn load_or_default(explicit: Option<&str>) -> Result<Config, ConfigError> {
    match resolve_config_path(explicit) {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

/// Parse and validate configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Default configuration rendered as TOML
pub fn default_config_toml() -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(&Config::default())?)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        Ok(())
    }
}
