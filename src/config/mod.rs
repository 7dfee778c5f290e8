//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    default_config_toml, expand_path, load_config, load_or_default, parse_config,
    resolve_config_path, Config, ConfigError, LoggingSection, OutputSection, CONFIG_PATH_ENV,
};
