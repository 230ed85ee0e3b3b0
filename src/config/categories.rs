//! Global category configuration loading from config.toml
//!
//! This module provides functionality to load the global categories from a TOML
//! configuration file. The categories defined in config.toml are used to seed the
//! database on first run, and their default percentages form the allocation set of
//! budgets created without explicit categories.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// List of global categories to seed
    pub categories: Vec<CategoryConfig>,
}

/// Configuration for a single global category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Name of the category
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional icon key
    #[serde(default)]
    pub icon: Option<String>,
    /// Default share of a budget (0-100)
    pub default_percentage: Decimal,
}

/// Loads category configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads category configuration from `CONFIG_PATH`, or ./config.toml when unset
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
