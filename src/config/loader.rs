//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::DispatcherConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<DispatcherConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Build the effective configuration.
///
/// Starts from the file when one is given (defaults otherwise), lets
/// `overlay` apply command-line values, then validates the result.
pub fn load_config<F>(path: Option<&Path>, overlay: F) -> Result<DispatcherConfig, ConfigError>
where
    F: FnOnce(&mut DispatcherConfig),
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => DispatcherConfig::default(),
    };
    overlay(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
