//! Configuration validation.
//!
//! # Responsibilities
//! - Target host must be a bare authority (no scheme, path or whitespace)
//! - Output directory must be named
//! - Metrics address must parse when metrics are enabled
//! - Timeouts, when set, must be positive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatcherConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DispatcherConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream.target_host must be a host[:port], got {0:?}")]
    InvalidTargetHost(String),

    #[error("capture.output_dir must not be empty")]
    EmptyOutputDir,

    #[error("observability.metrics_address is not a socket address: {0:?}")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Check a configuration, collecting every problem.
pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let target = &config.upstream.target_host;
    if target.contains("://") || target.contains('/') || target.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidTargetHost(target.clone()));
    }

    if config.capture.output_dir.trim().is_empty() {
        errors.push(ValidationError::EmptyOutputDir);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.upstream.connect_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("upstream.connect_timeout_secs"));
    }
    if config.upstream.request_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("upstream.request_timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
