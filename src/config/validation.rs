//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject empty path entries
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("proxy.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("rewrite.rule_files[{0}] is empty")]
    EmptyRuleFile(usize),

    #[error("fixtures.data_paths[{0}] is empty")]
    EmptyDataPath(usize),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.proxy.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    for (i, file) in config.rewrite.rule_files.iter().enumerate() {
        if file.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyRuleFile(i));
        }
    }

    for (i, dir) in config.fixtures.data_paths.iter().enumerate() {
        if dir.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyDataPath(i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
