//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check endpoint paths are absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },

    #[error("{field} must start with '/', got '{value}'")]
    RelativePath { field: &'static str, value: String },

    #[error("peer #{index} has invalid port 0")]
    PeerPort { index: usize },

    #[error("peer #{index} has an empty ip")]
    PeerIp { index: usize },

    #[error("invalid {field} '{value}', expected one of: {allowed}")]
    NotOneOf {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nethash.is_empty() {
        errors.push(ValidationError::Empty("nethash"));
    }

    if config.identity.version.is_empty() {
        errors.push(ValidationError::Empty("identity.version"));
    }
    if config.identity.port == 0 {
        errors.push(ValidationError::Zero { field: "identity.port" });
    }

    if config.peers.options.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "peers.options.timeout_ms" });
    }
    for (index, peer) in config.peers.list.iter().enumerate() {
        if peer.ip.trim().is_empty() {
            errors.push(ValidationError::PeerIp { index });
        }
        if peer.port == 0 {
            errors.push(ValidationError::PeerPort { index });
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "health_check.interval_secs" });
    }
    for (field, value) in [
        ("health_check.height_path", &config.health_check.height_path),
        ("health_check.public_api_path", &config.health_check.public_api_path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    let levels = ["trace", "debug", "info", "warn", "error"];
    if !levels.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::NotOneOf {
            field: "observability.log_level",
            value: config.observability.log_level.clone(),
            allowed: "trace, debug, info, warn, error",
        });
    }
    if !["console", "json"].contains(&config.observability.log_format.as_str()) {
        errors.push(ValidationError::NotOneOf {
            field: "observability.log_format",
            value: config.observability.log_format.clone(),
            allowed: "console, json",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
