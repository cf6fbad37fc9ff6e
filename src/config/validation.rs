//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field, message: &str| {
        errors.push(ValidationError {
            field,
            message: message.to_string(),
        })
    };

    if config.mapping.path.as_os_str().is_empty() {
        fail("mapping.path", "must not be empty");
    } else if config.mapping.path.file_name().is_none() {
        fail("mapping.path", "must name a file");
    }
    if config.mapping.history_limit == 0 {
        fail("mapping.history_limit", "must keep at least one version");
    }

    if config.admin.bind_address.parse::<SocketAddr>().is_err() {
        fail("admin.bind_address", "is not a socket address");
    }
    if config.admin.user.is_empty() {
        fail("admin.user", "must not be empty");
    }
    if config.admin.request_timeout_secs == 0 {
        fail("admin.request_timeout_secs", "must be greater than zero");
    }
    if config.admin.max_body_bytes == 0 {
        fail("admin.max_body_bytes", "must be greater than zero");
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        fail("observability.metrics_address", "is not a socket address");
    }
    if config.watcher.enabled && config.watcher.poll_interval_secs == 0 {
        fail("watcher.poll_interval_secs", "must be greater than zero");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
