//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Require secrets for the features that use them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use chrono::FixedOffset;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if !config.server.webhook_path.starts_with('/') {
        errors.push(ValidationError::new("server.webhook_path", "must start with '/'"));
    }
    if config.server.webhook_path.starts_with("/admin") {
        errors.push(ValidationError::new(
            "server.webhook_path",
            "must not live under /admin",
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be > 0"));
    }

    if config.database.url.is_empty() {
        errors.push(ValidationError::new(
            "database.url",
            "not set (config file or DATABASE_URL)",
        ));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new("database.max_connections", "must be > 0"));
    }

    if config.telegram.timeout_secs == 0 {
        errors.push(ValidationError::new("telegram.timeout_secs", "must be > 0"));
    }
    // The confirmation is sent after the profile is committed, inside the
    // request. It must give up before the request times out.
    if config.server.request_timeout_secs > 0
        && config.telegram.timeout_secs >= config.server.request_timeout_secs
    {
        errors.push(ValidationError::new(
            "telegram.timeout_secs",
            format!(
                "must be below server.request_timeout_secs ({})",
                config.server.request_timeout_secs
            ),
        ));
    }

    if FixedOffset::east_opt(config.schedule.utc_offset_minutes.saturating_mul(60)).is_none() {
        errors.push(ValidationError::new(
            "schedule.utc_offset_minutes",
            "must be within ±24h",
        ));
    }

    if config.processor.max_update_attempts == 0 {
        errors.push(ValidationError::new("processor.max_update_attempts", "must be > 0"));
    }

    if config.funnel.enabled && config.funnel.beginner_levels.is_empty() {
        errors.push(ValidationError::new(
            "funnel.beginner_levels",
            "at least one level required when funnel logging is enabled",
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "required when admin routes are enabled (config file or ADMIN_API_KEY)",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
