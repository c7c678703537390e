//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported, not
//! just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, MailProvider};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
    }
    for (action, limit) in &config.rate_limit.limits {
        if *limit == 0 {
            errors.push(ValidationError::new(
                format!("rate_limit.limits.{action}"),
                "must be greater than 0",
            ));
        }
    }

    for (field, secs) in [
        ("timeouts.store_secs", config.timeouts.store_secs),
        ("timeouts.auth_secs", config.timeouts.auth_secs),
        ("timeouts.mail_secs", config.timeouts.mail_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if Url::parse(&config.auth.base_url).is_err() {
        errors.push(ValidationError::new(
            "auth.base_url",
            format!("not a URL: {}", config.auth.base_url),
        ));
    }

    if config.mail.provider == MailProvider::Http && Url::parse(&config.mail.endpoint).is_err() {
        errors.push(ValidationError::new(
            "mail.endpoint",
            "a valid URL is required for the http provider",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
