//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the clinic gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeouts for outbound calls.
    pub timeouts: TimeoutConfig,

    /// Per-action request admission.
    pub rate_limit: RateLimitConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// External authentication service.
    pub auth: AuthConfig,

    /// Outbound confirmation email.
    pub mail: MailConfig,

    /// Data store settings.
    pub store: StoreConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Data store call timeout in seconds.
    pub store_secs: u64,

    /// Auth service request timeout in seconds.
    pub auth_secs: u64,

    /// Mail provider request timeout in seconds.
    pub mail_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_secs: 5,
            auth_secs: 10,
            mail_secs: 10,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable admission checks.
    pub enabled: bool,

    /// Window length shared by every action, in seconds.
    pub window_secs: u64,

    /// Overrides of the built-in per-action limits.
    pub limits: HashMap<String, u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            limits: HashMap::new(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// External authentication service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL; login is posted to `{base_url}/login`.
    pub base_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4000/auth".to_string(),
        }
    }
}

/// Mail delivery backend.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Write messages to the log only.
    #[default]
    Log,
    /// Post messages to an HTTP transactional-mail endpoint.
    Http,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    pub provider: MailProvider,

    /// Provider endpoint (required for `http`).
    pub endpoint: String,

    /// Bearer key for the provider.
    pub api_key: String,

    /// Sender address.
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Log,
            endpoint: String::new(),
            api_key: String::new(),
            from: "appointments@clinic.local".to_string(),
        }
    }
}

/// Data store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON seed file for the in-memory store.
    pub seed_path: Option<String>,
}
