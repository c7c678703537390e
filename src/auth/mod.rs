//! Client for the external authentication service.
//!
//! Token issuance lives upstream; this crate only forwards credentials and
//! relays the issued session.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::AuthConfig;

/// Message used when the service refuses without saying why.
pub const DEFAULT_REJECTION: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The service refused the credentials (4xx).
    #[error("{0}")]
    Rejected(String),
    /// The service failed (5xx).
    #[error("auth service returned status {0}")]
    Upstream(u16),
    #[error("auth service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    login_url: String,
}

impl AuthClient {
    pub fn new(config: &AuthConfig, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            login_url: format!("{}/login", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Exchange credentials for whatever session payload the service issues.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value, AuthError> {
        let response = self
            .client
            .post(&self.login_url)
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::Upstream(status.as_u16()));
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_client_error() {
            tracing::info!(status = status.as_u16(), "Login refused by auth service");
            return Err(AuthError::Rejected(upstream_message(&body)));
        }

        Ok(body.get("data").cloned().unwrap_or(body))
    }
}

/// Pull a human-readable reason out of an upstream error body.
fn upstream_message(body: &Value) -> String {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_REJECTION)
        .to_string()
}
