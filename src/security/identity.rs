//! Caller identity and rate keys.
//!
//! Identity is only used to bucket request counts. It is taken from proxy
//! headers as-is and must never be used for authentication.

use std::fmt;

use axum::http::HeaderMap;

/// Identity used when no forwarding header is present.
pub const UNKNOWN_CALLER: &str = "unknown";

/// Derive the caller identity from forwarding headers.
///
/// First entry of `x-forwarded-for`, then `x-real-ip`, then `"unknown"`.
pub fn caller_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CALLER)
        .to_string()
}

/// Composite (action, caller) bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub action: &'static str,
    pub caller: String,
}

impl RateKey {
    pub fn new(action: &'static str, headers: &HeaderMap) -> Self {
        Self {
            action,
            caller: caller_identity(headers),
        }
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.caller)
    }
}
