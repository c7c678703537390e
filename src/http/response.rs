//! Response envelope and error mapping.
//!
//! Every route answers with the same JSON shape:
//! `{ "success": bool, "data"?: ..., "message"?: "..." }`.
//! Status codes are limited to 200, 400, 404, 429 and 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::input::Rejection;
use crate::observability::metrics;
use crate::resilience::Elapsed;
use crate::store::StoreError;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const INTERNAL_FALLBACK: &str = "Internal server error";

/// Uniform wire shape for every route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Successful reply carrying a payload.
#[derive(Debug)]
pub struct ApiResponse<T> {
    data: T,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { data, message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(Envelope::success(self.data, self.message))).into_response()
    }
}

/// Every way a route can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    RateLimited(String),
    #[error(transparent)]
    Validation(#[from] Rejection),
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A business rule refused an otherwise well-formed request.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn rate_limited() -> Self {
        Self::RateLimited(RATE_LIMITED_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::RateLimited(_) => "rate_limited",
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Message shown to the caller.
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            INTERNAL_FALLBACK.to_string()
        } else {
            message
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::record_error(self.kind());
        match &self {
            ApiError::Internal(message) => tracing::error!(error = %message, "Request failed"),
            other => tracing::debug!(status = status.as_u16(), reason = %other, "Request refused"),
        }
        (status, Json(Envelope::<()>::failure(self.message()))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => ApiError::NotFound(entity),
            StoreError::AlreadyCancelled => ApiError::BadRequest(err.to_string()),
            StoreError::Rejected(reason) => ApiError::BadRequest(reason),
            StoreError::Backend(_) => {
                metrics::record_upstream_error("store");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Rejected(reason) => ApiError::BadRequest(reason),
            other => {
                metrics::record_upstream_error("auth");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<Elapsed> for ApiError {
    fn from(err: Elapsed) -> Self {
        metrics::record_upstream_error(err.operation);
        ApiError::Internal(err.to_string())
    }
}
