//! Request plumbing shared by every route.
//!
//! # Responsibilities
//! - Request ID generation and propagation (`x-request-id`, UUID v4)
//! - Per-request tracing span carrying the request ID
//! - Per-route request metrics
//! - Bounded body reads

use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, MatchedPath, Path, Request},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::Span;

use crate::http::response::ApiError;
use crate::input::{body_to_value, Rejection};
use crate::observability::metrics;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Span for one HTTP request, tagged with its request ID.
pub fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Record count and latency for the matched route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&route, &method, response.status().as_u16(), start);
    response
}

/// Read at most `limit` bytes and parse them as JSON.
pub async fn read_json(body: Body, limit: usize) -> Result<Value, ApiError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| Rejection::new("body", "Request body is too large or unreadable"))?;
    Ok(body_to_value(&bytes)?)
}

/// Unwrap a single path segment, turning an undecodable one into a validation failure.
pub fn path_segment(
    segment: Result<Path<String>, PathRejection>,
    label: &str,
) -> Result<String, ApiError> {
    match segment {
        Ok(Path(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Path segment rejected");
            Err(Rejection::new("id", format!("{label} must be a valid id")).into())
        }
    }
}
