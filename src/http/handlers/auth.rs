use axum::{body::Body, extract::State, http::HeaderMap};
use serde_json::Value;

use crate::http::request::read_json;
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::input::{rules, Field, Schema};
use crate::resilience::with_timeout;

pub const ACTION: &str = "login";

fn schema() -> Schema {
    Schema::new()
        .field(
            Field::required("email", "Email is required")
                .transform(rules::trim)
                .check(rules::is_email, "Invalid email address"),
        )
        .field(Field::required("password", "Password is required"))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<ApiResponse<Value>, ApiError> {
    state.admit(ACTION, &headers)?;
    let raw = read_json(body, state.max_body_size).await?;
    let input = schema().validate(&raw)?;
    let email = input.require("email")?;
    let password = input.require("password")?;

    let deadline = std::time::Duration::from_secs(state.timeouts.auth_secs);
    let session = with_timeout("auth", deadline, state.auth.login(email, password)).await??;
    tracing::info!("Login succeeded");
    Ok(ApiResponse::ok(session).with_message("Login successful"))
}
