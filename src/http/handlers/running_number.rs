use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
};

use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::input::{query_to_value, rules, Schema};
use crate::store::RunningNumber;

pub const ACTION: &str = "running_number";

fn schema() -> Schema {
    Schema::new().field(rules::phone("phone"))
}

/// `GET /api/running-number?phone=...`
pub async fn lookup(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<RunningNumber>>, ApiError> {
    state.admit(ACTION, &headers)?;
    let input = schema().validate(&query_to_value(query.as_deref()))?;
    let phone = input.require("phone")?;

    let numbers = state.store_call(state.store.running_numbers(phone)).await?;
    tracing::debug!(results = numbers.len(), "Running numbers looked up");
    Ok(ApiResponse::ok(numbers))
}
