use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
};

use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::input::{query_to_value, rules, Schema};
use crate::store::Prescription;

pub const ACTION: &str = "health_records";

/// `GET /api/health-records?phone=...`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<Prescription>>, ApiError> {
    state.admit(ACTION, &headers)?;
    let input = Schema::new()
        .field(rules::phone("phone"))
        .validate(&query_to_value(query.as_deref()))?;
    let phone = input.require("phone")?;

    let records = state.store_call(state.store.health_records(phone)).await?;
    Ok(ApiResponse::ok(records))
}
