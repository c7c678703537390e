use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
};
use chrono::NaiveDate;

use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::input::{query_to_value, rules, Field, Schema};
use crate::store::Session;

pub const ACTION: &str = "sessions";

fn schema() -> Schema {
    Schema::new()
        .field(rules::uuid("doctor_id", "Doctor id"))
        .field(
            Field::optional("date")
                .transform(rules::trim)
                .check(rules::is_date, "Date must be in YYYY-MM-DD format"),
        )
}

/// `GET /api/sessions?doctor_id=...&date=YYYY-MM-DD`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<Session>>, ApiError> {
    state.admit(ACTION, &headers)?;
    let input = schema().validate(&query_to_value(query.as_deref()))?;
    let doctor_id = input.value("doctor_id")?;
    let date: Option<NaiveDate> = input.parse("date")?;

    let sessions = state
        .store_call(state.store.sessions_for_doctor(doctor_id, date))
        .await?;
    Ok(ApiResponse::ok(sessions))
}
