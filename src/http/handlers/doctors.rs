use axum::{
    extract::{rejection::PathRejection, Path, RawQuery, State},
    http::HeaderMap,
};
use serde_json::json;
use uuid::Uuid;

use crate::http::request::path_segment;
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::input::{query_to_value, rules, Field, Schema};
use crate::store::{DoctorFilter, DoctorListing, DoctorProfile};

pub const SEARCH_ACTION: &str = "doctor_search";
pub const DETAIL_ACTION: &str = "doctor_detail";

const MAX_FILTER_LEN: usize = 100;

fn filter(name: &str) -> Field {
    Field::optional(name)
        .transform(rules::trim)
        .check(
            rules::max_len(MAX_FILTER_LEN),
            format!("{name} must be at most {MAX_FILTER_LEN} characters"),
        )
}

fn search_schema() -> Schema {
    Schema::new()
        .field(filter("name"))
        .field(filter("specialization"))
        .field(filter("hospital"))
}

/// `GET /api/doctors?name=&specialization=&hospital=`
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<DoctorListing>>, ApiError> {
    state.admit(SEARCH_ACTION, &headers)?;
    let mut input = search_schema().validate(&query_to_value(query.as_deref()))?;

    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let filter = DoctorFilter {
        name: non_empty(input.take("name")),
        specialization: non_empty(input.take("specialization")),
        hospital: non_empty(input.take("hospital")),
    };

    let doctors = state.store_call(state.store.search_doctors(&filter)).await?;
    Ok(ApiResponse::ok(doctors))
}

/// `GET /api/doctors/{id}`
pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse<DoctorProfile>, ApiError> {
    state.admit(DETAIL_ACTION, &headers)?;
    let id = path_segment(id, "Doctor id")?;
    let input = Schema::new()
        .field(rules::uuid("id", "Doctor id"))
        .validate(&json!({ "id": id }))?;
    let id: Uuid = input.value("id")?;

    let profile = state.store_call(state.store.doctor(id)).await?;
    Ok(ApiResponse::ok(profile))
}
