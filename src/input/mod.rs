//! Input validation.
//!
//! # Data Flow
//! ```text
//! Query string / JSON body
//!     → serde_json::Value (query pairs become a flat object)
//!     → schema.rs (ordered fields, ordered steps, first failure wins)
//!     → Validated (normalized strings) or Rejection (message shown to user)
//! ```
//!
//! # Design Decisions
//! - No reflection: every schema is an explicit ordered list
//! - Transforms are pure; they never see other fields
//! - Rejection messages are user-facing, so their order is part of the API

pub mod rules;
pub mod schema;

use serde_json::{Map, Value};

pub use schema::{Field, Rejection, Schema, Validated};

/// Decode a raw query string into a flat JSON object of strings.
///
/// The first occurrence of a repeated key wins.
pub fn query_to_value(raw: Option<&str>) -> Value {
    let mut object = Map::new();
    for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        object
            .entry(key.into_owned())
            .or_insert_with(|| Value::String(value.into_owned()));
    }
    Value::Object(object)
}

/// Parse a request body as JSON. An empty body is an empty object.
pub fn body_to_value(body: &[u8]) -> Result<Value, Rejection> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|_| Rejection::new("body", "Request body must be valid JSON"))
}
