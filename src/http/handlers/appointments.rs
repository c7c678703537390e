use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::HeaderMap,
};
use serde_json::json;
use uuid::Uuid;

use crate::http::request::{path_segment, read_json};
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::input::{rules, Field, Schema};
use crate::mail::booking_confirmation;
use crate::resilience::with_timeout;
use crate::store::{Appointment, Booking, NewAppointment};

pub const BOOK_ACTION: &str = "book_appointment";
pub const CANCEL_ACTION: &str = "cancel_appointment";

fn book_schema() -> Schema {
    Schema::new()
        .field(rules::uuid("session_id", "Session id"))
        .field(
            Field::required("patient_name", "Patient name is required")
                .transform(rules::trim)
                .check(|s| !s.is_empty(), "Patient name is required")
                .check(rules::max_len(100), "Patient name must be at most 100 characters"),
        )
        .field(rules::phone("phone"))
        .field(
            Field::optional("email")
                .transform(rules::trim)
                .check(|s| s.is_empty() || rules::is_email(s), "Invalid email address"),
        )
        .field(
            Field::optional("nic")
                .transform(rules::strip_whitespace)
                .check(rules::max_len(12), "NIC must be at most 12 characters"),
        )
}

/// `POST /api/appointments`
pub async fn book(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<ApiResponse<Booking>, ApiError> {
    state.admit(BOOK_ACTION, &headers)?;
    let raw = read_json(body, state.max_body_size).await?;
    let mut input = book_schema().validate(&raw)?;

    let request = NewAppointment {
        session_id: input.value("session_id")?,
        patient_name: input.require("patient_name")?.to_string(),
        phone: input.require("phone")?.to_string(),
        email: input.take("email").filter(|s| !s.is_empty()),
        nic: input.take("nic").filter(|s| !s.is_empty()),
    };

    let booking = state.store_call(state.store.book_appointment(request)).await?;
    tracing::info!(
        appointment_id = %booking.appointment.id,
        session_id = %booking.session.id,
        number = booking.appointment.appointment_number,
        "Appointment booked"
    );

    let mut message = format!(
        "Appointment #{} booked",
        booking.appointment.appointment_number
    );
    if let Some(email) = booking_confirmation(&booking) {
        let deadline = std::time::Duration::from_secs(state.timeouts.mail_secs);
        match with_timeout("mail", deadline, state.mailer.send(&email)).await {
            Ok(Ok(())) => message.push_str("; confirmation email sent"),
            Ok(Err(e)) => {
                tracing::warn!(appointment_id = %booking.appointment.id, error = %e, "Confirmation email failed");
                message.push_str("; confirmation email could not be sent");
            }
            Err(e) => {
                tracing::warn!(appointment_id = %booking.appointment.id, error = %e, "Confirmation email timed out");
                message.push_str("; confirmation email could not be sent");
            }
        }
    }

    Ok(ApiResponse::ok(booking).with_message(message))
}

/// `POST /api/appointments/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<String>, PathRejection>,
) -> Result<ApiResponse<Appointment>, ApiError> {
    state.admit(CANCEL_ACTION, &headers)?;
    let id = path_segment(id, "Appointment id")?;
    let input = Schema::new()
        .field(rules::uuid("id", "Appointment id"))
        .validate(&json!({ "id": id }))?;
    let id: Uuid = input.value("id")?;

    let appointment = state.store_call(state.store.cancel_appointment(id)).await?;
    tracing::info!(appointment_id = %appointment.id, "Appointment cancelled");
    Ok(ApiResponse::ok(appointment).with_message("Appointment cancelled"))
}
