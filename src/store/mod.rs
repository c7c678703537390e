//! Data-access boundary.
//!
//! # Data Flow
//! ```text
//! Handler (validated input)
//!     → Store trait (async, object safe)
//!     → MemoryStore in development and tests
//!     → a relational backend in deployment
//! ```
//!
//! # Design Decisions
//! - Business refusals (already cancelled, session full) are distinct
//!   variants so handlers can pick a status code
//! - Backend failures carry only a message; they always map to 500

pub mod memory;
pub mod model;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

pub use memory::{MemoryStore, Seed};
pub use model::{
    Appointment, AppointmentStatus, Booking, Doctor, DoctorFilter, DoctorListing, DoctorProfile,
    Hospital, NewAppointment, Prescription, RunningNumber, Session,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("Appointment is already cancelled")]
    AlreadyCancelled,
    #[error("{0}")]
    Rejected(String),
    #[error("store error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn search_doctors(&self, filter: &DoctorFilter) -> Result<Vec<DoctorListing>, StoreError>;

    async fn doctor(&self, id: Uuid) -> Result<DoctorProfile, StoreError>;

    async fn sessions_for_doctor(
        &self,
        doctor_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Session>, StoreError>;

    /// Reserve the next appointment number in a session.
    async fn book_appointment(&self, request: NewAppointment) -> Result<Booking, StoreError>;

    async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, StoreError>;

    /// Booked appointments for a phone number, soonest first.
    async fn running_numbers(&self, phone: &str) -> Result<Vec<RunningNumber>, StoreError>;

    /// Prescriptions for a phone number, newest first.
    async fn health_records(&self, phone: &str) -> Result<Vec<Prescription>, StoreError>;
}
