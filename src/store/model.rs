//! Records exchanged with the data store.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub hospital_id: Uuid,
    /// Consultation fee in minor currency units.
    pub fee: u32,
}

/// Doctor search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub hospital: String,
}

/// Doctor with hospital and upcoming sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub hospital: Hospital,
    pub sessions: Vec<Session>,
}

/// Case-insensitive substring filters. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorFilter {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub hospital: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub capacity: u32,
    #[serde(default)]
    pub booked: u32,
    /// Appointment number currently being seen; 0 before the session starts.
    #[serde(default)]
    pub current_number: u32,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub session_id: Uuid,
    pub appointment_number: u32,
    pub patient_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub nic: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub session_id: Uuid,
    pub patient_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub nic: Option<String>,
}

/// A booked appointment together with everything the confirmation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub appointment: Appointment,
    pub session: Session,
    pub doctor: Doctor,
    pub hospital: Hospital,
}

/// Queue position for one booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningNumber {
    pub appointment_id: Uuid,
    pub appointment_number: u32,
    pub current_number: u32,
    pub patients_ahead: u32,
    pub doctor: String,
    pub hospital: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub phone: String,
    pub doctor_id: Uuid,
    pub issued_on: NaiveDate,
    pub diagnosis: String,
    #[serde(default)]
    pub medications: Vec<String>,
    pub notes: Option<String>,
}

/// Patients still to be seen before `number`.
pub fn patients_ahead(number: u32, current: u32) -> u32 {
    number.saturating_sub(current).saturating_sub(1)
}
