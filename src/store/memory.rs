//! In-process store seeded from JSON.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{
    patients_ahead, Appointment, AppointmentStatus, Booking, Doctor, DoctorFilter, DoctorListing,
    DoctorProfile, Hospital, NewAppointment, Prescription, RunningNumber, Session,
};
use super::{Store, StoreError};

/// Initial contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub hospitals: Vec<Hospital>,
    pub doctors: Vec<Doctor>,
    pub sessions: Vec<Session>,
    pub appointments: Vec<Appointment>,
    pub prescriptions: Vec<Prescription>,
}

impl Seed {
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let seed = serde_json::from_reader(reader)?;
        Ok(seed)
    }
}

#[derive(Default)]
struct Tables {
    hospitals: HashMap<Uuid, Hospital>,
    doctors: HashMap<Uuid, Doctor>,
    sessions: HashMap<Uuid, Session>,
    appointments: HashMap<Uuid, Appointment>,
    prescriptions: Vec<Prescription>,
}

impl Tables {
    fn hospital_of(&self, doctor: &Doctor) -> Result<&Hospital, StoreError> {
        self.hospitals
            .get(&doctor.hospital_id)
            .ok_or_else(|| StoreError::Backend(format!("doctor {} has no hospital", doctor.id)))
    }

    fn doctor_of(&self, session: &Session) -> Result<&Doctor, StoreError> {
        self.doctors
            .get(&session.doctor_id)
            .ok_or_else(|| StoreError::Backend(format!("session {} has no doctor", session.id)))
    }
}

/// Store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let tables = Tables {
            hospitals: seed.hospitals.into_iter().map(|h| (h.id, h)).collect(),
            doctors: seed.doctors.into_iter().map(|d| (d.id, d)).collect(),
            sessions: seed.sessions.into_iter().map(|s| (s.id, s)).collect(),
            appointments: seed.appointments.into_iter().map(|a| (a.id, a)).collect(),
            prescriptions: seed.prescriptions,
        };
        tracing::info!(
            hospitals = tables.hospitals.len(),
            doctors = tables.doctors.len(),
            sessions = tables.sessions.len(),
            "Memory store seeded"
        );
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Move a session's queue forward to `number`.
    pub async fn set_current_number(&self, session_id: Uuid, number: u32) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::NotFound { entity: "Session" })?;
        session.current_number = number;
        Ok(())
    }
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle {
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
        None => true,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn search_doctors(&self, filter: &DoctorFilter) -> Result<Vec<DoctorListing>, StoreError> {
        let tables = self.tables.read().await;
        let mut hits = Vec::new();
        for doctor in tables.doctors.values() {
            let hospital = tables.hospital_of(doctor)?;
            if contains(&doctor.name, &filter.name)
                && contains(&doctor.specialization, &filter.specialization)
                && contains(&hospital.name, &filter.hospital)
            {
                hits.push(DoctorListing {
                    id: doctor.id,
                    name: doctor.name.clone(),
                    specialization: doctor.specialization.clone(),
                    hospital: hospital.name.clone(),
                });
            }
        }
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }

    async fn doctor(&self, id: Uuid) -> Result<DoctorProfile, StoreError> {
        let tables = self.tables.read().await;
        let doctor = tables
            .doctors
            .get(&id)
            .ok_or(StoreError::NotFound { entity: "Doctor" })?;
        let hospital = tables.hospital_of(doctor)?.clone();
        let today = Utc::now().date_naive();
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.doctor_id == id && !s.cancelled && s.date >= today)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.start_time));

        Ok(DoctorProfile {
            doctor: doctor.clone(),
            hospital,
            sessions,
        })
    }

    async fn sessions_for_doctor(
        &self,
        doctor_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Session>, StoreError> {
        let tables = self.tables.read().await;
        if !tables.doctors.contains_key(&doctor_id) {
            return Err(StoreError::NotFound { entity: "Doctor" });
        }
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.doctor_id == doctor_id && date.map_or(true, |d| s.date == d))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.date, s.start_time));
        Ok(sessions)
    }

    async fn book_appointment(&self, request: NewAppointment) -> Result<Booking, StoreError> {
        let mut tables = self.tables.write().await;

        let session = tables
            .sessions
            .get(&request.session_id)
            .ok_or(StoreError::NotFound { entity: "Session" })?;
        if session.cancelled {
            return Err(StoreError::Rejected("Session is cancelled".into()));
        }
        if session.booked >= session.capacity {
            return Err(StoreError::Rejected("Session is full".into()));
        }
        // Resolve everything that can fail before touching state.
        let doctor = tables.doctor_of(session)?.clone();
        let hospital = tables.hospital_of(&doctor)?.clone();

        let session = match tables.sessions.get_mut(&request.session_id) {
            Some(session) => {
                session.booked += 1;
                session.clone()
            }
            None => return Err(StoreError::NotFound { entity: "Session" }),
        };

        let appointment = Appointment {
            id: Uuid::new_v4(),
            session_id: session.id,
            appointment_number: session.booked,
            patient_name: request.patient_name,
            phone: request.phone,
            email: request.email,
            nic: request.nic,
            status: AppointmentStatus::Booked,
            created_at: Utc::now(),
        };
        tables.appointments.insert(appointment.id, appointment.clone());

        Ok(Booking {
            appointment,
            session,
            doctor,
            hospital,
        })
    }

    async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;
        let appointment = tables
            .appointments
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Appointment" })?;
        match appointment.status {
            AppointmentStatus::Cancelled => Err(StoreError::AlreadyCancelled),
            AppointmentStatus::Completed => Err(StoreError::Rejected(
                "Completed appointments cannot be cancelled".into(),
            )),
            AppointmentStatus::Booked => {
                appointment.status = AppointmentStatus::Cancelled;
                Ok(appointment.clone())
            }
        }
    }

    async fn running_numbers(&self, phone: &str) -> Result<Vec<RunningNumber>, StoreError> {
        let tables = self.tables.read().await;
        let mut numbers = Vec::new();
        for appointment in tables
            .appointments
            .values()
            .filter(|a| a.phone == phone && a.status == AppointmentStatus::Booked)
        {
            let Some(session) = tables.sessions.get(&appointment.session_id) else {
                continue;
            };
            let doctor = tables.doctor_of(session)?;
            let hospital = tables.hospital_of(doctor)?;
            numbers.push(RunningNumber {
                appointment_id: appointment.id,
                appointment_number: appointment.appointment_number,
                current_number: session.current_number,
                patients_ahead: patients_ahead(appointment.appointment_number, session.current_number),
                doctor: doctor.name.clone(),
                hospital: hospital.name.clone(),
                date: session.date,
                start_time: session.start_time,
                status: appointment.status,
            });
        }
        numbers.sort_by_key(|n| (n.date, n.start_time, n.appointment_number));
        Ok(numbers)
    }

    async fn health_records(&self, phone: &str) -> Result<Vec<Prescription>, StoreError> {
        let tables = self.tables.read().await;
        let mut records: Vec<Prescription> = tables
            .prescriptions
            .iter()
            .filter(|p| p.phone == phone)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.issued_on.cmp(&a.issued_on));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};

    struct Fixture {
        store: MemoryStore,
        doctor: Uuid,
        session: Uuid,
    }

    fn fixture(capacity: u32) -> Fixture {
        let hospital = Hospital {
            id: Uuid::new_v4(),
            name: "Central Hospital".into(),
            city: "Colombo".into(),
        };
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Perera".into(),
            specialization: "Cardiology".into(),
            hospital_id: hospital.id,
            fee: 250_000,
        };
        let session = Session {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            date: Utc::now().date_naive() + Duration::days(1),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            capacity,
            booked: 0,
            current_number: 0,
            cancelled: false,
        };
        let ids = (doctor.id, session.id);
        let store = MemoryStore::from_seed(Seed {
            hospitals: vec![hospital],
            doctors: vec![doctor],
            sessions: vec![session],
            ..Seed::default()
        });
        Fixture {
            store,
            doctor: ids.0,
            session: ids.1,
        }
    }

    fn request(session_id: Uuid) -> NewAppointment {
        NewAppointment {
            session_id,
            patient_name: "Nimal".into(),
            phone: "0712345678".into(),
            email: None,
            nic: None,
        }
    }

    #[tokio::test]
    async fn booking_assigns_sequential_numbers_until_full() {
        let f = fixture(2);
        let first = f.store.book_appointment(request(f.session)).await.unwrap();
        let second = f.store.book_appointment(request(f.session)).await.unwrap();
        assert_eq!(first.appointment.appointment_number, 1);
        assert_eq!(second.appointment.appointment_number, 2);
        assert_eq!(second.doctor.name, "Dr. Perera");

        let err = f.store.book_appointment(request(f.session)).await.unwrap_err();
        assert_eq!(err, StoreError::Rejected("Session is full".into()));
    }

    #[tokio::test]
    async fn orphaned_session_records_nothing() {
        let session = Session {
            id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            date: Utc::now().date_naive() + Duration::days(1),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            capacity: 5,
            booked: 0,
            current_number: 0,
            cancelled: false,
        };
        let id = session.id;
        let store = MemoryStore::from_seed(Seed {
            sessions: vec![session],
            ..Seed::default()
        });

        for _ in 0..2 {
            let err = store.book_appointment(request(id)).await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(_)));
        }

        assert_eq!(store.running_numbers("0712345678").await, Ok(Vec::new()));
        let tables = store.tables.read().await;
        assert_eq!(tables.sessions[&id].booked, 0);
        assert!(tables.appointments.is_empty());
    }

    #[tokio::test]
    async fn cancel_distinguishes_missing_and_already_cancelled() {
        let f = fixture(5);
        let booking = f.store.book_appointment(request(f.session)).await.unwrap();
        let id = booking.appointment.id;

        let cancelled = f.store.cancel_appointment(id).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(f.store.cancel_appointment(id).await, Err(StoreError::AlreadyCancelled));
        assert_eq!(
            f.store.cancel_appointment(Uuid::new_v4()).await,
            Err(StoreError::NotFound { entity: "Appointment" })
        );
    }

    #[tokio::test]
    async fn running_numbers_track_the_queue() {
        let f = fixture(5);
        f.store.book_appointment(request(f.session)).await.unwrap();
        let mine = f.store.book_appointment(request(f.session)).await.unwrap();
        f.store.set_current_number(f.session, 1).await.unwrap();

        let numbers = f.store.running_numbers("0712345678").await.unwrap();
        assert_eq!(numbers.len(), 2);
        let entry = numbers
            .iter()
            .find(|n| n.appointment_id == mine.appointment.id)
            .unwrap();
        assert_eq!(entry.appointment_number, 2);
        assert_eq!(entry.current_number, 1);
        assert_eq!(entry.patients_ahead, 0);

        f.store.cancel_appointment(mine.appointment.id).await.unwrap();
        assert_eq!(f.store.running_numbers("0712345678").await.unwrap().len(), 1);
        assert!(f.store.running_numbers("0770000000").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let f = fixture(1);
        let filter = DoctorFilter {
            specialization: Some("cardio".into()),
            hospital: Some("central".into()),
            ..DoctorFilter::default()
        };
        let hits = f.store.search_doctors(&filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, f.doctor);

        let miss = DoctorFilter {
            name: Some("silva".into()),
            ..DoctorFilter::default()
        };
        assert!(f.store.search_doctors(&miss).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn doctor_profile_lists_upcoming_sessions() {
        let f = fixture(1);
        let profile = f.store.doctor(f.doctor).await.unwrap();
        assert_eq!(profile.hospital.name, "Central Hospital");
        assert_eq!(profile.sessions.len(), 1);
        assert_eq!(
            f.store.doctor(Uuid::new_v4()).await,
            Err(StoreError::NotFound { entity: "Doctor" })
        );
    }
}
