//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, routing::post, Json, Router};
use chrono::{NaiveTime, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use clinic_gateway::config::AppConfig;
use clinic_gateway::http::{AppState, HttpServer};
use clinic_gateway::lifecycle::{Services, Shutdown};
use clinic_gateway::mail::{Email, MailError, Mailer};
use clinic_gateway::store::{Doctor, Hospital, MemoryStore, Prescription, Seed, Session};

pub const PATIENT_PHONE: &str = "0712345678";

/// Mailer that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Rejected(503));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Ids of the seeded records.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub hospital: Uuid,
    pub doctor: Uuid,
    pub session: Uuid,
    pub full_session: Uuid,
}

pub fn seed() -> (Seed, Fixture) {
    let hospital = Hospital {
        id: Uuid::new_v4(),
        name: "National Hospital".into(),
        city: "Colombo".into(),
    };
    let doctor = Doctor {
        id: Uuid::new_v4(),
        name: "Dr. Fernando".into(),
        specialization: "Pediatrics".into(),
        hospital_id: hospital.id,
        fee: 200_000,
    };
    let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
    let session = Session {
        id: Uuid::new_v4(),
        doctor_id: doctor.id,
        date: tomorrow,
        start_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        capacity: 20,
        booked: 0,
        current_number: 0,
        cancelled: false,
    };
    let full_session = Session {
        id: Uuid::new_v4(),
        capacity: 1,
        booked: 1,
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        ..session.clone()
    };
    let prescription = Prescription {
        id: Uuid::new_v4(),
        phone: PATIENT_PHONE.into(),
        doctor_id: doctor.id,
        issued_on: Utc::now().date_naive(),
        diagnosis: "Seasonal flu".into(),
        medications: vec!["Paracetamol 500mg".into()],
        notes: None,
    };

    let fixture = Fixture {
        hospital: hospital.id,
        doctor: doctor.id,
        session: session.id,
        full_session: full_session.id,
    };
    let seed = Seed {
        hospitals: vec![hospital],
        doctors: vec![doctor],
        sessions: vec![session, full_session],
        prescriptions: vec![prescription],
        ..Seed::default()
    };
    (seed, fixture)
}

/// Start a stand-in for the external auth service.
///
/// Accepts password `secret`, refuses everything else.
pub async fn start_mock_auth() -> SocketAddr {
    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "secret" {
            (
                StatusCode::OK,
                Json(json!({ "data": { "token": "t-123", "email": body["email"] } })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Wrong email or password" })),
            )
        }
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/auth/login", post(login));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub fixture: Fixture,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// GET with a fixed caller identity.
    pub async fn get(&self, path: &str, caller: &str) -> (u16, Value) {
        let res = self
            .client
            .get(self.url(path))
            .header("x-forwarded-for", caller)
            .send()
            .await
            .expect("gateway unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.expect("body is not JSON"))
    }

    /// POST a JSON body with a fixed caller identity.
    pub async fn post(&self, path: &str, caller: &str, body: Value) -> (u16, Value) {
        let res = self
            .client
            .post(self.url(path))
            .header("x-forwarded-for", caller)
            .json(&body)
            .send()
            .await
            .expect("gateway unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.expect("body is not JSON"))
    }

    pub async fn book(&self, caller: &str, session: Uuid, email: Option<&str>) -> (u16, Value) {
        let mut body = json!({
            "session_id": session,
            "patient_name": "Sunil Jayasuriya",
            "phone": "071 234 5678",
        });
        if let Some(email) = email {
            body["email"] = json!(email);
        }
        self.post("/api/appointments", caller, body).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig::default(), RecordingMailer::default()).await
}

pub async fn spawn_app_with(mut config: AppConfig, mailer: RecordingMailer) -> TestApp {
    let auth_addr = start_mock_auth().await;
    config.auth.base_url = format!("http://{auth_addr}/auth");

    let (seed, fixture) = seed();
    let store = Arc::new(MemoryStore::from_seed(seed));
    let mailer = Arc::new(mailer);
    let services = Services::new(store.clone(), mailer.clone());

    let state = AppState::new(&config, services).expect("state builds");
    let server = HttpServer::new(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    TestApp {
        addr,
        store,
        mailer,
        fixture,
        client,
        shutdown,
    }
}
