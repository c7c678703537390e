//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics, panic catcher)
//! - Hold shared state (admission gate, store, mailer, auth client)
//! - Bind server to listener and shut down gracefully

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::AuthClient;
use crate::config::{AppConfig, TimeoutConfig};
use crate::http::handlers;
use crate::http::request::{request_span, track_metrics, X_REQUEST_ID};
use crate::http::response::{ApiError, Envelope, INTERNAL_FALLBACK};
use crate::lifecycle::{Services, Shutdown, StartupError};
use crate::mail::Mailer;
use crate::observability::metrics;
use crate::resilience::with_timeout;
use crate::security::{self, AdmissionGate, RateKey, RateLimits};
use crate::store::{Store, StoreError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub limits: Arc<RateLimits>,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<dyn Mailer>,
    pub auth: Arc<AuthClient>,
    pub timeouts: TimeoutConfig,
    pub max_body_size: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, services: Services) -> Result<Self, StartupError> {
        let gate = AdmissionGate::new(Duration::from_secs(config.rate_limit.window_secs));
        let auth = AuthClient::new(&config.auth, Duration::from_secs(config.timeouts.auth_secs))?;
        Ok(Self {
            gate: Arc::new(gate),
            limits: Arc::new(RateLimits::from_config(&config.rate_limit)),
            store: services.store,
            mailer: services.mailer,
            auth: Arc::new(auth),
            timeouts: config.timeouts.clone(),
            max_body_size: config.security.max_body_size,
        })
    }

    /// Swap in a different gate (e.g. one driven by a manual clock).
    pub fn with_gate(mut self, gate: Arc<AdmissionGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Count this call against the caller's budget for `action`.
    pub fn admit(&self, action: &'static str, headers: &HeaderMap) -> Result<(), ApiError> {
        if !self.limits.enabled() {
            return Ok(());
        }
        let key = RateKey::new(action, headers);
        if self.gate.allow(&key.to_string(), self.limits.limit_for(action)) {
            Ok(())
        } else {
            tracing::warn!(key = %key, "Rate limit exceeded");
            metrics::record_rate_limited(action);
            Err(ApiError::rate_limited())
        }
    }

    /// Run a store call under the store deadline.
    pub async fn store_call<F, T>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let after = Duration::from_secs(self.timeouts.store_secs);
        Ok(with_timeout("store", after, fut).await??)
    }
}

/// HTTP server for the clinic API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Build state from config and services, then the server.
    pub fn from_config(config: &AppConfig, services: Services) -> Result<Self, StartupError> {
        Ok(Self::new(AppState::new(config, services)?))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::spawn(security::run_sweeper(self.state.gate.clone(), shutdown.subscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(Shutdown::wait(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/running-number", get(handlers::running_number::lookup))
        .route("/api/doctors", get(handlers::doctors::search))
        .route("/api/doctors/{id}", get(handlers::doctors::detail))
        .route("/api/sessions", get(handlers::sessions::list))
        .route("/api/appointments", post(handlers::appointments::book))
        .route("/api/appointments/{id}/cancel", post(handlers::appointments::cancel))
        .route("/api/health-records", get(handlers::health_records::list))
        .route("/api/auth/login", post(handlers::auth::login))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .with_state(state)
        .route_layer(middleware::from_fn(track_metrics))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

async fn health() -> Json<Envelope<&'static str>> {
    Json(Envelope::success("ok", None))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    metrics::record_error("internal");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::<()>::failure(INTERNAL_FALLBACK)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::mail::LogMailer;
    use crate::security::ManualClock;
    use crate::store::MemoryStore;

    fn state(config: &AppConfig) -> AppState {
        let services = Services::new(Arc::new(MemoryStore::new()), Arc::new(LogMailer));
        AppState::new(config, services).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&body).unwrap())
    }

    fn lookup(caller: &str) -> Request<Body> {
        Request::get("/api/running-number?phone=0712345678")
            .header("x-real-ip", caller)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn budget_returns_after_window_lapses() {
        let clock = Arc::new(ManualClock::new());
        let gate = Arc::new(AdmissionGate::with_clock(Duration::from_secs(60), clock.clone()));
        let router = build_router(state(&AppConfig::default()).with_gate(gate));

        for _ in 0..10 {
            assert_eq!(send(&router, lookup("10.0.0.1")).await.0, StatusCode::OK);
        }
        let (status, _, body) = send(&router, lookup("10.0.0.1")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["message"], json!(crate::http::response::RATE_LIMITED_MESSAGE));

        clock.advance(Duration::from_secs(59));
        assert_eq!(send(&router, lookup("10.0.0.1")).await.0, StatusCode::TOO_MANY_REQUESTS);

        clock.advance(Duration::from_secs(1));
        assert_eq!(send(&router, lookup("10.0.0.1")).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn configured_limit_overrides_default() {
        let mut config = AppConfig::default();
        config.rate_limit.limits.insert("running_number".into(), 2);
        let router = build_router(state(&config));

        assert_eq!(send(&router, lookup("10.0.0.2")).await.0, StatusCode::OK);
        assert_eq!(send(&router, lookup("10.0.0.2")).await.0, StatusCode::OK);
        assert_eq!(send(&router, lookup("10.0.0.2")).await.0, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn callers_without_address_share_one_budget() {
        let mut config = AppConfig::default();
        config.rate_limit.limits.insert("doctor_search".into(), 1);
        let router = build_router(state(&config));
        let search = || Request::get("/api/doctors").body(Body::empty()).unwrap();

        assert_eq!(send(&router, search()).await.0, StatusCode::OK);
        assert_eq!(send(&router, search()).await.0, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let mut config = AppConfig::default();
        config.security.max_body_size = 16;
        let router = build_router(state(&config));
        let request = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": "pat@example.lk", "password": "secret" }).to_string()))
            .unwrap();

        let (status, _, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn unreachable_auth_service_is_internal_error() {
        let mut config = AppConfig::default();
        config.auth.base_url = "http://127.0.0.1:1/auth".into();
        let router = build_router(state(&config));
        let request = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": "pat@example.lk", "password": "secret" }).to_string()))
            .unwrap();

        let (status, _, body) = send(&router, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn wrong_method_gets_not_found_envelope() {
        let router = build_router(state(&AppConfig::default()));
        let cancel = format!("/api/appointments/{}/cancel", uuid::Uuid::new_v4());

        let cases = [
            ("GET", "/api/appointments"),
            ("GET", cancel.as_str()),
            ("DELETE", "/api/doctors"),
        ];
        for (method, uri) in cases {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, _, body) = send(&router, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(body, json!({ "success": false, "message": "Route not found" }));
        }
    }

    #[tokio::test]
    async fn undecodable_path_is_admitted_then_rejected() {
        let mut config = AppConfig::default();
        config.rate_limit.limits.insert("cancel_appointment".into(), 1);
        let router = build_router(state(&config));
        let cancel = || {
            Request::post("/api/appointments/%FF/cancel")
                .header("x-real-ip", "10.0.0.3")
                .body(Body::empty())
                .unwrap()
        };

        let (status, _, body) = send(&router, cancel()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "success": false, "message": "Appointment id must be a valid id" })
        );

        let (status, _, body) = send(&router, cancel()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);

        let detail = Request::get("/api/doctors/%FF").body(Body::empty()).unwrap();
        let (status, _, body) = send(&router, detail).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Doctor id must be a valid id");
    }

    #[tokio::test]
    async fn health_and_fallback_carry_request_id() {
        let router = build_router(state(&AppConfig::default()));

        let (status, headers, body) =
            send(&router, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "data": "ok" }));
        assert!(headers.contains_key(X_REQUEST_ID));

        let (status, _, body) =
            send(&router, Request::get("/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "message": "Route not found" }));
    }

    #[tokio::test]
    async fn panics_become_internal_envelope() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "success": false, "message": INTERNAL_FALLBACK }));
    }
}
