//! Clinic appointment API.
//!
//! Every route runs the same admission pipeline before touching data:
//!
//! ```text
//! request → security (rate key, fixed-window gate)   → 429
//!         → input (ordered schema, first failure)     → 400
//!         → store / auth / mail (with deadlines)      → 404 / 400 / 500
//!         → http::response (uniform JSON envelope)    → 200
//! ```

pub mod auth;
pub mod config;
pub mod http;
pub mod input;
pub mod lifecycle;
pub mod mail;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod store;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Services, Shutdown};
