//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span, metrics, bounded body)
//!     → handlers/ (admission → validation → store/upstream)
//!     → response.rs (envelope, status mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ApiResponse, Envelope};
pub use server::{build_router, AppState, HttpServer};
