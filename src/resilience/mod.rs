//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Handler → external collaborator (store, auth service, mail provider)
//!     → timeouts.rs (deadline per call)
//!     → On expiry: internal error naming the operation
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries: a failed call surfaces immediately

pub mod timeouts;

pub use timeouts::{with_timeout, Elapsed};
