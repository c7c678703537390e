//! Route handlers.
//!
//! Every handler follows the same order: admission, then validation, then
//! the store or upstream call, then the envelope. Nothing reaches the store
//! before the caller has been admitted and the input has been validated.

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod health_records;
pub mod running_number;
pub mod sessions;
