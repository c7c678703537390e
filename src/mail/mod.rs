//! Outbound email.
//!
//! # Data Flow
//! ```text
//! Booking confirmed
//!     → confirmation.rs (render subject/body from Booking)
//!     → Mailer (log in development, HTTP provider in deployment)
//! ```
//!
//! # Design Decisions
//! - Delivery failures are reported to the caller, never retried here
//! - Message rendering is independent of the provider

pub mod confirmation;
pub mod http;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use confirmation::booking_confirmation;
pub use http::HttpMailer;

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected message with status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Mailer that only writes to the log.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email (log only)");
        Ok(())
    }
}
