//! Timeout enforcement for outbound calls.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped call did not finish in time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} timed out after {}s", .after.as_secs())]
pub struct Elapsed {
    pub operation: &'static str,
    pub after: Duration,
}

/// Run `fut` with a deadline.
pub async fn with_timeout<F, T>(operation: &'static str, after: Duration, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(value) => Ok(value),
        Err(_) => {
            tracing::warn!(operation, timeout_secs = after.as_secs(), "Outbound call timed out");
            Err(Elapsed { operation, after })
        }
    }
}
