//! Request admission.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (caller identity from x-forwarded-for / x-real-ip)
//!     → RateKey (action, caller)
//!     → admission.rs (fixed-window counter, allow or reject)
//!     → Pass to input validation
//! ```
//!
//! # Design Decisions
//! - Counters live in an owned `AdmissionGate`, not a global
//! - Check-and-increment happens under the map shard lock
//! - No persistence; counters reset on restart

pub mod admission;
pub mod identity;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

pub use admission::{AdmissionGate, Clock, ManualClock, RateLimits, SystemClock, DEFAULT_WINDOW};
pub use identity::{caller_identity, RateKey, UNKNOWN_CALLER};

/// Periodically drop lapsed counters until shutdown is signalled.
pub async fn run_sweeper(gate: Arc<AdmissionGate>, mut shutdown: broadcast::Receiver<()>) {
    let period = gate.window().max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = gate.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = gate.tracked(), "Swept expired rate counters");
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Rate counter sweeper stopping");
                break;
            }
        }
    }
}
