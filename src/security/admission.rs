//! Fixed-window admission gate.
//!
//! One counter per rate key. A counter whose window has lapsed is reset on
//! its next check, so an idle key costs nothing until it is swept.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Default window shared by every route.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Source of time for the gate.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Request count for one key within its current window.
#[derive(Debug, Clone, Copy)]
struct RateCounter {
    count: u32,
    expires_at: Instant,
}

/// Per-key fixed-window request counter.
///
/// Built once at startup and shared through application state.
pub struct AdmissionGate {
    counters: DashMap<String, RateCounter>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl AdmissionGate {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            counters: DashMap::new(),
            window,
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one call for `key` and report whether it fits under `limit`.
    pub fn allow(&self, key: &str, limit: u32) -> bool {
        let now = self.clock.now();
        let mut counter = self
            .counters
            .entry(key.to_string())
            .or_insert(RateCounter {
                count: 0,
                expires_at: now + self.window,
            });

        if counter.count == 0 || now >= counter.expires_at {
            counter.count = 1;
            counter.expires_at = now + self.window;
            return true;
        }

        counter.count = counter.count.saturating_add(1);
        counter.count <= limit
    }

    /// Drop counters whose window has lapsed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.counters.len();
        self.counters.retain(|_, c| now < c.expires_at);
        let removed = before.saturating_sub(self.counters.len());
        metrics::record_tracked_keys(self.counters.len());
        removed
    }

    /// Number of keys currently held.
    pub fn tracked(&self) -> usize {
        self.counters.len()
    }
}

/// Per-action limits with built-in defaults.
#[derive(Debug, Clone)]
pub struct RateLimits {
    enabled: bool,
    limits: HashMap<String, u32>,
}

impl RateLimits {
    pub const DEFAULTS: &'static [(&'static str, u32)] = &[
        ("running_number", 10),
        ("doctor_search", 30),
        ("doctor_detail", 30),
        ("sessions", 30),
        ("book_appointment", 5),
        ("cancel_appointment", 5),
        ("health_records", 10),
        ("login", 5),
    ];

    /// Limit applied to actions with no default and no override.
    pub const FALLBACK: u32 = 30;

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut limits: HashMap<String, u32> = Self::DEFAULTS
            .iter()
            .map(|(action, limit)| (action.to_string(), *limit))
            .collect();
        limits.extend(config.limits.iter().map(|(k, v)| (k.clone(), *v)));
        Self {
            enabled: config.enabled,
            limits,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit_for(&self, action: &str) -> u32 {
        self.limits.get(action).copied().unwrap_or(Self::FALLBACK)
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
