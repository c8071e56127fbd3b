//! Fixed-window request throttling keyed by client identity.
//!
//! State lives in process memory. Behind a load balancer with several
//! instances each instance enforces the limit on its own, so the effective
//! ceiling is `max_requests` per instance.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

/// Windows are swept for expiry once the table grows past this many identities,
/// at most once per throttle window.
const SWEEP_THRESHOLD: usize = 10_000;

/// Throttle limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
        }
    }
}

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed { remaining: u32 },
    Throttled { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct ThrottleWindow {
    started_at: Instant,
    count: u32,
}

#[derive(Debug, Default)]
struct ThrottleTable {
    windows: HashMap<String, ThrottleWindow>,
    last_sweep: Option<Instant>,
    sweeps: u64,
}

impl ThrottleTable {
    fn sweep_due(&self, now: Instant, window: Duration) -> bool {
        self.windows.len() >= SWEEP_THRESHOLD
            && self
                .last_sweep
                .map_or(true, |at| now.saturating_duration_since(at) >= window)
    }

    fn sweep(&mut self, now: Instant, window: Duration) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) < window);
        self.last_sweep = Some(now);
        self.sweeps += 1;
    }
}

/// Per-identity request counter.
///
/// Check and increment happen under a single lock acquisition, so concurrent
/// requests from one identity can never be admitted beyond the limit.
#[derive(Debug)]
pub struct RequestThrottler {
    config: ThrottleConfig,
    table: Mutex<ThrottleTable>,
}

impl RequestThrottler {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            table: Mutex::new(ThrottleTable::default()),
        }
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    /// Count a request from `identity` and decide whether it may proceed.
    pub fn check(&self, identity: &str) -> ThrottleDecision {
        self.check_at(identity, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, identity: &str, now: Instant) -> ThrottleDecision {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);

        if !table.windows.contains_key(identity) && table.sweep_due(now, self.config.window) {
            table.sweep(now, self.config.window);
        }

        let window = table
            .windows
            .entry(identity.to_string())
            .and_modify(|w| {
                if now.saturating_duration_since(w.started_at) >= self.config.window {
                    *w = ThrottleWindow {
                        started_at: now,
                        count: 0,
                    };
                }
            })
            .or_insert(ThrottleWindow {
                started_at: now,
                count: 0,
            });

        // Saturates instead of wrapping; stays over the limit until the window ends
        window.count = window.count.saturating_add(1);

        if window.count > self.config.max_requests {
            let elapsed = now.saturating_duration_since(window.started_at);
            ThrottleDecision::Throttled {
                retry_after: self.config.window.saturating_sub(elapsed),
            }
        } else {
            ThrottleDecision::Allowed {
                remaining: self.config.max_requests - window.count,
            }
        }
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }
}

impl Default for RequestThrottler {
    fn default() -> Self {
        Self::new(ThrottleConfig::default())
    }
}
