//! Restart policy for supervised workers.
//!
//! The delay before restart `n` (1-based) is `base_delay × factor^(n-1)`,
//! clamped to `max_delay`. It is recomputed from the restart count each time,
//! never accumulated, so it is deterministic for a given count.
//!
//! ```rust
//! use session_guard_supervisor::RestartPolicy;
//! use std::time::Duration;
//!
//! let policy = RestartPolicy::default()
//!     .base_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(1));
//!
//! assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
//! assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
//! assert_eq!(policy.backoff_for(10), Duration::from_secs(1));
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Hook invoked with `(error, restart_count)` when a worker fails.
pub type FailureHook = Arc<dyn Fn(&(dyn Error + Send + Sync + 'static), u32) + Send + Sync>;

/// How a worker is restarted after it fails.
///
/// A plain value: the fields are public and the chained setters are a
/// convenience over them.
#[derive(Clone)]
pub struct RestartPolicy {
    /// Restarts allowed before the worker is stopped for good.
    pub max_restarts: u32,
    /// Delay before the first restart.
    pub base_delay: Duration,
    /// Multiplicative growth factor between restarts.
    pub backoff_factor: f64,
    /// Upper bound on any restart delay.
    pub max_delay: Duration,
    /// Optional failure hook, see [`RestartPolicy::on_failure`].
    pub on_failure: Option<FailureHook>,
}

impl Default for RestartPolicy {
    /// 5 restarts, 1s base delay, factor 2.0, 30s cap, no failure hook.
    fn default() -> Self {
        Self {
            max_restarts: 5,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
            on_failure: None,
        }
    }
}

impl RestartPolicy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many restarts are allowed before the worker is stopped for good.
    pub fn max_restarts(mut self, n: u32) -> Self {
        self.max_restarts = n;
        self
    }

    /// Sets the delay before the first restart.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the multiplicative growth factor between restarts.
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Sets the upper bound on any restart delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Registers a hook invoked with `(error, restart_count)` every time the
    /// worker fails, including the failure that exhausts the budget.
    ///
    /// The hook runs detached from the worker loop, so it may block.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&(dyn Error + Send + Sync + 'static), u32) + Send + Sync + 'static,
    {
        self.on_failure = Some(Arc::new(f));
        self
    }

    /// Returns the delay applied before restart number `restart_count`.
    ///
    /// Counts below 1 are treated as 1. Results that overflow, or that are
    /// not finite, saturate to the cap.
    pub fn backoff_for(&self, restart_count: u32) -> Duration {
        let exp = restart_count.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exp);

        if !secs.is_finite() || secs > self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        if secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl fmt::Debug for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestartPolicy")
            .field("max_restarts", &self.max_restarts)
            .field("base_delay", &self.base_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay", &self.max_delay)
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}
