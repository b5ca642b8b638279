use crate::backoff::{FixedInterval, FnInterval, IntervalFunction};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "tracing")]
use tracing::debug;

/// Decides whether and when the next reconnection attempt should happen.
///
/// Holds nothing but a flag, an attempt counter and a backoff strategy. It
/// performs no I/O and spawns nothing; the connection loop consults it and
/// owns it exclusively, so mutation goes through `&mut self`.
#[derive(Clone)]
pub struct ReconnectionPolicy {
    enabled: bool,
    attempts: usize,
    max_attempts: usize,
    delay: Duration,
    backoff: Option<Arc<dyn IntervalFunction>>,
}

impl ReconnectionPolicy {
    /// Creates an enabled policy allowing `max_attempts` attempts spaced by a
    /// fixed `delay`.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            enabled: true,
            attempts: 0,
            max_attempts,
            delay,
            backoff: None,
        }
    }

    /// Returns a builder.
    pub fn builder() -> ReconnectionPolicyBuilder {
        ReconnectionPolicyBuilder::new()
    }

    /// True iff enabled and fewer than `max_attempts` attempts were made.
    pub fn should_reconnect(&self) -> bool {
        self.enabled && self.attempts < self.max_attempts
    }

    /// Delay before the next attempt.
    ///
    /// Delegates to the backoff strategy with the current attempt count, or
    /// returns the fixed delay when none is set.
    pub fn next_backoff(&self) -> Duration {
        match &self.backoff {
            Some(backoff) => backoff.next_interval(self.attempts),
            None => self.delay,
        }
    }

    /// Counts one attempt.
    pub fn increment_attempts(&mut self) {
        self.attempts = self.attempts.saturating_add(1);

        #[cfg(feature = "tracing")]
        debug!(
            attempts = self.attempts,
            max_attempts = self.max_attempts,
            "reconnection attempt counted"
        );
    }

    /// Zeroes the attempt counter, typically after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts made since the last reset.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Changes the maximum number of attempts.
    pub fn set_max_attempts(&mut self, max_attempts: usize) {
        self.max_attempts = max_attempts;
    }

    /// Fixed delay used when no backoff strategy is set.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether reconnection is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables reconnection without touching the attempt count.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replaces the backoff strategy.
    pub fn set_backoff<B>(&mut self, backoff: B)
    where
        B: IntervalFunction + 'static,
    {
        self.backoff = Some(Arc::new(backoff));
    }

    /// Removes the backoff strategy, falling back to the fixed delay.
    pub fn clear_backoff(&mut self) {
        self.backoff = None;
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        ReconnectionPolicyBuilder::new().build()
    }
}

impl fmt::Debug for ReconnectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectionPolicy")
            .field("enabled", &self.enabled)
            .field("attempts", &self.attempts)
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("custom_backoff", &self.backoff.is_some())
            .finish()
    }
}

/// Builder for [`ReconnectionPolicy`].
pub struct ReconnectionPolicyBuilder {
    enabled: bool,
    max_attempts: usize,
    delay: Duration,
    backoff: Option<Arc<dyn IntervalFunction>>,
}

impl ReconnectionPolicyBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self {
            enabled: true,
            max_attempts: 10,
            delay: Duration::from_secs(5),
            backoff: None,
        }
    }

    /// Enables or disables reconnection.
    ///
    /// Default: true
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the maximum number of attempts.
    ///
    /// Default: 10
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the fixed delay used when no backoff strategy is set.
    ///
    /// Default: 5 seconds
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Uses a backoff strategy instead of the fixed delay.
    ///
    /// # Example
    /// ```rust
    /// use session_guard_reconnect::{ExponentialBackoff, ReconnectionPolicy};
    /// use std::time::Duration;
    ///
    /// let policy = ReconnectionPolicy::builder()
    ///     .backoff(
    ///         ExponentialBackoff::new(Duration::from_millis(100))
    ///             .max_interval(Duration::from_secs(5)),
    ///     )
    ///     .build();
    /// assert_eq!(policy.next_backoff(), Duration::from_millis(100));
    /// ```
    pub fn backoff<B>(mut self, backoff: B) -> Self
    where
        B: IntervalFunction + 'static,
    {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Uses a closure mapping the attempt count to a delay.
    pub fn backoff_fn<F>(self, f: F) -> Self
    where
        F: Fn(usize) -> Duration + Send + Sync + 'static,
    {
        self.backoff(FnInterval::new(f))
    }

    /// Uses a fixed interval strategy, equivalent to setting the delay.
    pub fn fixed(self, delay: Duration) -> Self {
        self.delay(delay).backoff(FixedInterval::new(delay))
    }

    /// Builds the policy.
    pub fn build(self) -> ReconnectionPolicy {
        ReconnectionPolicy {
            enabled: self.enabled,
            attempts: 0,
            max_attempts: self.max_attempts,
            delay: self.delay,
            backoff: self.backoff,
        }
    }
}

impl Default for ReconnectionPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
