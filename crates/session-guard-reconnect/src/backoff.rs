use std::fmt;
use std::time::Duration;

/// Computes the delay before a reconnection attempt.
///
/// Implementations must be pure functions of the attempt number so the same
/// count always yields the same delay.
pub trait IntervalFunction: Send + Sync {
    /// Computes the delay given how many attempts were already made
    /// (0 before the first retry).
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Returns the same delay for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    /// Creates a fixed interval.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// `initial × multiplier^attempt`, optionally capped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff with a multiplier of 2.0 and no cap.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    /// Sets the multiplier for exponential growth.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum interval to cap exponential growth.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let exp = attempt.min(i32::MAX as usize) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exp);
        let cap = self.max_interval.unwrap_or(Duration::MAX);

        if !secs.is_finite() {
            return cap;
        }
        let interval = Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX);
        interval.min(cap)
    }
}

/// Function-based interval.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Wraps a closure mapping the attempt number to a delay.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}

impl<F> fmt::Debug for FnInterval<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterval").finish_non_exhaustive()
    }
}
