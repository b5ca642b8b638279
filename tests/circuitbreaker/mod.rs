//! Circuit breaker tests.
//!
//! Test organization:
//! - thresholds.rs: consecutive-failure counting while closed
//! - half_open.rs: cooldown, trial slots and recovery
//! - concurrency.rs: shared breakers across threads and tasks
//! - layer.rs: tower middleware

mod half_open;
mod thresholds;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RemoteError(pub(crate) &'static str);

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "remote error: {}", self.0)
    }
}

impl std::error::Error for RemoteError {}
