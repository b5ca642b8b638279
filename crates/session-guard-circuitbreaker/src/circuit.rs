use crate::config::CircuitBreakerConfig;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a limited number of trial calls are allowed.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Returns a short lowercase label, stable for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the breaker's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures counted in the current state.
    pub failures: usize,
    /// Successful trial calls counted while half-open.
    pub successes: usize,
    /// When the most recent failure was recorded, if any.
    pub last_failure: Option<Instant>,
    /// Trial calls admitted in the current half-open window.
    pub half_open_attempts: usize,
}

/// A state change performed while the circuit lock was held.
///
/// Returned to the caller so events and logs are produced after the lock is
/// released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: CircuitState,
    pub(crate) to: CircuitState,
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    failures: usize,
    successes: usize,
    half_open_attempts: usize,
    last_failure: Option<Instant>,
}

impl Circuit {
    pub(crate) fn new(state_atomic: Arc<AtomicU8>) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            state: CircuitState::Closed,
            state_atomic,
            failures: 0,
            successes: 0,
            half_open_attempts: 0,
            last_failure: None,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    /// Decides whether a call may proceed, moving Open to HalfOpen once the
    /// reset timeout has elapsed. The call that performs that move is the
    /// first trial and consumes one half-open slot.
    pub(crate) fn try_acquire(
        &mut self,
        config: &CircuitBreakerConfig,
        now: Instant,
    ) -> (bool, Option<Transition>) {
        match self.state {
            CircuitState::Closed => (true, None),
            CircuitState::Open => {
                let cooled_down = self
                    .last_failure
                    .map(|at| now.saturating_duration_since(at) >= config.reset_timeout)
                    .unwrap_or(true);
                if !cooled_down {
                    return (false, None);
                }
                let transition = self.transition_to(CircuitState::HalfOpen);
                self.half_open_attempts = 1;
                (true, transition)
            }
            CircuitState::HalfOpen => {
                if self.half_open_attempts < config.half_open_requests {
                    self.half_open_attempts += 1;
                    (true, None)
                } else {
                    (false, None)
                }
            }
        }
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) -> Option<Transition> {
        match self.state {
            CircuitState::Closed => {
                self.failures = 0;
                None
            }
            CircuitState::HalfOpen => {
                self.successes += 1;
                if self.successes >= config.half_open_requests {
                    self.transition_to(CircuitState::Closed)
                } else {
                    None
                }
            }
            // A call admitted before the trip finished late; it says nothing
            // about recovery.
            CircuitState::Open => None,
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        config: &CircuitBreakerConfig,
        now: Instant,
    ) -> Option<Transition> {
        self.last_failure = Some(now);
        match self.state {
            CircuitState::Closed => {
                self.failures += 1;
                if self.failures >= config.max_failures {
                    self.transition_to(CircuitState::Open)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open),
            // Late failure while open: the refreshed timestamp extends the cooldown.
            CircuitState::Open => None,
        }
    }

    pub(crate) fn reset(&mut self) -> Option<Transition> {
        let transition = self.transition_to(CircuitState::Closed);
        self.failures = 0;
        self.successes = 0;
        self.half_open_attempts = 0;
        self.last_failure = None;
        transition
    }

    pub(crate) fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state,
            failures: self.failures,
            successes: self.successes,
            last_failure: self.last_failure,
            half_open_attempts: self.half_open_attempts,
        }
    }

    fn transition_to(&mut self, state: CircuitState) -> Option<Transition> {
        if self.state == state {
            return None;
        }
        let from = self.state;
        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.failures = 0;
        self.successes = 0;
        self.half_open_attempts = 0;
        Some(Transition { from, to: state })
    }
}
