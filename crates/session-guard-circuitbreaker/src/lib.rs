//! Circuit breaker guarding calls to a remote dependency.
//!
//! A circuit breaker stops hammering a failing dependency: after a run of
//! consecutive failures it rejects calls outright for a cooldown period, then
//! cautiously re-admits a limited number of trial calls.
//!
//! ## States
//! - **Closed**: Normal operation, every call is attempted. A success clears
//!   the failure streak; `max_failures` consecutive failures open the circuit.
//! - **Open**: Calls are rejected without being attempted until
//!   `reset_timeout` has elapsed since the last failure.
//! - **Half-Open**: Exactly `half_open_requests` trial calls are admitted. Any
//!   trial failure reopens the circuit; that many trial successes close it.
//!
//! Leaving Open always lands in Half-Open, never directly in Closed, and all
//! counters are cleared on every state change.
//!
//! ## Usage
//!
//! ```rust
//! use session_guard_circuitbreaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(3, Duration::from_secs(10));
//!
//! for _ in 0..3 {
//!     let _ = breaker.call(|| Err::<(), _>("connection refused"));
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//!
//! // Rejected without running the closure.
//! let result = breaker.call(|| Ok::<_, &str>("never runs"));
//! assert!(matches!(result, Err(CircuitBreakerError::OpenCircuit)));
//! ```
//!
//! ## Manual gating
//!
//! When the guarded operation cannot be expressed as a closure, gate it with
//! [`CircuitBreaker::can_attempt`] and report the outcome afterwards:
//!
//! ```rust
//! use session_guard_circuitbreaker::CircuitBreaker;
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
//! if breaker.can_attempt() {
//!     let outcome: Result<(), std::io::Error> = Ok(());
//!     breaker.record_result(&outcome);
//! }
//! ```
//!
//! ## Observability
//!
//! ```rust
//! use session_guard_circuitbreaker::CircuitBreakerConfig;
//! use std::time::Duration;
//!
//! let breaker = CircuitBreakerConfig::builder()
//!     .name("coordinator")
//!     .max_failures(3)
//!     .reset_timeout(Duration::from_secs(5))
//!     .on_state_transition(|from, to| println!("circuit: {from} -> {to}"))
//!     .on_call_rejected(|state| println!("rejected while {state}"))
//!     .build();
//! ```
//!
//! Listeners run on a separate execution path (see
//! [`session_guard_core::spawn_detached`]), so a slow handler never stalls
//! the breaker.
//!
//! ## Tower integration
//!
//! [`CircuitBreakerLayer`] gates every call of a wrapped `tower::Service`
//! through a shared breaker.
//!
//! ## Feature flags
//! - `tracing`: logs state transitions and rejections
//! - `metrics`: records `circuitbreaker_*` counters and a state gauge
//! - `serde`: serializes [`CircuitState`]

use crate::circuit::{Circuit, Transition};
#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
#[cfg(feature = "tracing")]
use tracing::{debug, info};

pub use circuit::{CircuitBreakerStats, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};

mod circuit;
mod config;
mod error;
mod events;
mod layer;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

#[cfg(feature = "metrics")]
fn describe_metrics() {
    METRICS_INIT.call_once(|| {
        describe_counter!(
            "circuitbreaker_calls_total",
            "Total number of outcomes recorded by the circuit breaker"
        );
        describe_counter!(
            "circuitbreaker_transitions_total",
            "Total number of circuit breaker state transitions"
        );
        describe_counter!(
            "circuitbreaker_rejected_total",
            "Total number of calls rejected without being attempted"
        );
        describe_gauge!(
            "circuitbreaker_state",
            "Current state of the circuit breaker (0 closed, 1 open, 2 half-open)"
        );
    });
}

struct Shared {
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
}

/// A circuit breaker guarding one remote resource.
///
/// Cloning is cheap and every clone observes and mutates the same circuit.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    /// Creates a breaker that opens after `max_failures` consecutive failures
    /// and admits a trial call once `reset_timeout` has elapsed.
    pub fn new(max_failures: usize, reset_timeout: Duration) -> Self {
        CircuitBreakerConfig::builder()
            .max_failures(max_failures)
            .reset_timeout(reset_timeout)
            .build()
    }

    /// Returns a builder for a fully configured breaker.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Creates a breaker from a finished configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        #[cfg(feature = "metrics")]
        describe_metrics();

        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            shared: Arc::new(Shared {
                config,
                circuit: Mutex::new(Circuit::new(Arc::clone(&state_atomic))),
                state_atomic,
            }),
        }
    }

    /// Returns the configuration this breaker was built with.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.shared.config
    }

    /// Returns whether a call may be attempted now.
    ///
    /// In Open this moves the circuit to Half-Open once the reset timeout has
    /// elapsed, and the returned `true` is the first trial. A `false` means the
    /// caller must not invoke the guarded operation and must not record a
    /// result for it.
    pub fn can_attempt(&self) -> bool {
        if self.state() == CircuitState::Closed {
            self.publish(CircuitBreakerEvent::CallPermitted {
                pattern_name: self.shared.config.name.clone(),
                timestamp: Instant::now(),
                state: CircuitState::Closed,
            });
            return true;
        }

        let (permitted, transition, state) = {
            let mut circuit = self.lock();
            let (permitted, transition) = circuit.try_acquire(&self.shared.config, Instant::now());
            (permitted, transition, circuit.state())
        };
        self.announce(transition);

        if permitted {
            self.publish(CircuitBreakerEvent::CallPermitted {
                pattern_name: self.shared.config.name.clone(),
                timestamp: Instant::now(),
                state,
            });
        } else {
            #[cfg(feature = "tracing")]
            debug!(breaker = %self.shared.config.name, %state, "call rejected");

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_rejected_total", "circuitbreaker" => self.shared.config.name.clone())
                .increment(1);

            self.publish(CircuitBreakerEvent::CallRejected {
                pattern_name: self.shared.config.name.clone(),
                timestamp: Instant::now(),
                state,
            });
        }
        permitted
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let (transition, state) = {
            let mut circuit = self.lock();
            let state = circuit.state();
            (circuit.record_success(&self.shared.config), state)
        };

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.shared.config.name.clone(), "outcome" => "success")
            .increment(1);

        self.publish(CircuitBreakerEvent::SuccessRecorded {
            pattern_name: self.shared.config.name.clone(),
            timestamp: Instant::now(),
            state,
        });
        self.announce(transition);
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let (transition, state) = {
            let mut circuit = self.lock();
            let state = circuit.state();
            (
                circuit.record_failure(&self.shared.config, Instant::now()),
                state,
            )
        };

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_calls_total", "circuitbreaker" => self.shared.config.name.clone(), "outcome" => "failure")
            .increment(1);

        self.publish(CircuitBreakerEvent::FailureRecorded {
            pattern_name: self.shared.config.name.clone(),
            timestamp: Instant::now(),
            state,
        });
        self.announce(transition);
    }

    /// Records the outcome of a call made after [`can_attempt`](Self::can_attempt)
    /// returned `true`.
    pub fn record_result<T, E>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
    }

    /// Runs `f` if the circuit allows it and records its outcome.
    ///
    /// Returns [`CircuitBreakerError::OpenCircuit`] without running `f` when
    /// the call is rejected; that rejection is not recorded as a failure.
    pub fn call<T, E, F>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.can_attempt() {
            return Err(CircuitBreakerError::OpenCircuit);
        }
        let result = f();
        self.record_result(&result);
        result.map_err(CircuitBreakerError::Inner)
    }

    /// Async counterpart of [`call`](Self::call).
    ///
    /// The future is only created when the circuit admits the call.
    pub async fn call_async<T, E, F, Fut>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.can_attempt() {
            return Err(CircuitBreakerError::OpenCircuit);
        }
        let result = f().await;
        self.record_result(&result);
        result.map_err(CircuitBreakerError::Inner)
    }

    /// Forces the circuit closed with every counter cleared.
    pub fn reset(&self) {
        let transition = self.lock().reset();
        self.announce(transition);
    }

    /// Returns the current state without taking the lock.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.shared.state_atomic.load(Ordering::Acquire))
    }

    /// Returns whether the circuit is currently open.
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// Returns a snapshot of the breaker's counters.
    pub fn stats(&self) -> CircuitBreakerStats {
        self.lock().stats()
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.shared
            .circuit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CircuitBreakerEvent) {
        self.shared.config.event_listeners.emit_detached(event);
    }

    fn announce(&self, transition: Option<Transition>) {
        let Some(Transition { from, to }) = transition else {
            return;
        };

        #[cfg(feature = "tracing")]
        info!(breaker = %self.shared.config.name, %from, %to, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => self.shared.config.name.clone(),
                "from" => from.as_str(),
                "to" => to.as_str()
            )
            .increment(1);
            gauge!("circuitbreaker_state", "circuitbreaker" => self.shared.config.name.clone())
                .set(to as u8 as f64);
        }

        self.publish(CircuitBreakerEvent::StateTransition {
            pattern_name: self.shared.config.name.clone(),
            timestamp: Instant::now(),
            from_state: from,
            to_state: to,
        });
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.shared.config.name)
            .field("state", &self.state())
            .finish()
    }
}
