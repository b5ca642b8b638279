use crate::events::CircuitBreakerEvent;
use crate::CircuitState;
use session_guard_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) max_failures: usize,
    pub(crate) reset_timeout: Duration,
    pub(crate) half_open_requests: usize,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Name used in logs, metrics labels and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consecutive failures that open the circuit.
    pub fn max_failures(&self) -> usize {
        self.max_failures
    }

    /// Time the circuit stays open before admitting a trial call.
    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// Trial calls admitted while half-open.
    pub fn half_open_requests(&self) -> usize {
        self.half_open_requests
    }
}

/// Builder for configuring and constructing a circuit breaker.
pub struct CircuitBreakerConfigBuilder {
    name: String,
    max_failures: usize,
    reset_timeout: Duration,
    half_open_requests: usize,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            max_failures: 5,
            reset_timeout: Duration::from_secs(30),
            half_open_requests: 1,
            event_listeners: EventListeners::new(),
        }
    }

    /// Give this breaker a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Sets how many consecutive failures open the circuit.
    ///
    /// Values below 1 are treated as 1.
    ///
    /// Default: 5
    pub fn max_failures(mut self, n: usize) -> Self {
        self.max_failures = n.max(1);
        self
    }

    /// Sets how long the circuit stays open before a trial call is admitted.
    ///
    /// Default: 30 seconds
    pub fn reset_timeout(mut self, duration: Duration) -> Self {
        self.reset_timeout = duration;
        self
    }

    /// Sets how many trial calls are admitted while half-open. The same
    /// number of consecutive trial successes closes the circuit.
    ///
    /// Values below 1 are treated as 1.
    ///
    /// Default: 1
    pub fn half_open_requests(mut self, n: usize) -> Self {
        self.half_open_requests = n.max(1);
        self
    }

    /// Registers a callback invoked with `(from, to)` whenever the circuit
    /// changes state.
    ///
    /// The callback runs on a separate execution path, never under the
    /// breaker's lock, so it may block or call back into the breaker. Order
    /// across rapid successive transitions is not guaranteed.
    ///
    /// # Example
    /// ```rust
    /// use session_guard_circuitbreaker::{CircuitBreakerConfig, CircuitState};
    ///
    /// let breaker = CircuitBreakerConfig::builder()
    ///     .on_state_transition(|from, to| {
    ///         if to == CircuitState::Open {
    ///             eprintln!("remote failing, circuit {from} -> {to}");
    ///         }
    ///     })
    ///     .build();
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a call is rejected without being
    /// attempted.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallRejected { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a success is recorded.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback invoked when a failure is recorded.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a listener receiving every event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Finishes the configuration without building a breaker.
    pub fn into_config(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: self.name,
            max_failures: self.max_failures,
            reset_timeout: self.reset_timeout,
            half_open_requests: self.half_open_requests,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the circuit breaker.
    pub fn build(self) -> crate::CircuitBreaker {
        crate::CircuitBreaker::with_config(self.into_config())
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
