//! Resilience primitives for long-lived client sessions.
//!
//! `session-guard` bundles four independent components that a connection
//! loop (a websocket feed, a broker session, an RPC stream) typically needs
//! together. Each one is also published as its own crate.
//!
//! # Components
//!
//! - **Circuit breaker** (`circuitbreaker` feature): stops calling a
//!   dependency after consecutive failures and probes it again after a cooldown
//! - **Supervisor** (`supervisor` feature): runs named workers and restarts
//!   them with bounded exponential backoff
//! - **Reconnect** (`reconnect` feature): decides whether another connection
//!   attempt is allowed and how long to wait before it
//! - **Health** (`health` feature): folds traffic events and periodic probes
//!   into a healthy / degraded / unhealthy status
//!
//! The components do not depend on each other; composing them is up to the
//! caller. See `examples/connection_loop.rs` for a supervised connection loop
//! using all four.
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! session-guard = { version = "0.1", features = ["full", "tracing"] }
//! ```
//!
//! ```rust
//! # #[cfg(all(feature = "circuitbreaker", feature = "reconnect"))]
//! # {
//! use session_guard::circuitbreaker::CircuitBreaker;
//! use session_guard::reconnect::ReconnectionPolicy;
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new(3, Duration::from_secs(10));
//! let mut policy = ReconnectionPolicy::new(5, Duration::from_millis(250));
//!
//! while policy.should_reconnect() && breaker.can_attempt() {
//!     policy.increment_attempts();
//!     breaker.record_failure();
//! }
//! assert!(breaker.is_open());
//! assert_eq!(policy.attempts(), 3);
//! # }
//! ```
//!
//! # Feature flags
//! - `full`: every component
//! - `tracing`: structured logs from every enabled component
//! - `metrics`: counters and gauges from every enabled component

// Re-export core (always available)
pub use session_guard_core as core;

#[cfg(feature = "circuitbreaker")]
pub use session_guard_circuitbreaker as circuitbreaker;

#[cfg(feature = "health")]
pub use session_guard_health as health;

#[cfg(feature = "reconnect")]
pub use session_guard_reconnect as reconnect;

#[cfg(feature = "supervisor")]
pub use session_guard_supervisor as supervisor;
