//! Reconnection policy for long-lived client sessions.
//!
//! [`ReconnectionPolicy`] centralizes the retry arithmetic of a connection
//! loop: whether another attempt is allowed and how long to wait before it.
//! The delay comes from a pluggable [`IntervalFunction`] of the attempt count,
//! or a fixed delay when none is configured.
//!
//! ```rust
//! use session_guard_reconnect::ReconnectionPolicy;
//! use std::time::Duration;
//!
//! let mut policy = ReconnectionPolicy::builder()
//!     .max_attempts(3)
//!     .delay(Duration::from_millis(500))
//!     .build();
//!
//! while policy.should_reconnect() {
//!     let _wait = policy.next_backoff();
//!     policy.increment_attempts();
//!     // connect...
//! }
//! assert_eq!(policy.attempts(), 3);
//!
//! // After a successful connection:
//! policy.reset();
//! ```
//!
//! ## Backoff strategies
//! - [`FixedInterval`]: the same delay every time
//! - [`ExponentialBackoff`]: `initial × multiplier^attempt`, optionally capped
//! - [`FnInterval`]: any closure of the attempt count
//!
//! ## Feature flags
//! - `tracing`: logs counted attempts at debug level

pub use backoff::{ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use policy::{ReconnectionPolicy, ReconnectionPolicyBuilder};

mod backoff;
mod policy;
