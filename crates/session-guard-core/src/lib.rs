//! Core infrastructure for session-guard.
//!
//! This crate provides the plumbing shared by the circuit breaker, the task
//! supervisor and the health monitor:
//! - Event system for observability
//! - Detached dispatch so listeners never run under a component lock
//! - Error aliases used by work functions and probes

pub mod dispatch;
pub mod events;

pub use dispatch::spawn_detached;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};

/// Boxed error accepted from user-supplied work functions and probes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shareable error stored in status snapshots and handed to callbacks.
pub type SharedError = std::sync::Arc<dyn std::error::Error + Send + Sync>;
