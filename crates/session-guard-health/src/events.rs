use crate::error::HealthCheckError;
use crate::status::HealthStatus;
use session_guard_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by a [`HealthMonitor`](crate::HealthMonitor).
#[derive(Debug, Clone)]
pub enum HealthEvent {
    /// The recomputed status differs from the previous one.
    StatusChanged {
        pattern_name: String,
        timestamp: Instant,
        from: HealthStatus,
        to: HealthStatus,
    },
    /// A probe succeeded.
    CheckSucceeded {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    /// A probe failed or timed out.
    CheckFailed {
        pattern_name: String,
        timestamp: Instant,
        error: HealthCheckError,
        consecutive_errors: u32,
    },
}

impl ResilienceEvent for HealthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            HealthEvent::StatusChanged { .. } => "status_changed",
            HealthEvent::CheckSucceeded { .. } => "check_succeeded",
            HealthEvent::CheckFailed { .. } => "check_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            HealthEvent::StatusChanged { timestamp, .. }
            | HealthEvent::CheckSucceeded { timestamp, .. }
            | HealthEvent::CheckFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            HealthEvent::StatusChanged { pattern_name, .. }
            | HealthEvent::CheckSucceeded { pattern_name, .. }
            | HealthEvent::CheckFailed { pattern_name, .. } => pattern_name,
        }
    }
}
