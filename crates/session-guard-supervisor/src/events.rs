use session_guard_core::{ResilienceEvent, SharedError};
use std::time::{Duration, Instant};

/// Lifecycle events emitted by a [`TaskSupervisor`](crate::TaskSupervisor).
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// A worker execution is about to run.
    WorkerStarted {
        pattern_name: String,
        timestamp: Instant,
        worker_id: String,
        restart_count: u32,
    },
    /// A worker execution returned an error.
    WorkerFailed {
        pattern_name: String,
        timestamp: Instant,
        worker_id: String,
        error: SharedError,
        restart_count: u32,
    },
    /// A failed worker will run again after `delay`.
    RestartScheduled {
        pattern_name: String,
        timestamp: Instant,
        worker_id: String,
        delay: Duration,
        restart_count: u32,
    },
    /// A worker exceeded its restart budget and is stopped for good.
    WorkerExhausted {
        pattern_name: String,
        timestamp: Instant,
        worker_id: String,
        restart_count: u32,
    },
    /// A worker returned successfully and will not be restarted.
    WorkerCompleted {
        pattern_name: String,
        timestamp: Instant,
        worker_id: String,
    },
    /// A worker exited because its scope was cancelled.
    WorkerStopped {
        pattern_name: String,
        timestamp: Instant,
        worker_id: String,
    },
}

impl SupervisorEvent {
    /// Id of the worker this event concerns.
    pub fn worker_id(&self) -> &str {
        match self {
            SupervisorEvent::WorkerStarted { worker_id, .. }
            | SupervisorEvent::WorkerFailed { worker_id, .. }
            | SupervisorEvent::RestartScheduled { worker_id, .. }
            | SupervisorEvent::WorkerExhausted { worker_id, .. }
            | SupervisorEvent::WorkerCompleted { worker_id, .. }
            | SupervisorEvent::WorkerStopped { worker_id, .. } => worker_id,
        }
    }
}

impl ResilienceEvent for SupervisorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SupervisorEvent::WorkerStarted { .. } => "worker_started",
            SupervisorEvent::WorkerFailed { .. } => "worker_failed",
            SupervisorEvent::RestartScheduled { .. } => "restart_scheduled",
            SupervisorEvent::WorkerExhausted { .. } => "worker_exhausted",
            SupervisorEvent::WorkerCompleted { .. } => "worker_completed",
            SupervisorEvent::WorkerStopped { .. } => "worker_stopped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            SupervisorEvent::WorkerStarted { timestamp, .. }
            | SupervisorEvent::WorkerFailed { timestamp, .. }
            | SupervisorEvent::RestartScheduled { timestamp, .. }
            | SupervisorEvent::WorkerExhausted { timestamp, .. }
            | SupervisorEvent::WorkerCompleted { timestamp, .. }
            | SupervisorEvent::WorkerStopped { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            SupervisorEvent::WorkerStarted { pattern_name, .. }
            | SupervisorEvent::WorkerFailed { pattern_name, .. }
            | SupervisorEvent::RestartScheduled { pattern_name, .. }
            | SupervisorEvent::WorkerExhausted { pattern_name, .. }
            | SupervisorEvent::WorkerCompleted { pattern_name, .. }
            | SupervisorEvent::WorkerStopped { pattern_name, .. } => pattern_name,
        }
    }
}
