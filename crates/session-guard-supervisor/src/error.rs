use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`TaskSupervisor`](crate::TaskSupervisor) operations.
///
/// Worker failures are not errors of the supervisor itself; they are handled
/// by the restart policy and surface through [`status`](crate::TaskSupervisor::status),
/// events and metrics. Only usage errors and shutdown overruns are returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// A worker with this id is already registered.
    #[error("worker `{id}` is already registered")]
    AlreadyRegistered {
        /// The duplicate id.
        id: String,
    },

    /// `start` was called on a running supervisor.
    #[error("supervisor is already running")]
    AlreadyRunning,

    /// The supervisor has been stopped and cannot be started again.
    #[error("supervisor has been shut down")]
    ShutDown,

    /// No worker is registered under this id.
    #[error("no worker registered with id `{id}`")]
    UnknownWorker {
        /// The id that was looked up.
        id: String,
    },

    /// Workers did not exit within the shutdown grace period. They were
    /// cancelled and are left to finish on their own.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the workers that were still running.
        stuck: Vec<String>,
    },
}

/// Recorded as a worker's last error when its work function panics. The
/// panic counts as an ordinary failure against the restart budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("worker panicked: {message}")]
pub struct WorkerPanic {
    /// The panic payload, if it was a string.
    pub message: String,
}

impl WorkerPanic {
    pub(crate) fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            String::from("<non-string payload>")
        };
        Self { message }
    }
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs and metrics.
    ///
    /// # Example
    /// ```
    /// use session_guard_supervisor::SupervisorError;
    ///
    /// assert_eq!(SupervisorError::AlreadyRunning.as_label(), "supervisor_already_running");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyRegistered { .. } => "supervisor_already_registered",
            SupervisorError::AlreadyRunning => "supervisor_already_running",
            SupervisorError::ShutDown => "supervisor_shut_down",
            SupervisorError::UnknownWorker { .. } => "supervisor_unknown_worker",
            SupervisorError::GraceExceeded { .. } => "supervisor_grace_exceeded",
        }
    }
}
