use session_guard_core::SharedError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a health probe failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum HealthCheckError {
    /// The probe did not finish within the configured probe timeout.
    #[error("health probe timed out after {timeout:?}")]
    Timeout {
        /// The configured probe timeout.
        timeout: Duration,
    },

    /// The probe returned an error.
    #[error("health probe failed: {0}")]
    Probe(SharedError),
}

impl HealthCheckError {
    /// Returns a short stable label (snake_case) for use in logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HealthCheckError::Timeout { .. } => "probe_timeout",
            HealthCheckError::Probe(_) => "probe_failed",
        }
    }

    /// The error recorded as the monitor's last error: the probe's own error,
    /// or this error for timeouts.
    pub(crate) fn to_shared(&self) -> SharedError {
        match self {
            HealthCheckError::Probe(err) => Arc::clone(err),
            HealthCheckError::Timeout { .. } => Arc::new(self.clone()),
        }
    }
}
