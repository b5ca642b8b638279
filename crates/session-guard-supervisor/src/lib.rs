//! Supervision for long-lived async workers.
//!
//! A [`TaskSupervisor`] runs named workers (a connection loop, a heartbeat, a
//! reader) as independent tokio tasks and restarts each one when it fails,
//! following its [`RestartPolicy`]: a bounded number of restarts separated by
//! exponentially growing delays. A worker that exceeds its budget is stopped
//! for good and shows up as not running in [`TaskSupervisor::status`].
//!
//! Every worker receives a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! derived from the supervisor's own token. A worker that returns after its
//! token was cancelled is considered stopped, not failed. A work function
//! that panics is treated as failed with a [`WorkerPanic`] error.
//!
//! ## Usage
//!
//! ```rust
//! use session_guard_supervisor::{RestartPolicy, TaskSupervisor};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let supervisor = TaskSupervisor::builder()
//!     .name("session")
//!     .shutdown_grace(Duration::from_secs(5))
//!     .build();
//!
//! supervisor.register(
//!     "heartbeat",
//!     "Heartbeat sender",
//!     |token| async move {
//!         token.cancelled().await;
//!         Ok::<_, std::io::Error>(())
//!     },
//!     RestartPolicy::default().max_restarts(3),
//! )?;
//!
//! supervisor.start()?;
//! assert!(supervisor.is_healthy());
//!
//! supervisor.stop().await?;
//! assert!(!supervisor.status()["heartbeat"].running);
//! # Ok(())
//! # }
//! ```
//!
//! ## Health
//!
//! [`TaskSupervisor::is_healthy`] is an early-warning heuristic: it turns false
//! as soon as any worker is not running or has used more than half of its
//! restart budget, well before the hard cap is hit.
//!
//! ## Feature flags
//! - `tracing`: logs worker lifecycle, failures and shutdown overruns
//! - `metrics`: records `supervisor_*` counters and a running-workers gauge

pub use config::{SupervisorConfig, SupervisorConfigBuilder};
pub use error::{SupervisorError, WorkerPanic};
pub use events::SupervisorEvent;
pub use policy::{FailureHook, RestartPolicy};
pub use supervisor::{SupervisorMetrics, TaskSupervisor};
pub use worker::{WorkFn, WorkerStatus};

mod config;
mod error;
mod events;
mod policy;
mod supervisor;
mod worker;

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    use metrics::{describe_counter, describe_gauge};

    METRICS_INIT.call_once(|| {
        describe_counter!(
            "supervisor_worker_failures_total",
            "Total number of errors returned by supervised workers"
        );
        describe_counter!(
            "supervisor_workers_exhausted_total",
            "Total number of workers stopped after exceeding their restart budget"
        );
        describe_gauge!(
            "supervisor_workers_running",
            "Number of workers with an active execution loop"
        );
    });
}
