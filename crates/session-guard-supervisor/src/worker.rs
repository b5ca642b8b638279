//! A single supervised worker and its restart loop.
//!
//! ```text
//! loop {
//!   ├─► supervisor stopping? → exit
//!   ├─► run work(token)
//!   ├─► token cancelled?     → exit (WorkerStopped, not a failure)
//!   ├─► Ok                   → exit (WorkerCompleted, no restart)
//!   └─► Err or panic
//!        ├─► restart_count += 1, hook(err, restart_count)
//!        ├─► restart_count > max_restarts → exit (WorkerExhausted)
//!        └─► sleep(backoff_for(restart_count)), aborted by cancellation
//! }
//! ```
//!
//! Executions of one worker are strictly sequential. The supervisor never
//! starts a new loop for a worker until the previous one has returned.

use crate::config::SupervisorConfig;
use crate::error::WorkerPanic;
use crate::events::SupervisorEvent;
use crate::policy::RestartPolicy;
use futures::future::BoxFuture;
use futures::FutureExt;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use session_guard_core::{spawn_detached, BoxError, SharedError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::select;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Type-erased work function. It receives the worker's cancellation token
/// and returns `Ok(())` for a graceful finish or an error to request a
/// restart.
pub type WorkFn =
    Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Point-in-time view of one worker.
#[derive(Debug, Clone)]
pub struct WorkerStatus {
    /// Unique id the worker was registered under.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether an execution loop is currently active.
    pub running: bool,
    /// Failures counted since registration or the last manual restart.
    pub restart_count: u32,
    /// The most recent error returned by the work function.
    pub last_error: Option<SharedError>,
    /// When the most recently scheduled restart was due to run.
    pub last_restart: Option<Instant>,
}

#[derive(Default)]
struct Progress {
    restart_count: u32,
    last_error: Option<SharedError>,
    last_restart: Option<Instant>,
}

pub(crate) struct Worker {
    pub(crate) id: String,
    pub(crate) name: String,
    work: WorkFn,
    pub(crate) policy: RestartPolicy,
    running: AtomicBool,
    progress: Mutex<Progress>,
}

impl Worker {
    pub(crate) fn new(id: String, name: String, work: WorkFn, policy: RestartPolicy) -> Self {
        Self {
            id,
            name,
            work,
            policy,
            running: AtomicBool::new(false),
            progress: Mutex::new(Progress::default()),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn restart_count(&self) -> u32 {
        self.progress().restart_count
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.restart_count() > self.policy.max_restarts
    }

    pub(crate) fn reset_restarts(&self) {
        self.progress().restart_count = 0;
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        let progress = self.progress();
        WorkerStatus {
            id: self.id.clone(),
            name: self.name.clone(),
            running: self.is_running(),
            restart_count: progress.restart_count,
            last_error: progress.last_error.clone(),
            last_restart: progress.last_restart,
        }
    }

    /// Marks the worker running until the returned guard is dropped.
    pub(crate) fn begin(self: &Arc<Self>, _supervisor: &str) -> RunningGuard {
        self.running.store(true, Ordering::Release);

        #[cfg(feature = "metrics")]
        gauge!("supervisor_workers_running", "supervisor" => _supervisor.to_string()).increment(1.0);

        RunningGuard {
            worker: Arc::clone(self),
            #[cfg(feature = "metrics")]
            supervisor: _supervisor.to_string(),
        }
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_failure(&self, error: SharedError) -> u32 {
        let mut progress = self.progress();
        progress.restart_count = progress.restart_count.saturating_add(1);
        progress.last_error = Some(error);
        progress.restart_count
    }
}

/// Clears the running flag when an execution loop ends, including by panic.
pub(crate) struct RunningGuard {
    worker: Arc<Worker>,
    #[cfg(feature = "metrics")]
    supervisor: String,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.worker.running.store(false, Ordering::Release);

        #[cfg(feature = "metrics")]
        gauge!("supervisor_workers_running", "supervisor" => self.supervisor.clone()).decrement(1.0);
    }
}

/// Everything one execution loop needs.
pub(crate) struct Execution {
    pub(crate) worker: Arc<Worker>,
    pub(crate) config: Arc<SupervisorConfig>,
    pub(crate) supervisor_token: CancellationToken,
    pub(crate) token: CancellationToken,
    pub(crate) guard: RunningGuard,
}

impl Execution {
    /// Runs the worker until completion, exhaustion or cancellation.
    pub(crate) async fn run(self) {
        let worker = Arc::clone(&self.worker);

        loop {
            if self.supervisor_token.is_cancelled() {
                self.stopped();
                break;
            }

            self.emit(SupervisorEvent::WorkerStarted {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                worker_id: worker.id.clone(),
                restart_count: worker.restart_count(),
            });

            let token = self.token.clone();
            let result = AssertUnwindSafe(async { (worker.work)(token).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(WorkerPanic::from_payload(&*payload).into()));

            if self.token.is_cancelled() {
                self.stopped();
                break;
            }

            let error: SharedError = match result {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    info!(supervisor = %self.config.name, worker = %worker.name, "worker completed");

                    self.emit(SupervisorEvent::WorkerCompleted {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        worker_id: worker.id.clone(),
                    });
                    break;
                }
                Err(err) => Arc::from(err),
            };

            let restart_count = worker.record_failure(Arc::clone(&error));

            #[cfg(feature = "tracing")]
            warn!(
                supervisor = %self.config.name,
                worker = %worker.name,
                restart_count,
                max_restarts = worker.policy.max_restarts,
                error = %error,
                "worker failed"
            );

            #[cfg(feature = "metrics")]
            counter!(
                "supervisor_worker_failures_total",
                "supervisor" => self.config.name.clone(),
                "worker" => worker.id.clone()
            )
            .increment(1);

            if let Some(hook) = worker.policy.on_failure.clone() {
                let error = Arc::clone(&error);
                spawn_detached(move || hook(&*error, restart_count));
            }

            self.emit(SupervisorEvent::WorkerFailed {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                worker_id: worker.id.clone(),
                error,
                restart_count,
            });

            if restart_count > worker.policy.max_restarts {
                #[cfg(feature = "tracing")]
                warn!(
                    supervisor = %self.config.name,
                    worker = %worker.name,
                    restart_count,
                    "worker exceeded max restarts, giving up"
                );

                #[cfg(feature = "metrics")]
                counter!(
                    "supervisor_workers_exhausted_total",
                    "supervisor" => self.config.name.clone(),
                    "worker" => worker.id.clone()
                )
                .increment(1);

                self.emit(SupervisorEvent::WorkerExhausted {
                    pattern_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    worker_id: worker.id.clone(),
                    restart_count,
                });
                break;
            }

            let delay = worker.policy.backoff_for(restart_count);
            worker.progress().last_restart = Some(Instant::now() + delay);

            #[cfg(feature = "tracing")]
            debug!(supervisor = %self.config.name, worker = %worker.name, ?delay, "restart scheduled");

            self.emit(SupervisorEvent::RestartScheduled {
                pattern_name: self.config.name.clone(),
                timestamp: Instant::now(),
                worker_id: worker.id.clone(),
                delay,
                restart_count,
            });

            select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.token.cancelled() => {
                    self.stopped();
                    break;
                }
            }
        }

        drop(self.guard);
    }

    fn stopped(&self) {
        #[cfg(feature = "tracing")]
        info!(supervisor = %self.config.name, worker = %self.worker.name, "worker stopped (cancelled)");

        self.emit(SupervisorEvent::WorkerStopped {
            pattern_name: self.config.name.clone(),
            timestamp: Instant::now(),
            worker_id: self.worker.id.clone(),
        });
    }

    fn emit(&self, event: SupervisorEvent) {
        self.config.event_listeners.emit_detached(event);
    }
}
