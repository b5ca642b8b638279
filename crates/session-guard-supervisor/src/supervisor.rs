use crate::config::{SupervisorConfig, SupervisorConfigBuilder};
use crate::error::SupervisorError;
use crate::policy::RestartPolicy;
use crate::worker::{Execution, WorkFn, Worker, WorkerStatus};
use futures::FutureExt;
use session_guard_core::BoxError;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
#[cfg(feature = "tracing")]
use tracing::{info, warn};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Aggregate counters across every registered worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorMetrics {
    /// Registered workers.
    pub total_workers: usize,
    /// Workers with an active execution loop.
    pub running_workers: usize,
    /// Workers without one (not started, completed, exhausted or stopped).
    pub stopped_workers: usize,
    /// Sum of every worker's restart count.
    pub total_restarts: u64,
    /// Workers whose restart budget is spent.
    pub exhausted_workers: usize,
}

struct WorkerSlot {
    worker: Arc<Worker>,
    token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    config: Arc<SupervisorConfig>,
    phase: AtomicU8,
    token: CancellationToken,
    tracker: TaskTracker,
    workers: Mutex<HashMap<String, WorkerSlot>>,
    restarts: tokio::sync::Mutex<()>,
}

/// Runs named long-lived workers and restarts them when they fail.
///
/// Cloning is cheap; clones control the same supervisor. Starting workers
/// spawns tokio tasks, so [`start`](Self::start) and registrations made while
/// running must happen inside a tokio runtime.
#[derive(Clone)]
pub struct TaskSupervisor {
    inner: Arc<Inner>,
}

impl TaskSupervisor {
    /// Creates a supervisor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SupervisorConfig::default())
    }

    /// Returns a builder for a configured supervisor.
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::new()
    }

    /// Creates a supervisor from a finished configuration.
    pub fn with_config(config: SupervisorConfig) -> Self {
        #[cfg(feature = "metrics")]
        crate::describe_metrics();

        Self {
            inner: Arc::new(Inner {
                config: Arc::new(config),
                phase: AtomicU8::new(IDLE),
                token: CancellationToken::new(),
                tracker: TaskTracker::new(),
                workers: Mutex::new(HashMap::new()),
                restarts: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Returns the configuration this supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    /// Registers a worker under a unique `id`.
    ///
    /// The work function is called once per execution with a token that is
    /// cancelled when the worker is stopped or restarted. A worker registered
    /// while the supervisor is running starts immediately.
    ///
    /// # Panics
    ///
    /// Registering while running outside a tokio runtime panics.
    pub fn register<F, Fut, E>(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        work: F,
        policy: RestartPolicy,
    ) -> Result<(), SupervisorError>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let work: WorkFn = Arc::new(move |token: CancellationToken| {
            let execution = work(token);
            async move { execution.await.map_err(Into::<BoxError>::into) }.boxed()
        });
        self.register_boxed(id.into(), name.into(), work, policy)
    }

    /// Registers an already type-erased work function.
    pub fn register_boxed(
        &self,
        id: String,
        name: String,
        work: WorkFn,
        policy: RestartPolicy,
    ) -> Result<(), SupervisorError> {
        let mut workers = self.workers();
        if workers.contains_key(&id) {
            return Err(SupervisorError::AlreadyRegistered { id });
        }

        #[cfg(feature = "tracing")]
        info!(supervisor = %self.inner.config.name, worker = %name, id = %id, "worker registered");

        let mut slot = WorkerSlot {
            worker: Arc::new(Worker::new(id.clone(), name, work, policy)),
            token: None,
            handle: None,
        };
        if self.is_running() {
            self.spawn(&mut slot);
        }
        workers.insert(id, slot);
        Ok(())
    }

    /// Starts every registered worker.
    ///
    /// Fails with [`SupervisorError::AlreadyRunning`] if already started and
    /// with [`SupervisorError::ShutDown`] after [`stop`](Self::stop).
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) -> Result<(), SupervisorError> {
        match self
            .inner
            .phase
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(RUNNING) => return Err(SupervisorError::AlreadyRunning),
            Err(_) => return Err(SupervisorError::ShutDown),
        }

        let mut workers = self.workers();
        for slot in workers.values_mut() {
            self.spawn(slot);
        }

        #[cfg(feature = "tracing")]
        info!(supervisor = %self.inner.config.name, workers = workers.len(), "supervisor started");

        Ok(())
    }

    /// Stops every worker and waits for them to exit.
    ///
    /// Cancels the supervisor scope and each worker's scope, then waits up to
    /// the shutdown grace. Workers still running after that are abandoned
    /// (cancellation is cooperative) and reported through
    /// [`SupervisorError::GraceExceeded`]; the supervisor is stopped either
    /// way. Calling `stop` again, or on a supervisor that never started, is a
    /// no-op.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        match self
            .inner
            .phase
            .compare_exchange(RUNNING, STOPPED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(IDLE) => {
                self.inner.phase.store(STOPPED, Ordering::Release);
                return Ok(());
            }
            Err(_) => return Ok(()),
        }

        #[cfg(feature = "tracing")]
        info!(supervisor = %self.inner.config.name, "stopping supervisor");

        self.inner.token.cancel();
        for slot in self.workers().values() {
            if let Some(token) = &slot.token {
                token.cancel();
            }
        }

        self.inner.tracker.close();
        let grace = self.inner.config.shutdown_grace;
        if tokio::time::timeout(grace, self.inner.tracker.wait())
            .await
            .is_err()
        {
            let mut stuck: Vec<String> = self
                .workers()
                .values()
                .filter(|slot| slot.worker.is_running())
                .map(|slot| slot.worker.name.clone())
                .collect();
            stuck.sort();

            #[cfg(feature = "tracing")]
            warn!(supervisor = %self.inner.config.name, ?grace, ?stuck, "timeout waiting for workers to stop");

            return Err(SupervisorError::GraceExceeded { grace, stuck });
        }

        #[cfg(feature = "tracing")]
        info!(supervisor = %self.inner.config.name, "all workers stopped gracefully");

        Ok(())
    }

    /// Restarts one worker with a fresh restart budget.
    ///
    /// The current execution is cancelled and awaited (bounded by the
    /// shutdown grace) before a new one starts, so two executions of the same
    /// worker never overlap. If the old execution does not exit in time the
    /// call fails with [`SupervisorError::GraceExceeded`] and nothing new is
    /// started. On a supervisor that is not running the budget is reset but
    /// the worker is not started.
    pub async fn restart_worker(&self, id: &str) -> Result<(), SupervisorError> {
        let _serialized = self.inner.restarts.lock().await;

        let (worker, token, handle) = {
            let mut workers = self.workers();
            let slot = workers
                .get_mut(id)
                .ok_or_else(|| SupervisorError::UnknownWorker { id: id.to_string() })?;
            (Arc::clone(&slot.worker), slot.token.take(), slot.handle.take())
        };

        if let Some(token) = &token {
            token.cancel();
        }

        if let Some(mut handle) = handle {
            let grace = self.inner.config.shutdown_grace;
            if tokio::time::timeout(grace, &mut handle).await.is_err() {
                #[cfg(feature = "tracing")]
                warn!(supervisor = %self.inner.config.name, worker = %worker.name, ?grace, "worker did not stop for restart");

                if let Some(slot) = self.workers().get_mut(id) {
                    slot.token = token;
                    slot.handle = Some(handle);
                }
                return Err(SupervisorError::GraceExceeded {
                    grace,
                    stuck: vec![worker.name.clone()],
                });
            }
        }

        worker.reset_restarts();

        #[cfg(feature = "tracing")]
        info!(supervisor = %self.inner.config.name, worker = %worker.name, "worker restarted manually");

        if self.is_running() {
            if let Some(slot) = self.workers().get_mut(id) {
                self.spawn(slot);
            }
        }
        Ok(())
    }

    /// Returns a snapshot of every worker keyed by id.
    pub fn status(&self) -> HashMap<String, WorkerStatus> {
        self.workers()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.worker.status()))
            .collect()
    }

    /// Returns false if any worker is not running or has used more than half
    /// of its restart budget.
    pub fn is_healthy(&self) -> bool {
        self.workers().values().all(|slot| {
            slot.worker.is_running()
                && slot.worker.restart_count() <= slot.worker.policy.max_restarts / 2
        })
    }

    /// Returns aggregate counters across all workers.
    pub fn metrics(&self) -> SupervisorMetrics {
        let workers = self.workers();
        let mut metrics = SupervisorMetrics {
            total_workers: workers.len(),
            ..Default::default()
        };
        for slot in workers.values() {
            if slot.worker.is_running() {
                metrics.running_workers += 1;
            } else {
                metrics.stopped_workers += 1;
            }
            if slot.worker.is_exhausted() {
                metrics.exhausted_workers += 1;
            }
            metrics.total_restarts += u64::from(slot.worker.restart_count());
        }
        metrics
    }

    /// Returns whether the supervisor has been started and not yet stopped.
    pub fn is_running(&self) -> bool {
        self.inner.phase.load(Ordering::Acquire) == RUNNING
    }

    fn workers(&self) -> MutexGuard<'_, HashMap<String, WorkerSlot>> {
        self.inner
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn(&self, slot: &mut WorkerSlot) {
        if slot.worker.is_running() {
            return;
        }
        let token = self.inner.token.child_token();
        let execution = Execution {
            worker: Arc::clone(&slot.worker),
            config: Arc::clone(&self.inner.config),
            supervisor_token: self.inner.token.clone(),
            token: token.clone(),
            guard: slot.worker.begin(&self.inner.config.name),
        };

        #[cfg(feature = "tracing")]
        info!(supervisor = %self.inner.config.name, worker = %slot.worker.name, "worker started");

        slot.token = Some(token);
        slot.handle = Some(self.inner.tracker.spawn(execution.run()));
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSupervisor")
            .field("name", &self.inner.config.name)
            .field("running", &self.is_running())
            .finish()
    }
}
