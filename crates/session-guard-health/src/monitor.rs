use crate::config::{erase_probe, HealthMonitorConfig, HealthMonitorConfigBuilder, ProbeFn, StatusChangeHandler};
use crate::error::HealthCheckError;
use crate::events::HealthEvent;
use crate::connection::{ConnectionMetrics, LatencyWindow};
use crate::report::HealthReport;
use crate::status::HealthStatus;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use session_guard_core::{spawn_detached, BoxError};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::select;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

struct State {
    metrics: ConnectionMetrics,
    latency: LatencyWindow,
}

struct Checker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    config: HealthMonitorConfig,
    status: AtomicU8,
    state: Mutex<State>,
    probe: Mutex<Option<ProbeFn>>,
    on_status_change: Mutex<Option<StatusChangeHandler>>,
    checker: Mutex<Option<Checker>>,
}

/// Aggregates traffic events and periodic probe results into one
/// [`HealthStatus`].
///
/// Cloning is cheap; clones share the same metrics and status.
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HealthMonitor {
    /// Creates a monitor checking every `check_interval` with default
    /// thresholds.
    pub fn new(check_interval: Duration) -> Self {
        HealthMonitorConfigBuilder::new()
            .check_interval(check_interval)
            .build()
    }

    /// Returns a builder for a configured monitor.
    pub fn builder() -> HealthMonitorConfigBuilder {
        HealthMonitorConfigBuilder::new()
    }

    /// Creates a monitor from a finished configuration.
    pub fn with_config(config: HealthMonitorConfig) -> Self {
        #[cfg(feature = "metrics")]
        crate::describe_metrics();

        let latency = LatencyWindow::new(config.latency_window);
        let probe = config.probe.clone();
        let on_status_change = config.on_status_change.clone();
        Self {
            inner: Arc::new(Inner {
                config,
                status: AtomicU8::new(HealthStatus::Unknown.into()),
                state: Mutex::new(State {
                    metrics: ConnectionMetrics::default(),
                    latency,
                }),
                probe: Mutex::new(probe),
                on_status_change: Mutex::new(on_status_change),
                checker: Mutex::new(None),
            }),
        }
    }

    /// Returns the configuration this monitor was built with.
    pub fn config(&self) -> &HealthMonitorConfig {
        &self.inner.config
    }

    /// Spawns the periodic checker. The first check runs one full interval
    /// after this call. Starting a running monitor does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) {
        let mut checker = lock(&self.inner.checker);
        if checker.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let period = self.inner.config.check_interval;
        let handle = tokio::spawn(run_checks(
            Arc::downgrade(&self.inner),
            period,
            token.clone(),
        ));
        *checker = Some(Checker { token, handle });

        #[cfg(feature = "tracing")]
        info!(monitor = %self.inner.config.name, ?period, "health monitor started");
    }

    /// Stops the periodic checker and waits for it to exit. A check in
    /// progress is abandoned. Stopping a stopped monitor does nothing.
    pub async fn stop(&self) {
        let checker = lock(&self.inner.checker).take();
        let Some(Checker { token, handle }) = checker else {
            return;
        };
        token.cancel();
        let _ = handle.await;

        #[cfg(feature = "tracing")]
        info!(monitor = %self.inner.config.name, "health monitor stopped");
    }

    /// Returns whether the periodic checker is running.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.checker).is_some()
    }

    /// Replaces the probe run on every check.
    pub fn set_health_check<F, Fut, E>(&self, probe: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        *lock(&self.inner.probe) = Some(erase_probe(probe));
    }

    /// Replaces the callback invoked with `(old, new)` on status changes.
    pub fn set_status_change_handler<F>(&self, handler: F)
    where
        F: Fn(HealthStatus, HealthStatus) + Send + Sync + 'static,
    {
        *lock(&self.inner.on_status_change) = Some(Arc::new(handler));
    }

    /// Runs one check now: the probe, if any, then a status recomputation.
    ///
    /// This is exactly what the periodic checker does on every tick. Without
    /// a probe only the recomputation happens, which reconciles failures
    /// recorded from traffic since the last check.
    pub async fn check_now(&self) -> HealthStatus {
        let probe = lock(&self.inner.probe).clone();

        if let Some(probe) = probe {
            let started = Instant::now();
            let outcome = match self.inner.config.probe_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, probe()).await {
                    Ok(result) => result.map_err(|err| HealthCheckError::Probe(Arc::from(err))),
                    Err(_) => Err(HealthCheckError::Timeout { timeout }),
                },
                None => probe()
                    .await
                    .map_err(|err| HealthCheckError::Probe(Arc::from(err))),
            };
            self.record_probe(outcome, started.elapsed());
        }

        // Streak read and status swap happen under the same lock.
        let (status, previous) = {
            let state = lock(&self.inner.state);
            let status = HealthStatus::from_error_streak(
                state.metrics.consecutive_errors,
                self.inner.config.degraded_threshold,
                self.inner.config.unhealthy_threshold,
            );
            let previous = self.inner.status.swap(status.into(), Ordering::AcqRel);
            (status, HealthStatus::from(previous))
        };
        if previous != status {
            self.status_changed(previous, status);
        }
        status
    }

    /// Records a sent message. Counts as a success.
    pub fn record_message_sent(&self) {
        {
            let mut state = lock(&self.inner.state);
            let metrics = &mut state.metrics;
            metrics.total_messages += 1;
            metrics.sent_messages += 1;
            metrics.last_message_sent = Some(Instant::now());
            metrics.consecutive_errors = 0;
        }
        self.count_message("sent");
    }

    /// Records a received message. Counts as a success.
    pub fn record_message_received(&self) {
        {
            let mut state = lock(&self.inner.state);
            let metrics = &mut state.metrics;
            metrics.total_messages += 1;
            metrics.received_messages += 1;
            metrics.last_message_received = Some(Instant::now());
            metrics.consecutive_errors = 0;
        }
        self.count_message("received");
    }

    /// Records a failed message and extends the error streak. The status is
    /// reconciled on the next check.
    pub fn record_message_failed(&self) {
        {
            let mut state = lock(&self.inner.state);
            let metrics = &mut state.metrics;
            metrics.failed_messages += 1;
            metrics.consecutive_errors = metrics.consecutive_errors.saturating_add(1);
        }
        self.count_message("failed");
    }

    /// Records a reconnection attempt. A successful one clears the error
    /// streak.
    pub fn record_reconnect_attempt(&self, success: bool) {
        let mut state = lock(&self.inner.state);
        let metrics = &mut state.metrics;
        metrics.reconnect_attempts += 1;
        if success {
            metrics.successful_reconnects += 1;
            metrics.last_reconnect = Some(Instant::now());
            metrics.consecutive_errors = 0;
        }
    }

    /// Records that a connection was established. Counts as a success.
    pub fn record_connection_established(&self) {
        let mut state = lock(&self.inner.state);
        let metrics = &mut state.metrics;
        metrics.connection_established = Some(Instant::now());
        metrics.is_connected = true;
        metrics.consecutive_errors = 0;
    }

    /// Records that the connection was lost. Authentication is lost with it.
    pub fn record_connection_lost(&self) {
        let mut state = lock(&self.inner.state);
        state.metrics.is_connected = false;
        state.metrics.is_authenticated = false;
    }

    /// Records whether the session is authenticated.
    pub fn record_authentication(&self, authenticated: bool) {
        lock(&self.inner.state).metrics.is_authenticated = authenticated;
    }

    /// Records a latency sample, updating the current and average latency.
    pub fn record_latency(&self, latency: Duration) {
        let mut state = lock(&self.inner.state);
        let average = state.latency.push(latency);
        state.metrics.current_latency = latency;
        state.metrics.average_latency = average;
    }

    /// Current status, read without taking a lock.
    pub fn status(&self) -> HealthStatus {
        HealthStatus::from(self.inner.status.load(Ordering::Acquire))
    }

    /// Returns a copy of the current metrics.
    pub fn metrics(&self) -> ConnectionMetrics {
        lock(&self.inner.state).metrics.clone()
    }

    /// Latency samples currently retained, oldest first.
    pub fn latency_samples(&self) -> Vec<Duration> {
        lock(&self.inner.state).latency.samples()
    }

    /// Returns a structured health report.
    pub fn report(&self) -> HealthReport {
        HealthReport::new(self.status(), &self.metrics(), Instant::now())
    }

    /// Returns the health report rendered in its fixed text layout.
    pub fn health_report(&self) -> String {
        self.report().to_string()
    }

    /// Returns true when the status is [`HealthStatus::Healthy`].
    pub fn is_healthy(&self) -> bool {
        self.status() == HealthStatus::Healthy
    }

    /// Returns true when the status is [`HealthStatus::Degraded`].
    pub fn is_degraded(&self) -> bool {
        self.status() == HealthStatus::Degraded
    }

    /// Returns true when the status is [`HealthStatus::Unhealthy`].
    pub fn is_unhealthy(&self) -> bool {
        self.status() == HealthStatus::Unhealthy
    }

    fn record_probe(&self, outcome: Result<(), HealthCheckError>, elapsed: Duration) {
        let name = &self.inner.config.name;
        match outcome {
            Ok(()) => {
                lock(&self.inner.state).metrics.consecutive_errors = 0;

                #[cfg(feature = "tracing")]
                debug!(monitor = %name, elapsed = ?elapsed, "health probe succeeded");

                #[cfg(feature = "metrics")]
                counter!("health_checks_total", "monitor" => name.clone(), "outcome" => "success")
                    .increment(1);

                self.inner
                    .config
                    .event_listeners
                    .emit_detached(HealthEvent::CheckSucceeded {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        duration: elapsed,
                    });
            }
            Err(error) => {
                let consecutive_errors = {
                    let mut state = lock(&self.inner.state);
                    let metrics = &mut state.metrics;
                    metrics.consecutive_errors = metrics.consecutive_errors.saturating_add(1);
                    metrics.last_error = Some(error.to_shared());
                    metrics.last_error_time = Some(Instant::now());
                    metrics.consecutive_errors
                };

                #[cfg(feature = "tracing")]
                warn!(monitor = %name, %error, consecutive_errors, "health probe failed");

                #[cfg(feature = "metrics")]
                counter!("health_checks_total", "monitor" => name.clone(), "outcome" => "failure")
                    .increment(1);

                self.inner
                    .config
                    .event_listeners
                    .emit_detached(HealthEvent::CheckFailed {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        error,
                        consecutive_errors,
                    });
            }
        }
    }

    fn status_changed(&self, previous: HealthStatus, status: HealthStatus) {
        #[cfg(feature = "tracing")]
        info!(monitor = %self.inner.config.name, from = %previous, to = %status, "health status changed");

        #[cfg(feature = "metrics")]
        gauge!("health_status", "monitor" => self.inner.config.name.clone())
            .set(f64::from(u8::from(status)));

        if let Some(handler) = lock(&self.inner.on_status_change).clone() {
            spawn_detached(move || handler(previous, status));
        }
        self.inner
            .config
            .event_listeners
            .emit_detached(HealthEvent::StatusChanged {
                pattern_name: self.inner.config.name.clone(),
                timestamp: Instant::now(),
                from: previous,
                to: status,
            });
    }

    fn count_message(&self, _direction: &'static str) {
        #[cfg(feature = "metrics")]
        counter!(
            "health_messages_total",
            "monitor" => self.inner.config.name.clone(),
            "direction" => _direction
        )
        .increment(1);
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("name", &self.inner.config.name)
            .field("status", &self.status())
            .finish()
    }
}

async fn run_checks(inner: Weak<Inner>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // The monitor was dropped without being stopped.
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let monitor = HealthMonitor { inner };

        select! {
            _ = token.cancelled() => break,
            _ = monitor.check_now() => {}
        }
    }
}
