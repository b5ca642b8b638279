use crate::events::HealthEvent;
use crate::status::HealthStatus;
use futures::future::BoxFuture;
use futures::FutureExt;
use session_guard_core::{BoxError, EventListeners, FnListener};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Type-erased health probe.
pub type ProbeFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Callback invoked with `(old, new)` when the status changes.
pub type StatusChangeHandler = Arc<dyn Fn(HealthStatus, HealthStatus) + Send + Sync>;

pub(crate) fn erase_probe<F, Fut, E>(probe: F) -> ProbeFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    Arc::new(move || {
        let check = probe();
        async move { check.await.map_err(Into::<BoxError>::into) }.boxed()
    })
}

/// Configuration for a [`HealthMonitor`](crate::HealthMonitor).
#[derive(Clone)]
pub struct HealthMonitorConfig {
    pub(crate) name: String,
    pub(crate) check_interval: Duration,
    pub(crate) degraded_threshold: u32,
    pub(crate) unhealthy_threshold: u32,
    pub(crate) latency_window: usize,
    pub(crate) probe_timeout: Option<Duration>,
    pub(crate) probe: Option<ProbeFn>,
    pub(crate) on_status_change: Option<StatusChangeHandler>,
    pub(crate) event_listeners: EventListeners<HealthEvent>,
}

impl HealthMonitorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> HealthMonitorConfigBuilder {
        HealthMonitorConfigBuilder::new()
    }

    /// Name used in logs, metrics labels and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interval between periodic checks.
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Consecutive errors at which the status becomes degraded.
    pub fn degraded_threshold(&self) -> u32 {
        self.degraded_threshold
    }

    /// Consecutive errors at which the status becomes unhealthy.
    pub fn unhealthy_threshold(&self) -> u32 {
        self.unhealthy_threshold
    }

    /// Number of latency samples averaged.
    pub fn latency_window(&self) -> usize {
        self.latency_window
    }

    /// Upper bound on a single probe, if any.
    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout
    }
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        HealthMonitorConfigBuilder::new().into_config()
    }
}

impl fmt::Debug for HealthMonitorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitorConfig")
            .field("name", &self.name)
            .field("check_interval", &self.check_interval)
            .field("degraded_threshold", &self.degraded_threshold)
            .field("unhealthy_threshold", &self.unhealthy_threshold)
            .field("latency_window", &self.latency_window)
            .field("probe_timeout", &self.probe_timeout)
            .field("probe", &self.probe.is_some())
            .field("event_listeners", &self.event_listeners)
            .finish()
    }
}

/// Builder for a [`HealthMonitor`](crate::HealthMonitor).
pub struct HealthMonitorConfigBuilder {
    name: String,
    check_interval: Duration,
    degraded_threshold: u32,
    unhealthy_threshold: u32,
    latency_window: usize,
    probe_timeout: Option<Duration>,
    probe: Option<ProbeFn>,
    on_status_change: Option<StatusChangeHandler>,
    event_listeners: EventListeners<HealthEvent>,
}

impl HealthMonitorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            check_interval: Duration::from_secs(30),
            degraded_threshold: 3,
            unhealthy_threshold: 5,
            latency_window: 100,
            probe_timeout: None,
            probe: None,
            on_status_change: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Give this monitor a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Set the interval between periodic checks. Values below 1ms are
    /// treated as 1ms.
    ///
    /// Default: 30 seconds
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval.max(MIN_CHECK_INTERVAL);
        self
    }

    /// Set the consecutive-error count at which the status becomes degraded.
    ///
    /// Default: 3
    pub fn degraded_threshold(mut self, threshold: u32) -> Self {
        self.degraded_threshold = threshold;
        self
    }

    /// Set the consecutive-error count at which the status becomes unhealthy.
    /// Raised to the degraded threshold if lower.
    ///
    /// Default: 5
    pub fn unhealthy_threshold(mut self, threshold: u32) -> Self {
        self.unhealthy_threshold = threshold;
        self
    }

    /// Set how many latency samples are averaged. Values below 1 are treated
    /// as 1.
    ///
    /// Default: 100
    pub fn latency_window(mut self, samples: usize) -> Self {
        self.latency_window = samples.max(1);
        self
    }

    /// Fail probes that run longer than `timeout`.
    ///
    /// Default: none
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set the probe run on every check.
    pub fn health_check<F, Fut, E>(mut self, probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        self.probe = Some(erase_probe(probe));
        self
    }

    /// Set the callback invoked with `(old, new)` when the status changes.
    ///
    /// The callback runs on a separate execution path and may block.
    pub fn on_status_change<F>(mut self, f: F) -> Self
    where
        F: Fn(HealthStatus, HealthStatus) + Send + Sync + 'static,
    {
        self.on_status_change = Some(Arc::new(f));
        self
    }

    /// Registers a listener receiving every event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&HealthEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Finishes the configuration without building a monitor.
    pub fn into_config(self) -> HealthMonitorConfig {
        HealthMonitorConfig {
            name: self.name,
            check_interval: self.check_interval,
            degraded_threshold: self.degraded_threshold,
            unhealthy_threshold: self.unhealthy_threshold.max(self.degraded_threshold),
            latency_window: self.latency_window,
            probe_timeout: self.probe_timeout,
            probe: self.probe,
            on_status_change: self.on_status_change,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the monitor. It is not started.
    pub fn build(self) -> crate::HealthMonitor {
        crate::HealthMonitor::with_config(self.into_config())
    }
}

impl Default for HealthMonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
