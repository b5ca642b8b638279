use crate::events::SupervisorEvent;
use session_guard_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a [`TaskSupervisor`](crate::TaskSupervisor).
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub(crate) name: String,
    pub(crate) shutdown_grace: Duration,
    pub(crate) event_listeners: EventListeners<SupervisorEvent>,
}

impl SupervisorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::new()
    }

    /// Name used in logs, metrics labels and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How long `stop` and `restart_worker` wait for workers to exit.
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfigBuilder::new().into_config()
    }
}

/// Builder for a [`TaskSupervisor`](crate::TaskSupervisor).
pub struct SupervisorConfigBuilder {
    name: String,
    shutdown_grace: Duration,
    event_listeners: EventListeners<SupervisorEvent>,
}

impl SupervisorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            shutdown_grace: Duration::from_secs(10),
            event_listeners: EventListeners::new(),
        }
    }

    /// Give this supervisor a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Sets how long shutdown waits for workers to exit before giving up on
    /// them.
    ///
    /// Default: 10 seconds
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Registers a listener receiving every lifecycle event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&SupervisorEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Registers a callback invoked with `(worker_id, restart_count)` when a
    /// worker exhausts its restart budget.
    pub fn on_worker_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, u32) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &SupervisorEvent| {
                if let SupervisorEvent::WorkerExhausted {
                    worker_id,
                    restart_count,
                    ..
                } = event
                {
                    f(worker_id, *restart_count);
                }
            }));
        self
    }

    /// Finishes the configuration without building a supervisor.
    pub fn into_config(self) -> SupervisorConfig {
        SupervisorConfig {
            name: self.name,
            shutdown_grace: self.shutdown_grace,
            event_listeners: self.event_listeners,
        }
    }

    /// Builds the supervisor.
    pub fn build(self) -> crate::TaskSupervisor {
        crate::TaskSupervisor::with_config(self.into_config())
    }
}

impl Default for SupervisorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
