//! Connection health monitoring.
//!
//! A [`HealthMonitor`] folds two signals into one advisory [`HealthStatus`]:
//!
//! - **traffic**: messages sent, received and failed, reconnect attempts,
//!   latency samples, recorded by the connection as they happen
//! - **probes**: an optional async health check run on a fixed interval
//!
//! Each check recomputes the status from the current consecutive-error count
//! alone, so a status change is observed exactly once as `old -> new`:
//!
//! | consecutive errors                  | status        |
//! |-------------------------------------|---------------|
//! | 0                                   | `Healthy`     |
//! | below the degraded threshold        | `Healthy`     |
//! | from degraded up to unhealthy       | `Degraded`    |
//! | at or above the unhealthy threshold | `Unhealthy`   |
//!
//! Failures recorded from traffic raise the count immediately, but the status
//! only follows on the next check. Any recorded success clears the count.
//!
//! ## Usage
//!
//! ```rust
//! use session_guard_health::{HealthMonitor, HealthStatus};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let monitor = HealthMonitor::builder()
//!     .name("market-feed")
//!     .check_interval(Duration::from_secs(15))
//!     .probe_timeout(Duration::from_secs(2))
//!     .health_check(|| async { Ok::<_, std::io::Error>(()) })
//!     .on_status_change(|from, to| println!("feed {from} -> {to}"))
//!     .build();
//!
//! monitor.record_connection_established();
//! monitor.record_message_received();
//! monitor.record_latency(Duration::from_millis(12));
//!
//! assert_eq!(monitor.check_now().await, HealthStatus::Healthy);
//! println!("{}", monitor.health_report());
//!
//! monitor.start();
//! monitor.stop().await;
//! # }
//! ```
//!
//! ## Feature flags
//! - `tracing`: logs probe failures and status changes
//! - `metrics`: records a status gauge plus probe and message counters
//! - `serde`: derives `Serialize`/`Deserialize` for [`HealthStatus`]

pub use config::{HealthMonitorConfig, HealthMonitorConfigBuilder, ProbeFn, StatusChangeHandler};
pub use connection::ConnectionMetrics;
pub use error::HealthCheckError;
pub use events::HealthEvent;
pub use monitor::HealthMonitor;
pub use report::HealthReport;
pub use status::HealthStatus;

mod config;
mod connection;
mod error;
mod events;
mod monitor;
mod report;
mod status;

#[cfg(feature = "metrics")]
static METRICS_INIT: std::sync::Once = std::sync::Once::new();

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    use metrics::{describe_counter, describe_gauge};

    METRICS_INIT.call_once(|| {
        describe_gauge!(
            "health_status",
            "Current health status (0=unknown, 1=healthy, 2=degraded, 3=unhealthy)"
        );
        describe_counter!(
            "health_checks_total",
            "Total number of health probes by outcome"
        );
        describe_counter!(
            "health_messages_total",
            "Total number of messages recorded by direction (sent, received, failed)"
        );
    });
}
