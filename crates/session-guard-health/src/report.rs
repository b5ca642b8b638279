use crate::connection::ConnectionMetrics;
use crate::status::HealthStatus;
use std::fmt;
use std::time::{Duration, Instant};

/// Human-readable snapshot of a connection's health.
///
/// The [`Display`](fmt::Display) output has a fixed layout: section order and
/// labels are stable so log scrapers can rely on them.
///
/// ```text
/// Connection Health Report
/// ========================
/// Status: healthy
/// Connected: true
/// Authenticated: true
/// Uptime: 12.5s
///
/// Messages:
///   Total: 42
///   ...
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub connected: bool,
    pub authenticated: bool,
    pub uptime: Duration,
    pub total_messages: u64,
    pub sent_messages: u64,
    pub received_messages: u64,
    pub failed_messages: u64,
    pub reconnect_attempts: u64,
    pub successful_reconnects: u64,
    /// Percentage of successful reconnects, 0 when none were attempted.
    pub reconnect_success_rate: f64,
    /// Time since the last successful reconnect.
    pub since_last_reconnect: Option<Duration>,
    pub current_latency: Duration,
    pub average_latency: Duration,
    pub consecutive_errors: u32,
    /// Message of the last recorded error.
    pub last_error: Option<String>,
    /// Time since the last recorded error.
    pub since_last_error: Option<Duration>,
}

impl HealthReport {
    /// Builds a report from a status and a metrics snapshot, measuring
    /// elapsed times against `now`.
    pub fn new(status: HealthStatus, metrics: &ConnectionMetrics, now: Instant) -> Self {
        let since = |at: Option<Instant>| at.map(|at| now.saturating_duration_since(at));
        Self {
            status,
            connected: metrics.is_connected,
            authenticated: metrics.is_authenticated,
            uptime: metrics.uptime_at(now),
            total_messages: metrics.total_messages,
            sent_messages: metrics.sent_messages,
            received_messages: metrics.received_messages,
            failed_messages: metrics.failed_messages,
            reconnect_attempts: metrics.reconnect_attempts,
            successful_reconnects: metrics.successful_reconnects,
            reconnect_success_rate: metrics.reconnect_success_rate(),
            since_last_reconnect: since(metrics.last_reconnect),
            current_latency: metrics.current_latency,
            average_latency: metrics.average_latency,
            consecutive_errors: metrics.consecutive_errors,
            last_error: metrics.last_error.as_ref().map(|err| err.to_string()),
            since_last_error: since(metrics.last_error_time),
        }
    }
}

struct Ago(Option<Duration>);

impl fmt::Display for Ago {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(elapsed) => write!(f, "{elapsed:?} ago"),
            None => f.write_str("never"),
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connection Health Report")?;
        writeln!(f, "========================")?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Connected: {}", self.connected)?;
        writeln!(f, "Authenticated: {}", self.authenticated)?;
        writeln!(f, "Uptime: {:?}", self.uptime)?;
        writeln!(f)?;
        writeln!(f, "Messages:")?;
        writeln!(f, "  Total: {}", self.total_messages)?;
        writeln!(f, "  Sent: {}", self.sent_messages)?;
        writeln!(f, "  Received: {}", self.received_messages)?;
        writeln!(f, "  Failed: {}", self.failed_messages)?;
        writeln!(f)?;
        writeln!(f, "Reconnections:")?;
        writeln!(f, "  Attempts: {}", self.reconnect_attempts)?;
        writeln!(f, "  Successful: {}", self.successful_reconnects)?;
        writeln!(f, "  Success Rate: {:.1}%", self.reconnect_success_rate)?;
        writeln!(f, "  Last Reconnect: {}", Ago(self.since_last_reconnect))?;
        writeln!(f)?;
        writeln!(f, "Latency:")?;
        writeln!(f, "  Current: {:?}", self.current_latency)?;
        writeln!(f, "  Average: {:?}", self.average_latency)?;
        writeln!(f)?;
        writeln!(f, "Errors:")?;
        writeln!(f, "  Consecutive: {}", self.consecutive_errors)?;
        writeln!(
            f,
            "  Last Error: {}",
            self.last_error.as_deref().unwrap_or("none")
        )?;
        write!(f, "  Last Error Time: {}", Ago(self.since_last_error))
    }
}
