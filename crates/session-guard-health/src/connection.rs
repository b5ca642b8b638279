use session_guard_core::SharedError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Point-in-time copy of a connection's counters, flags and error state.
#[derive(Debug, Clone, Default)]
pub struct ConnectionMetrics {
    /// Messages sent plus messages received.
    pub total_messages: u64,
    /// Messages recorded as sent.
    pub sent_messages: u64,
    /// Messages recorded as received.
    pub received_messages: u64,
    /// Messages that failed to send or decode. Not part of the total.
    pub failed_messages: u64,
    /// Reconnection attempts, successful or not.
    pub reconnect_attempts: u64,
    /// Reconnection attempts that succeeded.
    pub successful_reconnects: u64,

    /// When a message was last sent.
    pub last_message_sent: Option<Instant>,
    /// When a message was last received.
    pub last_message_received: Option<Instant>,
    /// When the last successful reconnection happened.
    pub last_reconnect: Option<Instant>,
    /// When the current connection was established.
    pub connection_established: Option<Instant>,

    /// Whether the connection is currently up.
    pub is_connected: bool,
    /// Whether the session is authenticated. Cleared when the connection is lost.
    pub is_authenticated: bool,
    /// Most recent latency sample.
    pub current_latency: Duration,
    /// Arithmetic mean of the retained latency samples.
    pub average_latency: Duration,

    /// Failures since the last recorded success.
    pub consecutive_errors: u32,
    /// Most recent probe error.
    pub last_error: Option<SharedError>,
    /// When the most recent probe error was recorded.
    pub last_error_time: Option<Instant>,
}

impl ConnectionMetrics {
    /// Successful reconnects as a percentage of attempts, 0 when none were made.
    pub fn reconnect_success_rate(&self) -> f64 {
        if self.reconnect_attempts == 0 {
            return 0.0;
        }
        self.successful_reconnects as f64 / self.reconnect_attempts as f64 * 100.0
    }

    /// Time since the connection was established, zero if it never was.
    pub fn uptime_at(&self, now: Instant) -> Duration {
        self.connection_established
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default()
    }
}

/// Bounded window of the most recent latency samples.
#[derive(Debug, Clone)]
pub(crate) struct LatencyWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl LatencyWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a sample, evicting the oldest beyond capacity, and returns the
    /// mean of the retained samples.
    pub(crate) fn push(&mut self, sample: Duration) -> Duration {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.average()
    }

    pub(crate) fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let total: u128 = self.samples.iter().map(Duration::as_nanos).sum();
        let mean = total / self.samples.len() as u128;
        Duration::from_nanos(u64::try_from(mean).unwrap_or(u64::MAX))
    }

    pub(crate) fn samples(&self) -> Vec<Duration> {
        self.samples.iter().copied().collect()
    }
}
