use std::fmt;

/// Health of a monitored connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HealthStatus {
    /// No check has completed yet.
    #[default]
    Unknown,
    /// No error streak, or one shorter than the degraded threshold.
    Healthy,
    /// Error streak at or above the degraded threshold.
    Degraded,
    /// Error streak at or above the unhealthy threshold.
    Unhealthy,
}

impl HealthStatus {
    /// Derives the status from the current consecutive-error count.
    ///
    /// The status is recomputed from scratch on every check, never adjusted
    /// incrementally.
    ///
    /// ```rust
    /// use session_guard_health::HealthStatus;
    ///
    /// assert_eq!(HealthStatus::from_error_streak(0, 3, 5), HealthStatus::Healthy);
    /// assert_eq!(HealthStatus::from_error_streak(2, 3, 5), HealthStatus::Healthy);
    /// assert_eq!(HealthStatus::from_error_streak(4, 3, 5), HealthStatus::Degraded);
    /// assert_eq!(HealthStatus::from_error_streak(5, 3, 5), HealthStatus::Unhealthy);
    /// ```
    pub fn from_error_streak(
        consecutive_errors: u32,
        degraded_threshold: u32,
        unhealthy_threshold: u32,
    ) -> Self {
        if consecutive_errors == 0 {
            HealthStatus::Healthy
        } else if consecutive_errors >= unhealthy_threshold {
            HealthStatus::Unhealthy
        } else if consecutive_errors >= degraded_threshold {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    /// Check if the connection is usable (Healthy or Degraded).
    pub fn is_usable(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }

    /// Returns a short lowercase label, stable for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// For atomic storage
impl From<HealthStatus> for u8 {
    fn from(status: HealthStatus) -> u8 {
        match status {
            HealthStatus::Unknown => 0,
            HealthStatus::Healthy => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unhealthy => 3,
        }
    }
}

impl From<u8> for HealthStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => HealthStatus::Healthy,
            2 => HealthStatus::Degraded,
            3 => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }
}
