//! Property tests for the health monitor.
//!
//! Invariants tested:
//! - Status is a pure function of the consecutive-error count
//! - The latency window never exceeds its capacity
//! - The average latency is the mean of exactly the retained samples

use proptest::prelude::*;
use session_guard_health::{HealthMonitor, HealthStatus};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Property: default thresholds partition error counts into the three statuses
    #[test]
    fn status_from_default_thresholds(errors in 0u32..=1_000) {
        let status = HealthStatus::from_error_streak(errors, 3, 5);
        let expected = match errors {
            0..=2 => HealthStatus::Healthy,
            3 | 4 => HealthStatus::Degraded,
            _ => HealthStatus::Unhealthy,
        };
        prop_assert_eq!(status, expected);
    }

    /// Property: arbitrary ordered thresholds partition error counts consistently
    #[test]
    fn status_from_any_thresholds(
        errors in 0u32..=100,
        degraded in 1u32..=50,
        gap in 0u32..=50,
    ) {
        let unhealthy = degraded + gap;
        let status = HealthStatus::from_error_streak(errors, degraded, unhealthy);
        if errors == 0 || errors < degraded {
            prop_assert_eq!(status, HealthStatus::Healthy);
        } else if errors < unhealthy {
            prop_assert_eq!(status, HealthStatus::Degraded);
        } else {
            prop_assert_eq!(status, HealthStatus::Unhealthy);
        }
    }

    /// Property: the window keeps the newest samples and averages exactly those
    #[test]
    fn latency_window_mean(
        capacity in 1usize..=20,
        samples in prop::collection::vec(0u64..=10_000, 1..60),
    ) {
        let monitor = HealthMonitor::builder().latency_window(capacity).build();
        for micros in &samples {
            monitor.record_latency(Duration::from_micros(*micros));
        }

        let retained = monitor.latency_samples();
        let kept = samples.len().min(capacity);
        prop_assert_eq!(retained.len(), kept);

        let expected: Vec<Duration> = samples[samples.len() - kept..]
            .iter()
            .map(|micros| Duration::from_micros(*micros))
            .collect();
        prop_assert_eq!(&retained, &expected);

        let total_nanos: u128 = expected.iter().map(Duration::as_nanos).sum();
        let mean = Duration::from_nanos((total_nanos / kept as u128) as u64);
        let metrics = monitor.metrics();
        prop_assert_eq!(metrics.average_latency, mean);
        prop_assert_eq!(metrics.current_latency, *expected.last().unwrap());
    }
}
