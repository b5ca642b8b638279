//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - Opens exactly once after `max_failures` consecutive failures
//! - Interleaved successes keep it closed as long as no streak reaches the threshold
//! - Half-open admits exactly `half_open_requests` trials
//! - A single trial failure reopens regardless of earlier trial successes

use proptest::prelude::*;
use session_guard_circuitbreaker::{CircuitBreaker, CircuitState};
use std::time::Duration;

fn half_open(max_failures: usize, half_open_requests: usize) -> CircuitBreaker {
    let breaker = CircuitBreaker::builder()
        .max_failures(max_failures)
        .reset_timeout(Duration::ZERO)
        .half_open_requests(half_open_requests)
        .build();
    for _ in 0..max_failures {
        breaker.record_failure();
    }
    breaker
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Property: the breaker opens exactly when the streak reaches the threshold
    #[test]
    fn opens_on_consecutive_failures(max_failures in 1usize..=20) {
        let breaker = CircuitBreaker::new(max_failures, Duration::from_secs(60));
        for i in 1..=max_failures {
            prop_assert!(breaker.can_attempt());
            breaker.record_failure();
            let expected = if i == max_failures { CircuitState::Open } else { CircuitState::Closed };
            prop_assert_eq!(breaker.state(), expected);
        }
        prop_assert!(!breaker.can_attempt());
    }

    /// Property: the state after any outcome sequence is determined by the longest failure run
    #[test]
    fn state_tracks_failure_runs(
        max_failures in 1usize..=8,
        outcomes in prop::collection::vec(any::<bool>(), 0..60),
    ) {
        let breaker = CircuitBreaker::new(max_failures, Duration::from_secs(60));
        let mut streak = 0;
        let mut tripped = false;

        for success in outcomes {
            if tripped {
                prop_assert!(!breaker.can_attempt());
                continue;
            }
            prop_assert!(breaker.can_attempt());
            if success {
                breaker.record_success();
                streak = 0;
            } else {
                breaker.record_failure();
                streak += 1;
                tripped = streak >= max_failures;
            }
            let expected = if tripped { CircuitState::Open } else { CircuitState::Closed };
            prop_assert_eq!(breaker.state(), expected);
        }
    }

    /// Property: half-open admits exactly the configured number of trials
    #[test]
    fn half_open_admits_configured_trials(
        max_failures in 1usize..=5,
        half_open_requests in 1usize..=10,
        extra in 1usize..=10,
    ) {
        let breaker = half_open(max_failures, half_open_requests);
        let admitted = (0..half_open_requests + extra)
            .filter(|_| breaker.can_attempt())
            .count();
        prop_assert_eq!(admitted, half_open_requests);
        prop_assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    /// Property: one trial failure reopens no matter how many trials succeeded
    #[test]
    fn trial_failure_reopens(
        half_open_requests in 2usize..=10,
        successes_before in 0usize..10,
    ) {
        let successes_before = successes_before.min(half_open_requests - 1);
        let breaker = half_open(1, half_open_requests);

        for _ in 0..successes_before {
            prop_assert!(breaker.can_attempt());
            breaker.record_success();
        }
        prop_assert!(breaker.can_attempt());
        breaker.record_failure();
        prop_assert_eq!(breaker.state(), CircuitState::Open);
    }

    /// Property: enough trial successes close the circuit with cleared counters
    #[test]
    fn trial_successes_close(half_open_requests in 1usize..=10) {
        let breaker = half_open(1, half_open_requests);
        for _ in 0..half_open_requests {
            prop_assert!(breaker.can_attempt());
            breaker.record_success();
        }
        let stats = breaker.stats();
        prop_assert_eq!(stats.state, CircuitState::Closed);
        prop_assert_eq!(stats.failures, 0);
        prop_assert_eq!(stats.successes, 0);
    }
}
