use super::RemoteError;
use session_guard_circuitbreaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
use std::time::Duration;

#[test]
fn opens_exactly_at_max_failures() {
    for max in 1..=6 {
        let breaker = CircuitBreaker::new(max, Duration::from_secs(60));
        for _ in 0..max - 1 {
            assert!(breaker.can_attempt());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Closed, "max_failures = {max}");

        assert!(breaker.can_attempt());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open, "max_failures = {max}");
        assert!(!breaker.can_attempt());
    }
}

#[test]
fn success_clears_the_failure_streak() {
    let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
    breaker.record_failure();
    breaker.record_failure();
    breaker.record_success();
    assert_eq!(breaker.stats().failures, 0);

    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn record_result_classifies_outcomes() {
    let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
    breaker.record_result(&Err::<(), _>(RemoteError("timeout")));
    breaker.record_result(&Ok::<_, RemoteError>(()));
    breaker.record_result(&Err::<(), _>(RemoteError("timeout")));
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.record_result(&Err::<(), _>(RemoteError("timeout")));
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn rejected_calls_are_not_counted_as_failures() {
    let breaker = CircuitBreaker::new(1, Duration::from_secs(60));
    let _ = breaker.call(|| Err::<(), _>(RemoteError("down")));
    let failures = breaker.stats().failures;

    for _ in 0..5 {
        let result = breaker.call(|| Ok::<_, RemoteError>(()));
        assert!(matches!(result, Err(CircuitBreakerError::OpenCircuit)));
    }
    assert_eq!(breaker.stats().failures, failures);
}

#[test]
fn builder_clamps_zero_thresholds() {
    let breaker = CircuitBreaker::builder()
        .max_failures(0)
        .half_open_requests(0)
        .build();
    assert_eq!(breaker.config().max_failures(), 1);
    assert_eq!(breaker.config().half_open_requests(), 1);

    breaker.record_failure();
    assert!(breaker.is_open());
}
