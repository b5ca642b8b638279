use super::RemoteError;
use session_guard_circuitbreaker::{CircuitBreaker, CircuitState};
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

const COOLDOWN: Duration = Duration::from_millis(50);

fn tripped(half_open_requests: usize) -> CircuitBreaker {
    let breaker = CircuitBreaker::builder()
        .max_failures(1)
        .reset_timeout(COOLDOWN)
        .half_open_requests(half_open_requests)
        .build();
    breaker.record_failure();
    assert!(breaker.is_open());
    breaker
}

#[test]
fn stays_open_until_cooldown_elapses() {
    let breaker = tripped(1);
    assert!(!breaker.can_attempt());
    sleep(COOLDOWN + Duration::from_millis(20));

    assert!(breaker.can_attempt());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
}

#[test]
fn admits_only_configured_trials() {
    let breaker = tripped(2);
    sleep(COOLDOWN + Duration::from_millis(20));

    assert!(breaker.can_attempt());
    assert!(breaker.can_attempt());
    assert!(!breaker.can_attempt());
    assert_eq!(breaker.stats().half_open_attempts, 2);
}

#[test]
fn closes_after_enough_trial_successes() {
    let breaker = tripped(2);
    sleep(COOLDOWN + Duration::from_millis(20));

    assert!(breaker.call(|| Ok::<_, RemoteError>(())).is_ok());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
    assert!(breaker.call(|| Ok::<_, RemoteError>(())).is_ok());

    let stats = breaker.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.successes, 0);
}

#[test]
fn trial_failure_reopens_and_restarts_cooldown() {
    let breaker = tripped(3);
    sleep(COOLDOWN + Duration::from_millis(20));

    assert!(breaker.can_attempt());
    breaker.record_success();
    assert!(breaker.can_attempt());
    breaker.record_failure();

    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.can_attempt());
    sleep(COOLDOWN + Duration::from_millis(20));
    assert!(breaker.can_attempt());
}

#[test]
fn transitions_are_reported_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = std::sync::mpsc::channel();
    let log = Arc::clone(&seen);
    let breaker = CircuitBreaker::builder()
        .max_failures(1)
        .reset_timeout(COOLDOWN)
        .on_state_transition(move |from, to| {
            log.lock().unwrap().push((from, to));
            let _ = tx.send(());
        })
        .build();

    breaker.record_failure();
    rx.recv_timeout(Duration::from_secs(1)).unwrap();
    sleep(COOLDOWN + Duration::from_millis(20));
    assert!(breaker.can_attempt());
    rx.recv_timeout(Duration::from_secs(1)).unwrap();
    breaker.record_success();
    rx.recv_timeout(Duration::from_secs(1)).unwrap();

    // Each transition is dispatched after the previous one was observed.
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}
