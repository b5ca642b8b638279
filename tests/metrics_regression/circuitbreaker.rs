//! Circuit breaker metrics regression tests

use super::helpers::*;
use serial_test::serial;
use session_guard_circuitbreaker::CircuitBreaker;
use std::time::Duration;

#[test]
#[serial]
fn circuitbreaker_metrics_exist() {
    init_recorder();

    let breaker = CircuitBreaker::builder()
        .name("metrics_cb")
        .max_failures(2)
        .reset_timeout(Duration::from_secs(60))
        .build();

    breaker.record_success();
    breaker.record_failure();
    breaker.record_failure();
    assert!(!breaker.can_attempt());

    assert_counter_exists("circuitbreaker_calls_total");
    assert_metric_has_label("circuitbreaker_calls_total", "circuitbreaker", "metrics_cb");
    assert_metric_has_label("circuitbreaker_calls_total", "outcome", "success");
    assert_metric_has_label("circuitbreaker_calls_total", "outcome", "failure");

    assert_counter_exists("circuitbreaker_transitions_total");
    assert_metric_has_label("circuitbreaker_transitions_total", "from", "closed");
    assert_metric_has_label("circuitbreaker_transitions_total", "to", "open");

    assert_counter_exists("circuitbreaker_rejected_total");
    assert_metric_has_label("circuitbreaker_rejected_total", "circuitbreaker", "metrics_cb");

    assert_gauge_exists("circuitbreaker_state");
    assert_eq!(
        gauge_value("circuitbreaker_state", "circuitbreaker", "metrics_cb"),
        Some(1.0)
    );
}
