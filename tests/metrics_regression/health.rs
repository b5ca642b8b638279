//! Health monitor metrics regression tests

use super::helpers::*;
use serial_test::serial;
use session_guard_health::HealthMonitor;
use std::io;

#[tokio::test]
#[serial]
async fn health_metrics_exist() {
    init_recorder();

    let monitor = HealthMonitor::builder()
        .name("metrics_health")
        .degraded_threshold(1)
        .health_check(|| async { Err::<(), _>(io::Error::other("no pong")) })
        .build();

    monitor.record_message_sent();
    monitor.record_message_received();
    monitor.record_message_failed();
    monitor.check_now().await;

    assert_counter_exists("health_messages_total");
    assert_metric_has_label("health_messages_total", "monitor", "metrics_health");
    assert_metric_has_label("health_messages_total", "direction", "sent");
    assert_metric_has_label("health_messages_total", "direction", "received");
    assert_metric_has_label("health_messages_total", "direction", "failed");

    assert_counter_exists("health_checks_total");
    assert_metric_has_label("health_checks_total", "outcome", "failure");

    // Two consecutive errors with a degraded threshold of 1.
    assert_gauge_exists("health_status");
    assert_eq!(
        gauge_value("health_status", "monitor", "metrics_health"),
        Some(2.0)
    );
}
