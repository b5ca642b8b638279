use session_guard_health::{HealthMonitor, HealthStatus};
use std::io;
use std::time::Duration;

#[tokio::test]
async fn report_summarizes_a_session() {
    let monitor = HealthMonitor::builder()
        .name("feed")
        .health_check(|| async { Err::<(), _>(io::Error::other("pong timeout")) })
        .build();

    monitor.record_reconnect_attempt(false);
    monitor.record_reconnect_attempt(true);
    monitor.record_connection_established();
    monitor.record_authentication(true);
    for _ in 0..3 {
        monitor.record_message_sent();
    }
    monitor.record_message_received();
    monitor.record_latency(Duration::from_millis(8));
    monitor.record_latency(Duration::from_millis(12));
    monitor.check_now().await;

    let report = monitor.report();
    assert_eq!(report.status, HealthStatus::Healthy);
    assert!(report.connected);
    assert!(report.authenticated);
    assert_eq!(report.total_messages, 4);
    assert_eq!(report.sent_messages, 3);
    assert_eq!(report.received_messages, 1);
    assert_eq!(report.reconnect_success_rate, 50.0);
    assert_eq!(report.current_latency, Duration::from_millis(12));
    assert_eq!(report.average_latency, Duration::from_millis(10));
    assert_eq!(report.consecutive_errors, 1);
    assert_eq!(report.last_error.as_deref(), Some("pong timeout"));
    assert!(report.since_last_error.is_some());

    let text = monitor.health_report();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Connection Health Report");
    assert_eq!(lines[2], "Status: healthy");
    assert_eq!(lines[3], "Connected: true");
    assert_eq!(lines[4], "Authenticated: true");
    assert!(lines.contains(&"  Total: 4"));
    assert!(lines.contains(&"  Success Rate: 50.0%"));
    assert!(lines.contains(&"  Current: 12ms"));
    assert!(lines.contains(&"  Average: 10ms"));
    assert!(lines.contains(&"  Consecutive: 1"));
    assert!(lines.contains(&"  Last Error: pong timeout"));
}

#[test]
fn lost_connection_shows_in_report() {
    let monitor = HealthMonitor::new(Duration::from_secs(30));
    monitor.record_connection_established();
    monitor.record_authentication(true);
    monitor.record_connection_lost();

    let text = monitor.health_report();
    assert!(text.contains("Connected: false\n"));
    assert!(text.contains("Authenticated: false\n"));
    assert!(text.contains("  Last Reconnect: never\n"));
}

#[test]
fn snapshots_are_independent_copies() {
    let monitor = HealthMonitor::new(Duration::from_secs(30));
    monitor.record_message_sent();
    let before = monitor.metrics();
    monitor.record_message_sent();

    assert_eq!(before.sent_messages, 1);
    assert_eq!(monitor.metrics().sent_messages, 2);
}
