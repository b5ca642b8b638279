use session_guard_health::{HealthEvent, HealthMonitor, HealthStatus};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn monitor_with_switch(interval: Duration) -> (HealthMonitor, Arc<AtomicBool>, Arc<AtomicUsize>) {
    let failing = Arc::new(AtomicBool::new(false));
    let probes = Arc::new(AtomicUsize::new(0));
    let (flag, counter) = (Arc::clone(&failing), Arc::clone(&probes));
    let monitor = HealthMonitor::builder()
        .name("feed")
        .check_interval(interval)
        .health_check(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let fail = flag.load(Ordering::SeqCst);
            async move {
                if fail {
                    Err(io::Error::other("no pong"))
                } else {
                    Ok(())
                }
            }
        })
        .build();
    (monitor, failing, probes)
}

#[tokio::test(start_paused = true)]
async fn periodic_probes_degrade_and_recover() {
    let interval = Duration::from_secs(1);
    let (monitor, failing, probes) = monitor_with_switch(interval);
    failing.store(true, Ordering::SeqCst);
    monitor.start();

    // Ticks at 1s..=4s: four failures.
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(probes.load(Ordering::SeqCst), 4);
    assert_eq!(monitor.status(), HealthStatus::Degraded);

    tokio::time::sleep(interval).await;
    assert_eq!(monitor.status(), HealthStatus::Unhealthy);

    failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(interval).await;
    assert_eq!(monitor.status(), HealthStatus::Healthy);
    assert_eq!(monitor.metrics().consecutive_errors, 0);

    monitor.stop().await;
}

#[tokio::test]
async fn default_thresholds_map_streaks() {
    let monitor = HealthMonitor::new(Duration::from_secs(30));
    let expected = [
        (0, HealthStatus::Healthy),
        (1, HealthStatus::Healthy),
        (2, HealthStatus::Healthy),
        (3, HealthStatus::Degraded),
        (4, HealthStatus::Degraded),
        (5, HealthStatus::Unhealthy),
        (9, HealthStatus::Unhealthy),
    ];

    for (errors, status) in expected {
        monitor.record_message_sent();
        for _ in 0..errors {
            monitor.record_message_failed();
        }
        assert_eq!(monitor.check_now().await, status, "{errors} errors");
    }
}

#[tokio::test]
async fn traffic_success_clears_probe_failures() {
    let (monitor, failing, _) = monitor_with_switch(Duration::from_secs(30));
    failing.store(true, Ordering::SeqCst);
    for _ in 0..5 {
        monitor.check_now().await;
    }
    assert!(monitor.is_unhealthy());

    monitor.record_reconnect_attempt(true);
    assert_eq!(monitor.metrics().consecutive_errors, 0);
    // Status follows on the next check, which fails once more.
    assert!(monitor.is_unhealthy());
    assert_eq!(monitor.check_now().await, HealthStatus::Healthy);
    assert_eq!(monitor.metrics().consecutive_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_probes_do_not_stack_up() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (active, highest) = (Arc::clone(&running), Arc::clone(&peak));
    let monitor = HealthMonitor::builder()
        .check_interval(Duration::from_secs(1))
        .health_check(move || {
            let active = Arc::clone(&active);
            let highest = Arc::clone(&highest);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                highest.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2500)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, io::Error>(())
            }
        })
        .build();

    monitor.start();
    tokio::time::sleep(Duration::from_secs(10)).await;
    monitor.stop().await;

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_abandons_a_probe_in_flight() {
    let monitor = HealthMonitor::builder()
        .check_interval(Duration::from_secs(1))
        .health_check(|| std::future::pending::<Result<(), io::Error>>())
        .build();
    monitor.start();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    tokio::time::timeout(Duration::from_secs(1), monitor.stop())
        .await
        .expect("stop should not wait for the probe");
    assert!(!monitor.is_running());
    assert_eq!(monitor.status(), HealthStatus::Unknown);
}

#[tokio::test]
async fn probe_events_describe_outcomes() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let failing = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&failing);
    let monitor = HealthMonitor::builder()
        .name("probe-events")
        .health_check(move || {
            let fail = flag.load(Ordering::SeqCst);
            async move {
                if fail {
                    Err(io::Error::other("no pong"))
                } else {
                    Ok(())
                }
            }
        })
        .on_event(move |event: &HealthEvent| {
            let summary = match event {
                HealthEvent::CheckFailed {
                    error,
                    consecutive_errors,
                    ..
                } => format!("failed:{}:{consecutive_errors}", error.as_label()),
                HealthEvent::CheckSucceeded { .. } => "succeeded".to_string(),
                HealthEvent::StatusChanged { from, to, .. } => format!("{from}->{to}"),
            };
            let _ = tx.send(summary);
        })
        .build();

    monitor.check_now().await;
    failing.store(false, Ordering::SeqCst);
    monitor.check_now().await;

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(rx.recv().await.unwrap());
    }
    seen.sort();
    assert_eq!(
        seen,
        vec![
            "failed:probe_failed:1".to_string(),
            "succeeded".to_string(),
            "unknown->healthy".to_string(),
        ]
    );
}
