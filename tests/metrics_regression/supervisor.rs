//! Supervisor metrics regression tests

use super::helpers::*;
use serial_test::serial;
use session_guard_supervisor::{RestartPolicy, TaskSupervisor};
use std::io;
use std::time::Duration;

#[tokio::test(start_paused = true)]
#[serial]
async fn supervisor_metrics_exist() {
    init_recorder();

    let supervisor = TaskSupervisor::builder().name("metrics_sup").build();
    supervisor
        .register(
            "flaky",
            "Flaky",
            |_| async { Err::<(), _>(io::Error::other("boom")) },
            RestartPolicy::default()
                .max_restarts(1)
                .base_delay(Duration::from_millis(5)),
        )
        .unwrap();
    supervisor
        .register(
            "steady",
            "Steady",
            |token| async move {
                token.cancelled().await;
                Ok::<_, io::Error>(())
            },
            RestartPolicy::default(),
        )
        .unwrap();
    supervisor.start().unwrap();

    while supervisor.status()["flaky"].running {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    assert_counter_exists("supervisor_worker_failures_total");
    assert_metric_has_label("supervisor_worker_failures_total", "supervisor", "metrics_sup");
    assert_metric_has_label("supervisor_worker_failures_total", "worker", "flaky");

    assert_counter_exists("supervisor_workers_exhausted_total");
    assert_metric_has_label("supervisor_workers_exhausted_total", "worker", "flaky");

    assert_gauge_exists("supervisor_workers_running");
    assert_eq!(
        gauge_value("supervisor_workers_running", "supervisor", "metrics_sup"),
        Some(1.0)
    );

    supervisor.stop().await.unwrap();
    assert_eq!(
        gauge_value("supervisor_workers_running", "supervisor", "metrics_sup"),
        Some(0.0)
    );
}
