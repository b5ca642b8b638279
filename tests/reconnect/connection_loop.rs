use session_guard_reconnect::{ExponentialBackoff, ReconnectionPolicy};
use std::io;
use std::time::Duration;
use tokio::time::Instant;

/// Refuses the first `refusals` connection attempts.
struct FlakyEndpoint {
    refusals: usize,
    attempts: usize,
}

impl FlakyEndpoint {
    async fn connect(&mut self) -> io::Result<()> {
        self.attempts += 1;
        if self.attempts <= self.refusals {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        } else {
            Ok(())
        }
    }
}

async fn connect_with(policy: &mut ReconnectionPolicy, endpoint: &mut FlakyEndpoint) -> io::Result<()> {
    loop {
        match endpoint.connect().await {
            Ok(()) => {
                policy.reset();
                return Ok(());
            }
            Err(err) if !policy.should_reconnect() => return Err(err),
            Err(_) => {
                tokio::time::sleep(policy.next_backoff()).await;
                policy.increment_attempts();
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn connects_after_backing_off() {
    let mut policy = ReconnectionPolicy::builder()
        .max_attempts(5)
        .backoff(ExponentialBackoff::new(Duration::from_millis(100)))
        .build();
    let mut endpoint = FlakyEndpoint {
        refusals: 3,
        attempts: 0,
    };

    let started = Instant::now();
    connect_with(&mut policy, &mut endpoint).await.unwrap();

    // 100 + 200 + 400
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(700) && elapsed < Duration::from_millis(705));
    assert_eq!(endpoint.attempts, 4);
    assert_eq!(policy.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn gives_up_when_budget_is_spent() {
    let mut policy = ReconnectionPolicy::new(2, Duration::from_secs(1));
    let mut endpoint = FlakyEndpoint {
        refusals: usize::MAX,
        attempts: 0,
    };

    let started = Instant::now();
    let err = connect_with(&mut policy, &mut endpoint).await.unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    assert_eq!(endpoint.attempts, 3);
    assert_eq!(policy.attempts(), 2);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_millis(2005));
}
