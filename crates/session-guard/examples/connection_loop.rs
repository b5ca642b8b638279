//! A supervised connection loop using every component.
//!
//! A simulated market-data feed refuses the first few connection attempts,
//! then streams messages and drops the connection every so often. The loop:
//!
//! - asks the reconnection policy whether to try again and how long to wait
//! - guards each connection attempt with a circuit breaker
//! - reports traffic and reconnects to a health monitor
//! - runs under a task supervisor that restarts it if it gives up

use session_guard::circuitbreaker::CircuitBreaker;
use session_guard::health::HealthMonitor;
use session_guard::reconnect::{ExponentialBackoff, ReconnectionPolicy};
use session_guard::supervisor::{RestartPolicy, TaskSupervisor};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
enum FeedError {
    Refused,
    Dropped,
    GaveUp(usize),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Refused => write!(f, "connection refused"),
            FeedError::Dropped => write!(f, "connection dropped by peer"),
            FeedError::GaveUp(attempts) => write!(f, "gave up after {attempts} attempts"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Refuses the first `refusals` connects, then drops every `drop_every`
/// messages.
struct SimulatedFeed {
    connects: AtomicUsize,
    refusals: usize,
    messages: AtomicUsize,
    drop_every: usize,
    connected: AtomicBool,
}

impl SimulatedFeed {
    fn connect(&self) -> Result<(), FeedError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if attempt < self.refusals {
            return Err(FeedError::Refused);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn next_message(&self) -> Result<usize, FeedError> {
        sleep(Duration::from_millis(100)).await;
        let n = self.messages.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.drop_every == 0 {
            self.connected.store(false, Ordering::SeqCst);
            return Err(FeedError::Dropped);
        }
        Ok(n)
    }
}

struct Session {
    feed: Arc<SimulatedFeed>,
    breaker: CircuitBreaker,
    health: HealthMonitor,
}

impl Session {
    async fn run(&self, token: CancellationToken) -> Result<(), FeedError> {
        let mut policy = ReconnectionPolicy::builder()
            .max_attempts(6)
            .backoff(
                ExponentialBackoff::new(Duration::from_millis(100))
                    .multiplier(2.0)
                    .max_interval(Duration::from_secs(1)),
            )
            .build();

        loop {
            if !policy.should_reconnect() {
                return Err(FeedError::GaveUp(policy.attempts()));
            }

            let wait = if !self.breaker.can_attempt() {
                self.breaker.config().reset_timeout()
            } else {
                match self.feed.connect() {
                    Ok(()) => {
                        self.breaker.record_success();
                        if policy.attempts() > 0 {
                            self.health.record_reconnect_attempt(true);
                        }
                        policy.reset();
                        self.health.record_connection_established();
                        self.health.record_authentication(true);
                        println!("[feed] connected");

                        if let Err(err) = self.stream(&token).await {
                            println!("[feed] {err}");
                            self.health.record_connection_lost();
                        }
                        if token.is_cancelled() {
                            return Ok(());
                        }
                        Duration::ZERO
                    }
                    Err(err) => {
                        self.breaker.record_failure();
                        self.health.record_reconnect_attempt(false);
                        let wait = policy.next_backoff();
                        policy.increment_attempts();
                        println!(
                            "[feed] {err} (attempt {}), retrying in {wait:?}",
                            policy.attempts()
                        );
                        wait
                    }
                }
            };

            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = sleep(wait) => {}
            }
        }
    }

    async fn stream(&self, token: &CancellationToken) -> Result<(), FeedError> {
        loop {
            let started = tokio::time::Instant::now();
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                message = self.feed.next_message() => match message {
                    Ok(_) => {
                        self.health.record_message_received();
                        self.health.record_latency(started.elapsed());
                    }
                    Err(err) => {
                        self.health.record_message_failed();
                        return Err(err);
                    }
                },
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Component logs show up when built with the `tracing` feature.
    tracing_subscriber::fmt::init();

    let feed = Arc::new(SimulatedFeed {
        connects: AtomicUsize::new(0),
        refusals: 3,
        messages: AtomicUsize::new(0),
        drop_every: 12,
        connected: AtomicBool::new(false),
    });

    let breaker = CircuitBreaker::builder()
        .name("feed-connect")
        .max_failures(2)
        .reset_timeout(Duration::from_millis(300))
        .on_state_transition(|from, to| println!("[breaker] {from:?} -> {to:?}"))
        .build();

    let probe_feed = Arc::clone(&feed);
    let health = HealthMonitor::builder()
        .name("feed")
        .check_interval(Duration::from_millis(500))
        .health_check(move || {
            let connected = probe_feed.connected.load(Ordering::SeqCst);
            async move {
                if connected {
                    Ok(())
                } else {
                    Err(FeedError::Dropped)
                }
            }
        })
        .on_status_change(|from, to| println!("[health] {from} -> {to}"))
        .build();

    let supervisor = TaskSupervisor::builder()
        .name("session")
        .shutdown_grace(Duration::from_secs(2))
        .on_worker_exhausted(|name, restarts| {
            println!("[supervisor] {name} exhausted after {restarts} restarts")
        })
        .build();

    let session = Arc::new(Session {
        feed: Arc::clone(&feed),
        breaker: breaker.clone(),
        health: health.clone(),
    });
    supervisor.register(
        "feed",
        "Market data feed",
        move |token| {
            let session = Arc::clone(&session);
            async move { session.run(token).await }
        },
        RestartPolicy::default()
            .max_restarts(3)
            .base_delay(Duration::from_millis(200))
            .on_failure(|err, restarts| println!("[supervisor] feed failed ({restarts}): {err}")),
    )?;

    health.start();
    supervisor.start()?;

    sleep(Duration::from_secs(5)).await;

    supervisor.stop().await?;
    health.stop().await;

    println!();
    println!("{}", health.health_report());
    println!();
    println!("Breaker: {:?}", breaker.stats());
    println!("Supervisor: {:?}", supervisor.metrics());

    Ok(())
}
