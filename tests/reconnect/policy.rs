use session_guard_reconnect::{
    ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction, ReconnectionPolicy,
};
use std::time::Duration;

#[test]
fn budget_counts_down_and_resets() {
    let mut policy = ReconnectionPolicy::new(3, Duration::from_millis(100));
    let mut allowed = 0;
    while policy.should_reconnect() {
        policy.increment_attempts();
        allowed += 1;
    }
    assert_eq!(allowed, 3);
    assert!(!policy.should_reconnect());

    policy.reset();
    assert_eq!(policy.attempts(), 0);
    assert!(policy.should_reconnect());
}

#[test]
fn disabled_policy_never_reconnects() {
    let mut policy = ReconnectionPolicy::builder().enabled(false).build();
    assert!(!policy.should_reconnect());

    policy.set_enabled(true);
    assert!(policy.should_reconnect());

    policy.set_max_attempts(0);
    assert!(!policy.should_reconnect());
}

#[test]
fn exponential_delays_follow_attempt_count() {
    let mut policy = ReconnectionPolicy::builder()
        .max_attempts(6)
        .backoff(
            ExponentialBackoff::new(Duration::from_millis(100))
                .multiplier(2.0)
                .max_interval(Duration::from_millis(1000)),
        )
        .build();

    let mut delays = Vec::new();
    while policy.should_reconnect() {
        delays.push(policy.next_backoff());
        policy.increment_attempts();
    }
    let expected: Vec<Duration> = [100, 200, 400, 800, 1000, 1000]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(delays, expected);
}

#[test]
fn next_backoff_does_not_advance() {
    let policy = ReconnectionPolicy::builder()
        .backoff_fn(|attempt| Duration::from_secs(attempt as u64 + 1))
        .build();
    assert_eq!(policy.next_backoff(), Duration::from_secs(1));
    assert_eq!(policy.next_backoff(), Duration::from_secs(1));
    assert_eq!(policy.attempts(), 0);
}

#[test]
fn swapping_backoff_strategies() {
    let mut policy = ReconnectionPolicy::new(5, Duration::from_secs(2));
    policy.increment_attempts();
    assert_eq!(policy.next_backoff(), Duration::from_secs(2));

    policy.set_backoff(FnInterval::new(|attempt| Duration::from_millis(10 * attempt as u64)));
    assert_eq!(policy.next_backoff(), Duration::from_millis(10));

    policy.set_backoff(FixedInterval::new(Duration::from_millis(750)));
    assert_eq!(policy.next_backoff(), Duration::from_millis(750));

    policy.clear_backoff();
    assert_eq!(policy.next_backoff(), policy.delay());
}

#[test]
fn clones_count_independently() {
    let mut original = ReconnectionPolicy::default();
    let mut copy = original.clone();
    original.increment_attempts();
    copy.increment_attempts();
    copy.increment_attempts();
    assert_eq!(original.attempts(), 1);
    assert_eq!(copy.attempts(), 2);
}

#[test]
fn custom_interval_functions() {
    struct Linear(Duration);

    impl IntervalFunction for Linear {
        fn next_interval(&self, attempt: usize) -> Duration {
            self.0 * (attempt as u32 + 1)
        }
    }

    let mut policy = ReconnectionPolicy::builder().backoff(Linear(Duration::from_millis(300))).build();
    policy.increment_attempts();
    policy.increment_attempts();
    assert_eq!(policy.next_backoff(), Duration::from_millis(900));
}
