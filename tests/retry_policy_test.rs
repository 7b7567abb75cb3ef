use std::time::Duration;

use wayfinder::RetryPolicy;

#[test]
fn defaults_match_documented_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.max_attempts(), 4);
    assert_eq!(policy.base_delay, Duration::from_secs(1));
    assert_eq!(policy.max_delay, Duration::from_secs(30));
    assert_eq!(policy.backoff_multiplier, 2.0);
    for code in [429, 502, 503, 504, 408] {
        assert!(policy.retryable_status_codes.contains(&code));
    }
    assert_eq!(policy.retryable_status_codes.len(), 5);
}

#[test]
fn backoff_grows_monotonically_and_caps() {
    let policy = RetryPolicy::default();
    let delays: Vec<Duration> = (1..=10).map(|a| policy.delay_for_attempt(a)).collect();

    assert_eq!(delays[0], Duration::from_secs(1));
    assert_eq!(delays[1], Duration::from_secs(2));
    assert_eq!(delays[2], Duration::from_secs(4));
    assert_eq!(delays[3], Duration::from_secs(8));
    assert_eq!(delays[4], Duration::from_secs(16));
    for window in delays.windows(2) {
        assert!(window[0] <= window[1]);
    }
    for delay in &delays {
        assert!(*delay <= Duration::from_secs(30));
    }
    assert_eq!(delays[9], Duration::from_secs(30));
}

#[test]
fn custom_multiplier_is_applied() {
    let policy = RetryPolicy::new()
        .base_delay(Duration::from_millis(100))
        .backoff_multiplier(3.0)
        .max_delay(Duration::from_secs(10));
    assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(300));
    assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(900));
}

#[test]
fn disabled_policy_is_single_attempt() {
    let policy = RetryPolicy::disabled();
    assert_eq!(policy.max_attempts(), 1);
}

#[test]
fn status_code_set_can_be_replaced() {
    let policy = RetryPolicy::new().retryable_status_codes([500]);
    assert!(policy.retryable_status_codes.contains(&500));
    assert!(!policy.retryable_status_codes.contains(&429));
}
