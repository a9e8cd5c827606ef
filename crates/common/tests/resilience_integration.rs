//! Integration tests for the resilience primitives.
//!
//! Exercises policy construction, backoff computation, and classification
//! together the way the client's retry orchestrator consumes them.

use std::time::Duration;

use hermod_common::resilience::backoff::delay_for;
use hermod_common::resilience::classify::{method_allows_retry, status_is_retryable};
use hermod_common::resilience::policy::{PolicyError, RetryPolicy};
use http::Method;

/// A fixed policy produces the same delay for every attempt number.
#[test]
fn fixed_policy_delay_is_attempt_independent() {
    let policy = RetryPolicy::fixed(10, Duration::from_millis(120)).unwrap();

    let delays: Vec<Duration> = (1..=10).map(|n| delay_for(n, &policy)).collect();
    assert!(delays.iter().all(|d| *d == Duration::from_millis(120)));
}

/// Without jitter, exponential delays never shrink and never exceed the cap.
#[test]
fn exponential_delays_are_monotone_up_to_cap() {
    let policy = RetryPolicy::exponential(
        10,
        Duration::from_millis(50),
        Duration::from_secs(2),
        false,
    )
    .unwrap();

    let mut previous = Duration::ZERO;
    for attempt in 1..=16 {
        let delay = delay_for(attempt, &policy);
        assert!(delay >= previous, "delay shrank at attempt {attempt}");
        assert!(delay <= Duration::from_secs(2));
        previous = delay;
    }
}

/// Jittered delays stay inside the half-jitter band of the un-jittered
/// value.
#[test]
fn jittered_delays_stay_in_band() {
    let jittered = RetryPolicy::exponential(
        6,
        Duration::from_millis(80),
        Duration::from_secs(60),
        true,
    )
    .unwrap();
    let plain = RetryPolicy::exponential(
        6,
        Duration::from_millis(80),
        Duration::from_secs(60),
        false,
    )
    .unwrap();

    for attempt in 1..=6 {
        let reference = delay_for(attempt, &plain);
        for _ in 0..20 {
            let sample = delay_for(attempt, &jittered);
            assert!(sample <= reference);
            assert!(sample >= reference / 2);
        }
    }
}

/// The classifier and the policy compose: a POST is only eligible once the
/// policy opts in, and status retryability is independent of the policy.
#[test]
fn post_eligibility_follows_policy_opt_in() {
    let policy = RetryPolicy::fixed(3, Duration::from_millis(5)).unwrap();

    assert!(!method_allows_retry(&Method::POST, &policy));
    assert!(status_is_retryable(503));

    let opted_in = policy.allow_post();
    assert!(method_allows_retry(&Method::POST, &opted_in));
}

/// Policies reject inverted delay bounds at construction time.
#[test]
fn construction_rejects_inverted_bounds() {
    let err = RetryPolicy::exponential(
        3,
        Duration::from_secs(30),
        Duration::from_secs(1),
        false,
    )
    .unwrap_err();

    assert!(matches!(err, PolicyError::DelayOrdering { .. }));
}

/// A policy deserialized from config re-validates before use.
#[test]
fn deserialized_policy_validates() {
    let json = r#"{
        "max_attempts": 0,
        "base_delay": 100,
        "max_delay": 1000,
        "jitter": false,
        "retry_post": false,
        "retry_patch": false,
        "respect_retry_after": true
    }"#;

    let policy: RetryPolicy = serde_json::from_str(json).unwrap();
    assert_eq!(policy.validate().unwrap_err(), PolicyError::InvalidMaxAttempts(0));
}
