// Retry policy value type with validated constructors
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::serde::duration_millis;

/// Minimum allowed `max_attempts` value
pub const MIN_MAX_ATTEMPTS: u32 = 1;

/// Maximum exponent for exponential backoff calculation to prevent overflow
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Errors produced by retry policy construction or validation.
///
/// These are programming-time faults: a policy that fails validation is
/// never retried against or recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least {MIN_MAX_ATTEMPTS}, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("max_delay ({max:?}) cannot be less than base_delay ({base:?})")]
    DelayOrdering { base: Duration, max: Duration },
}

/// Immutable retry policy.
///
/// Describes how many attempts a request may consume, how the delay
/// between attempts grows, and which non-idempotent methods are opted in.
/// Construct through [`RetryPolicy::fixed`] or [`RetryPolicy::exponential`];
/// the invariant `max_delay >= base_delay` is enforced there (when the two
/// are equal the backoff is constant, with no exponential growth).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_attempts: u32,
    #[serde(with = "duration_millis")]
    base_delay: Duration,
    #[serde(with = "duration_millis")]
    max_delay: Duration,
    jitter: bool,
    retry_post: bool,
    retry_patch: bool,
    respect_retry_after: bool,
}

impl RetryPolicy {
    /// Constant-backoff policy: every wait is exactly `delay`.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Result<Self, PolicyError> {
        Self::build(max_attempts, delay, delay, false)
    }

    /// Exponential-backoff policy: waits grow as `base_delay * 2^(n-1)`,
    /// capped at `max_delay`, optionally half-jittered.
    pub fn exponential(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Result<Self, PolicyError> {
        Self::build(max_attempts, base_delay, max_delay, jitter)
    }

    fn build(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            max_attempts,
            base_delay,
            max_delay,
            jitter,
            retry_post: false,
            retry_patch: false,
            respect_retry_after: true,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Return a copy that also retries POST requests.
    #[must_use]
    pub fn allow_post(mut self) -> Self {
        self.retry_post = true;
        self
    }

    /// Return a copy that also retries PATCH requests.
    #[must_use]
    pub fn allow_patch(mut self) -> Self {
        self.retry_patch = true;
        self
    }

    /// Validate the policy invariants.
    ///
    /// Constructors already enforce these; deserialized policies should be
    /// re-checked before use (the orchestrator does).
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts < MIN_MAX_ATTEMPTS {
            return Err(PolicyError::InvalidMaxAttempts(self.max_attempts));
        }
        if self.max_delay < self.base_delay {
            return Err(PolicyError::DelayOrdering {
                base: self.base_delay,
                max: self.max_delay,
            });
        }
        Ok(())
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Upper bound on any computed delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Whether computed delays are half-jittered.
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Whether POST requests are retry-eligible under this policy.
    pub fn retry_post(&self) -> bool {
        self.retry_post
    }

    /// Whether PATCH requests are retry-eligible under this policy.
    pub fn retry_patch(&self) -> bool {
        self.retry_patch
    }

    /// Whether a server-supplied `Retry-After` hint should be honored.
    ///
    /// Accepted for configuration parity but not currently consulted when
    /// computing backoff delays.
    pub fn respect_retry_after(&self) -> bool {
        self.respect_retry_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_uses_constant_delay_bounds() {
        let policy = RetryPolicy::fixed(3, Duration::from_millis(250)).unwrap();

        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_millis(250));
        assert_eq!(policy.max_delay(), Duration::from_millis(250));
        assert!(!policy.jitter());
        assert!(policy.respect_retry_after());
    }

    #[test]
    fn exponential_policy_keeps_bounds_and_jitter() {
        let policy = RetryPolicy::exponential(
            5,
            Duration::from_millis(100),
            Duration::from_secs(10),
            true,
        )
        .unwrap();

        assert_eq!(policy.max_attempts(), 5);
        assert!(policy.jitter());
    }

    #[test]
    fn zero_attempts_rejected() {
        let result = RetryPolicy::fixed(0, Duration::from_millis(100));

        assert_eq!(result.unwrap_err(), PolicyError::InvalidMaxAttempts(0));
    }

    #[test]
    fn base_delay_above_max_rejected() {
        let result = RetryPolicy::exponential(
            3,
            Duration::from_secs(10),
            Duration::from_secs(5),
            false,
        );

        assert!(matches!(result, Err(PolicyError::DelayOrdering { .. })));
    }

    /// POST and PATCH opt-ins return modified copies and never touch the
    /// original value.
    #[test]
    fn method_opt_ins_are_copies() {
        let base = RetryPolicy::fixed(2, Duration::from_millis(10)).unwrap();
        let with_post = base.clone().allow_post();
        let with_both = base.clone().allow_post().allow_patch();

        assert!(!base.retry_post());
        assert!(!base.retry_patch());
        assert!(with_post.retry_post());
        assert!(!with_post.retry_patch());
        assert!(with_both.retry_post());
        assert!(with_both.retry_patch());
    }

    #[test]
    fn serde_round_trip_preserves_durations_as_millis() {
        let policy = RetryPolicy::exponential(
            4,
            Duration::from_millis(150),
            Duration::from_secs(30),
            true,
        )
        .unwrap()
        .allow_post();

        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"base_delay\":150"));
        assert!(json.contains("\"max_delay\":30000"));

        let back: RetryPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }

    /// A deserialized policy can violate the delay ordering; `validate`
    /// catches it.
    #[test]
    fn validate_rejects_deserialized_inversion() {
        let json = r#"{
            "max_attempts": 3,
            "base_delay": 5000,
            "max_delay": 100,
            "jitter": false,
            "retry_post": false,
            "retry_patch": false,
            "respect_retry_after": true
        }"#;

        let policy: RetryPolicy = serde_json::from_str(json).unwrap();
        assert!(policy.validate().is_err());
    }
}
