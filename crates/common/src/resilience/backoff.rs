// Backoff delay computation with exponent clamp and half-jitter
use std::time::Duration;

use rand::Rng;

use crate::resilience::policy::{RetryPolicy, MAX_BACKOFF_EXPONENT};

/// Delays at or below this threshold are never jittered.
const JITTER_FLOOR_MS: u64 = 1;

/// Compute the backoff delay before retrying after attempt `attempt`.
///
/// `attempt` is 1-based (1 = the first attempt just failed). When the
/// policy's base and max delays are equal the delay is constant; otherwise
/// it grows as `base * 2^(attempt - 1)`, with the exponent clamped at
/// [`MAX_BACKOFF_EXPONENT`] and the result capped at `max_delay`. The
/// multiply is carried out in 128-bit millisecond space, so it cannot wrap.
///
/// With jitter enabled and a computed delay above 1 ms, the returned value
/// is drawn uniformly from `[delay / 2, delay]`, fresh on every call.
pub fn delay_for(attempt: u32, policy: &RetryPolicy) -> Duration {
    let n = attempt.saturating_sub(1);
    let base_ms = policy.base_delay().as_millis() as u64;

    let mut ms = if policy.base_delay() == policy.max_delay() {
        base_ms
    } else {
        let exponent = n.min(MAX_BACKOFF_EXPONENT);
        let raw = u128::from(base_ms) << exponent;
        let capped = raw.min(policy.max_delay().as_millis());
        u64::try_from(capped).unwrap_or(u64::MAX)
    };

    if policy.jitter() && ms > JITTER_FLOOR_MS {
        ms = rand::thread_rng().gen_range(ms / 2..=ms);
    }

    Duration::from_millis(ms)
}
