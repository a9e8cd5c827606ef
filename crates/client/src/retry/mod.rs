//! Retry orchestration.
//!
//! Drives repeated transport sends under a [`RetryPolicy`]: classify each
//! outcome, wait out the computed backoff, try again until success, a
//! terminal outcome, or attempt exhaustion. Blocking and async execution
//! make identical decisions; only the wait primitive differs.
//!
//! [`RetryPolicy`]: hermod_common::RetryPolicy

pub(crate) mod executor;
