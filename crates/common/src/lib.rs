//! Pure core utilities shared across Hermod crates.
//!
//! Everything in this crate is I/O-free and deterministic apart from the
//! jitter source: retry policy values, backoff computation, retry
//! classification predicates, and the raw query-string mutator. The
//! transport-facing pieces live in `hermod-client`.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod query;
pub mod resilience;
pub mod utils;

// Re-export commonly used types for convenience
// ------------------------------
pub use query::{apply_append, apply_replace, encode_query_component, QueryEdit};
pub use resilience::backoff::delay_for;
pub use resilience::classify::{method_allows_retry, status_is_retryable};
pub use resilience::policy::{PolicyError, RetryPolicy};
pub use utils::serde::duration_millis;
