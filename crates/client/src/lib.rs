//! Retry-aware HTTP client convenience layer over `reqwest`.
//!
//! The engineered pieces are the retry orchestrator (blocking and async
//! execution under one [`RetryPolicy`]) and the raw query mutator
//! re-exported from `hermod-common`; requests, responses, and auth are
//! thin value types around them.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use hermod_client::{Auth, Client, QueryEdit, Req, RetryPolicy};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new()?;
//! let policy = RetryPolicy::exponential(
//!     3,
//!     Duration::from_millis(250),
//!     Duration::from_secs(10),
//!     true,
//! )?;
//!
//! let reply = client
//!     .execute_with_policy(
//!         Req::get("https://api.example.com/search")?
//!             .query(&QueryEdit::new().append("q", "rust"))
//!             .auth(&Auth::bearer("token"))?,
//!         &policy,
//!     )
//!     .await?;
//!
//! assert!(reply.ok());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod cancel;
pub mod client;
pub mod error;
pub mod request;
pub mod response;
mod retry;
pub mod transport;

// Re-export the public surface at the crate root
// -----------------------------
pub use auth::Auth;
pub use cancel::CancelToken;
pub use client::{BlockingClient, Client, ClientBuilder};
pub use error::{BoxError, ClientError, ClientResult};
// The pure core types callers configure with
pub use hermod_common::query::{apply_append, apply_replace, encode_query_component};
pub use hermod_common::{PolicyError, QueryEdit, RetryPolicy};
pub use request::{Body, Req};
pub use response::Reply;
// reqwest's method/status types are the crate's own vocabulary
pub use reqwest::{Method, StatusCode};
pub use transport::{
    BlockingTransport, ReqwestBlockingTransport, ReqwestTransport, Transport, TransportOutcome,
};
