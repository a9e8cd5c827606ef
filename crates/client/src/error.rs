// Error types for the client crate
use reqwest::Method;
use thiserror::Error;
use url::Url;

/// Boxed foreign error carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the client.
///
/// Only terminal outcomes cross this boundary: intermediate attempt
/// failures stay inside the retry orchestrator. A response with a
/// server-trouble status code is *not* an error; callers observe it on the
/// returned [`Reply`](crate::Reply) directly.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport failed and no further attempt was permitted, either
    /// because the failure is not retryable or because attempts ran out.
    /// Carries the request's method and URL for diagnostics.
    #[error("request failed: {method} {url}")]
    Transport {
        method: Method,
        url: Url,
        #[source]
        source: BoxError,
    },

    /// A cancellation signal arrived during a backoff wait. The token
    /// stays cancelled afterwards, so the caller can observe the state.
    #[error("retry wait interrupted")]
    Interrupted,

    /// Malformed retry configuration. Fatal: never retried or recovered.
    #[error("invalid retry policy: {0}")]
    Policy(#[from] hermod_common::PolicyError),

    /// Request construction failed (invalid URL, header name, or value).
    #[error("invalid request: {0}")]
    Build(String),

    /// Response body could not be decoded as the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ClientError {
    /// Wrap a transport-boundary failure with its request context.
    pub(crate) fn transport(method: Method, url: Url, source: BoxError) -> Self {
        Self::Transport { method, url, source }
    }

    /// Build-stage error from any displayable cause.
    pub(crate) fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }
}

/// Result alias used across the client crate.
pub type ClientResult<T> = Result<T, ClientError>;
