//! Pure retry-classification predicates.
//!
//! Status codes and methods are classified here; transport failures are
//! classified once at the transport boundary in `hermod-client`, where the
//! underlying error type is known.

use http::Method;

use crate::resilience::policy::RetryPolicy;

/// Whether a response status code signals a transient, retryable condition.
///
/// Exactly 429, 502, 503, and 504 qualify. Every other code, including the
/// remaining 4xx/5xx range, is terminal.
pub fn status_is_retryable(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}

/// Whether the request method permits more than one attempt under `policy`.
///
/// GET, PUT, and DELETE are assumed idempotent and always eligible. POST
/// and PATCH require the corresponding policy opt-in. Anything else is
/// never retried.
pub fn method_allows_retry(method: &Method, policy: &RetryPolicy) -> bool {
    if *method == Method::GET || *method == Method::PUT || *method == Method::DELETE {
        true
    } else if *method == Method::POST {
        policy.retry_post()
    } else if *method == Method::PATCH {
        policy.retry_patch()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::fixed(3, Duration::from_millis(10)).unwrap()
    }

    #[test]
    fn retryable_status_set_is_exact() {
        assert!(status_is_retryable(429));
        assert!(status_is_retryable(502));
        assert!(status_is_retryable(503));
        assert!(status_is_retryable(504));
    }

    #[test]
    fn other_statuses_are_terminal() {
        for status in [200, 201, 301, 400, 401, 403, 404, 408, 500, 501, 505] {
            assert!(!status_is_retryable(status), "status {status} must be terminal");
        }
    }

    #[test]
    fn idempotent_methods_always_eligible() {
        let p = policy();

        assert!(method_allows_retry(&Method::GET, &p));
        assert!(method_allows_retry(&Method::PUT, &p));
        assert!(method_allows_retry(&Method::DELETE, &p));
    }

    #[test]
    fn post_requires_opt_in() {
        let p = policy();
        assert!(!method_allows_retry(&Method::POST, &p));

        let allowed = p.allow_post();
        assert!(method_allows_retry(&Method::POST, &allowed));
        // PATCH stays gated independently
        assert!(!method_allows_retry(&Method::PATCH, &allowed));
    }

    #[test]
    fn patch_requires_opt_in() {
        let p = policy();
        assert!(!method_allows_retry(&Method::PATCH, &p));
        assert!(method_allows_retry(&Method::PATCH, &p.allow_patch()));
    }

    #[test]
    fn unlisted_methods_never_retry() {
        let p = policy().allow_post().allow_patch();

        assert!(!method_allows_retry(&Method::HEAD, &p));
        assert!(!method_allows_retry(&Method::OPTIONS, &p));
    }
}
