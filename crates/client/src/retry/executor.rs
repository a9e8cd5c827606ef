// Attempt loop shared by the blocking and async execution modes
use std::time::Duration;

use hermod_common::resilience::backoff::delay_for;
use hermod_common::resilience::classify::{method_allows_retry, status_is_retryable};
use hermod_common::RetryPolicy;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{ClientError, ClientResult};
use crate::request::Req;
use crate::response::Reply;
use crate::transport::{BlockingTransport, Transport, TransportOutcome};

/// Whether `req` may be sent more than once under `policy`.
///
/// Method gating and body repeatability both apply; a single-use body
/// silently downgrades to one-shot execution, whatever the policy says.
fn retry_eligible(req: &Req, policy: &RetryPolicy) -> bool {
    method_allows_retry(req.method(), policy) && req.body().is_repeatable()
}

/// What to do after classifying one attempt's outcome.
enum Step {
    Done(ClientResult<Reply>),
    Backoff(Duration),
}

/// Shared decision logic for both execution modes.
///
/// `attempt` is 1-based. Terminal rules: a non-retryable status or the last
/// attempt returns the response as-is (a retryable status after exhaustion
/// is still a returned response, not an error); a fatal transport failure
/// or an exhausted retryable one surfaces wrapped with request context.
fn classify_outcome(
    outcome: TransportOutcome,
    attempt: u32,
    policy: &RetryPolicy,
    req: &Req,
) -> Step {
    let max_attempts = policy.max_attempts();

    match outcome {
        TransportOutcome::Success(reply) => {
            let status = reply.status();
            if !status_is_retryable(status.as_u16()) || attempt >= max_attempts {
                return Step::Done(Ok(reply));
            }

            let delay = delay_for(attempt, policy);
            warn!(
                method = %req.method(),
                url = %req.url(),
                %status,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retryable status, backing off"
            );
            Step::Backoff(delay)
        }
        TransportOutcome::RetryableFailure(source) => {
            if attempt >= max_attempts {
                return Step::Done(Err(ClientError::transport(
                    req.method().clone(),
                    req.url().clone(),
                    source,
                )));
            }

            let delay = delay_for(attempt, policy);
            warn!(
                method = %req.method(),
                url = %req.url(),
                error = %source,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "transport failure, backing off"
            );
            Step::Backoff(delay)
        }
        TransportOutcome::FatalFailure(source) => {
            debug!(method = %req.method(), url = %req.url(), error = %source, "failure is not retryable");
            Step::Done(Err(ClientError::transport(
                req.method().clone(),
                req.url().clone(),
                source,
            )))
        }
    }
}

/// Single unclassified exchange: whatever comes back is terminal.
pub(crate) async fn one_shot_async(
    transport: &dyn Transport,
    req: Req,
) -> ClientResult<Reply> {
    let method = req.method().clone();
    let url = req.url().clone();

    match transport.send_once(req).await {
        TransportOutcome::Success(reply) => Ok(reply),
        TransportOutcome::RetryableFailure(source) | TransportOutcome::FatalFailure(source) => {
            Err(ClientError::transport(method, url, source))
        }
    }
}

/// Blocking counterpart of [`one_shot_async`].
pub(crate) fn one_shot_blocking(
    transport: &dyn BlockingTransport,
    req: Req,
) -> ClientResult<Reply> {
    let method = req.method().clone();
    let url = req.url().clone();

    match transport.send_once(req) {
        TransportOutcome::Success(reply) => Ok(reply),
        TransportOutcome::RetryableFailure(source) | TransportOutcome::FatalFailure(source) => {
            Err(ClientError::transport(method, url, source))
        }
    }
}

/// Drive the async attempt loop to a terminal outcome.
pub(crate) async fn run_async(
    transport: &dyn Transport,
    req: Req,
    policy: &RetryPolicy,
    cancel: Option<&CancelToken>,
) -> ClientResult<Reply> {
    policy.validate()?;

    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(ClientError::Interrupted);
    }

    if !retry_eligible(&req, policy) {
        return one_shot_async(transport, req).await;
    }

    let mut attempt: u32 = 1;
    loop {
        debug!(
            method = %req.method(),
            url = %req.url(),
            attempt,
            max_attempts = policy.max_attempts(),
            "executing attempt"
        );

        let outcome = transport.send(&req).await;
        match classify_outcome(outcome, attempt, policy, &req) {
            Step::Done(result) => return result,
            Step::Backoff(delay) => wait_async(delay, cancel).await?,
        }
        attempt += 1;
    }
}

/// Drive the blocking attempt loop to a terminal outcome.
pub(crate) fn run_blocking(
    transport: &dyn BlockingTransport,
    req: Req,
    policy: &RetryPolicy,
    cancel: Option<&CancelToken>,
) -> ClientResult<Reply> {
    policy.validate()?;

    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(ClientError::Interrupted);
    }

    if !retry_eligible(&req, policy) {
        return one_shot_blocking(transport, req);
    }

    let mut attempt: u32 = 1;
    loop {
        debug!(
            method = %req.method(),
            url = %req.url(),
            attempt,
            max_attempts = policy.max_attempts(),
            "executing attempt"
        );

        let outcome = transport.send(&req);
        match classify_outcome(outcome, attempt, policy, &req) {
            Step::Done(result) => return result,
            Step::Backoff(delay) => wait_blocking(delay, cancel)?,
        }
        attempt += 1;
    }
}

async fn wait_async(delay: Duration, cancel: Option<&CancelToken>) -> ClientResult<()> {
    if delay.is_zero() {
        return Ok(());
    }
    match cancel {
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        Some(token) => token.sleep_async(delay).await,
    }
}

fn wait_blocking(delay: Duration, cancel: Option<&CancelToken>) -> ClientResult<()> {
    if delay.is_zero() {
        return Ok(());
    }
    match cancel {
        None => {
            std::thread::sleep(delay);
            Ok(())
        }
        Some(token) => token.sleep_blocking(delay),
    }
}
