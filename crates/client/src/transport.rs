//! The transport boundary.
//!
//! Transports are injected dependencies: the orchestrator only sees the
//! [`TransportOutcome`] classification, decided once here, never the
//! underlying error type. The default implementations drive `reqwest` in
//! async and blocking form and rebuild the wire request from the
//! descriptor on every attempt.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::error::BoxError;
use crate::request::{Body, Req};
use crate::response::Reply;

/// Result of one transport exchange, classified at the boundary.
#[derive(Debug)]
pub enum TransportOutcome {
    /// The exchange completed; the status code may still signal trouble,
    /// but classifying that is the orchestrator's job.
    Success(Reply),
    /// Transient transport fault (connect failure, timeout, request I/O).
    RetryableFailure(BoxError),
    /// Non-transient fault (construction, redirect policy, decoding, or
    /// anything programming-shaped). Surfaces immediately.
    FatalFailure(BoxError),
}

/// Asynchronous transport: one request in, one classified outcome out.
#[async_trait(?Send)]
pub trait Transport: Send + Sync {
    /// Execute `req`, rebuilding the wire request from the descriptor.
    /// Only called with repeatable bodies.
    async fn send(&self, req: &Req) -> TransportOutcome;

    /// Execute `req` exactly once, consuming it. This is the only path
    /// that can carry a single-use streaming body.
    async fn send_once(&self, req: Req) -> TransportOutcome {
        self.send(&req).await
    }
}

/// Blocking transport counterpart of [`Transport`].
pub trait BlockingTransport: Send + Sync {
    /// Execute `req`, rebuilding the wire request from the descriptor.
    fn send(&self, req: &Req) -> TransportOutcome;

    /// Execute `req` exactly once, consuming it.
    fn send_once(&self, req: Req) -> TransportOutcome {
        self.send(&req)
    }
}

/// Whether a reqwest failure is worth another attempt.
///
/// Connect failures, timeouts, and request/body I/O faults are transient;
/// builder, redirect-policy, and decode errors are not.
pub(crate) fn error_is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
}

fn classify(err: reqwest::Error) -> TransportOutcome {
    if error_is_retryable(&err) {
        TransportOutcome::RetryableFailure(Box::new(err))
    } else {
        TransportOutcome::FatalFailure(Box::new(err))
    }
}

fn mode_mismatch(expected: &str) -> TransportOutcome {
    TransportOutcome::FatalFailure(Box::new(std::io::Error::other(format!(
        "single-use streaming body built for the {expected} client"
    ))))
}

fn header_map(req: &Req) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in &req.headers {
        map.append(name.clone(), value.clone());
    }
    map
}

/// Async transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an already-configured client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn assemble(&self, req: &Req) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(req.method.clone(), req.url.clone())
            .headers(header_map(req));
        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    async fn dispatch(&self, builder: reqwest::RequestBuilder) -> TransportOutcome {
        let request = match builder.build() {
            Ok(request) => request,
            Err(err) => return TransportOutcome::FatalFailure(Box::new(err)),
        };

        debug!(method = %request.method(), url = %request.url(), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => capture_async(response).await,
            Err(err) => classify(err),
        }
    }
}

async fn capture_async(response: reqwest::Response) -> TransportOutcome {
    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().clone();

    debug!(%status, %url, "received HTTP response");

    match response.bytes().await {
        Ok(body) => TransportOutcome::Success(Reply::new(status, headers, url, body)),
        Err(err) => classify(err),
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, req: &Req) -> TransportOutcome {
        let builder = match &req.body {
            Body::Empty => self.assemble(req),
            Body::Bytes(bytes) => self.assemble(req).body(bytes.clone()),
            Body::Stream(_) | Body::Reader(_) => {
                return TransportOutcome::FatalFailure(Box::new(std::io::Error::other(
                    "single-use body cannot be resent; use the one-shot path",
                )))
            }
        };
        self.dispatch(builder).await
    }

    async fn send_once(&self, mut req: Req) -> TransportOutcome {
        let body = std::mem::replace(&mut req.body, Body::Empty);
        let builder = match body {
            Body::Empty => self.assemble(&req),
            Body::Bytes(bytes) => self.assemble(&req).body(bytes),
            Body::Stream(stream) => self.assemble(&req).body(stream),
            Body::Reader(_) => return mode_mismatch("blocking"),
        };
        self.dispatch(builder).await
    }
}

/// Blocking transport backed by `reqwest::blocking::Client`.
///
/// Must not be driven from inside an async runtime; that restriction comes
/// from `reqwest::blocking` itself.
#[derive(Debug, Clone)]
pub struct ReqwestBlockingTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestBlockingTransport {
    /// Wrap an already-configured blocking client.
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    fn assemble(&self, req: &Req) -> reqwest::blocking::RequestBuilder {
        let mut builder = self
            .client
            .request(req.method.clone(), req.url.clone())
            .headers(header_map(req));
        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    fn dispatch(&self, builder: reqwest::blocking::RequestBuilder) -> TransportOutcome {
        let request = match builder.build() {
            Ok(request) => request,
            Err(err) => return TransportOutcome::FatalFailure(Box::new(err)),
        };

        debug!(method = %request.method(), url = %request.url(), "sending HTTP request");

        match self.client.execute(request) {
            Ok(response) => capture_blocking(response),
            Err(err) => classify(err),
        }
    }
}

fn capture_blocking(response: reqwest::blocking::Response) -> TransportOutcome {
    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().clone();

    debug!(%status, %url, "received HTTP response");

    match response.bytes() {
        Ok(body) => TransportOutcome::Success(Reply::new(status, headers, url, body)),
        Err(err) => classify(err),
    }
}

impl BlockingTransport for ReqwestBlockingTransport {
    fn send(&self, req: &Req) -> TransportOutcome {
        let builder = match &req.body {
            Body::Empty => self.assemble(req),
            Body::Bytes(bytes) => self.assemble(req).body(bytes.clone().to_vec()),
            Body::Stream(_) | Body::Reader(_) => {
                return TransportOutcome::FatalFailure(Box::new(std::io::Error::other(
                    "single-use body cannot be resent; use the one-shot path",
                )))
            }
        };
        self.dispatch(builder)
    }

    fn send_once(&self, mut req: Req) -> TransportOutcome {
        let body = std::mem::replace(&mut req.body, Body::Empty);
        let builder = match body {
            Body::Empty => self.assemble(&req),
            Body::Bytes(bytes) => self.assemble(&req).body(bytes.to_vec()),
            Body::Reader(reader) => self.assemble(&req).body(reader),
            Body::Stream(_) => return mode_mismatch("async"),
        };
        self.dispatch(builder)
    }
}
