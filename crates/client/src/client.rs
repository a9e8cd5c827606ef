//! User-facing clients.
//!
//! [`Client`] (async) and [`BlockingClient`] wrap an injectable transport.
//! The default transports share one `reqwest` client per instance;
//! cloning a client clones the handle, not the connection state, so a
//! single instance can serve a whole process without being a singleton —
//! tests inject fakes instead.

use std::sync::Arc;
use std::time::Duration;

use hermod_common::RetryPolicy;

use crate::cancel::CancelToken;
use crate::error::{ClientError, ClientResult};
use crate::request::Req;
use crate::response::Reply;
use crate::retry::executor;
use crate::transport::{
    BlockingTransport, ReqwestBlockingTransport, ReqwestTransport, Transport,
};

/// Default whole-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Asynchronous HTTP client.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client with default configuration.
    pub fn new() -> ClientResult<Self> {
        Self::builder().build()
    }

    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client over a custom transport (deterministic fakes in tests).
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self { transport: Arc::new(transport) }
    }

    /// Execute `req` exactly once, without retry classification.
    pub async fn execute(&self, req: Req) -> ClientResult<Reply> {
        executor::one_shot_async(self.transport.as_ref(), req).await
    }

    /// Execute `req` under `policy`, retrying transient failures.
    pub async fn execute_with_policy(
        &self,
        req: Req,
        policy: &RetryPolicy,
    ) -> ClientResult<Reply> {
        executor::run_async(self.transport.as_ref(), req, policy, None).await
    }

    /// Like [`execute_with_policy`](Self::execute_with_policy), abortable
    /// through `cancel` between attempts and during backoff waits.
    pub async fn execute_with_policy_cancellable(
        &self,
        req: Req,
        policy: &RetryPolicy,
        cancel: &CancelToken,
    ) -> ClientResult<Reply> {
        executor::run_async(self.transport.as_ref(), req, policy, Some(cancel)).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

/// Blocking HTTP client.
///
/// Must not be driven from inside an async runtime (a `reqwest::blocking`
/// restriction); use [`Client`] there.
#[derive(Clone)]
pub struct BlockingClient {
    transport: Arc<dyn BlockingTransport>,
}

impl BlockingClient {
    /// Client with default configuration.
    pub fn new() -> ClientResult<Self> {
        Client::builder().build_blocking()
    }

    /// Start building a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client over a custom transport (deterministic fakes in tests).
    pub fn with_transport<T: BlockingTransport + 'static>(transport: T) -> Self {
        Self { transport: Arc::new(transport) }
    }

    /// Execute `req` exactly once, without retry classification.
    pub fn execute(&self, req: Req) -> ClientResult<Reply> {
        executor::one_shot_blocking(self.transport.as_ref(), req)
    }

    /// Execute `req` under `policy`, retrying transient failures. The
    /// backoff wait blocks the calling thread.
    pub fn execute_with_policy(&self, req: Req, policy: &RetryPolicy) -> ClientResult<Reply> {
        executor::run_blocking(self.transport.as_ref(), req, policy, None)
    }

    /// Like [`execute_with_policy`](Self::execute_with_policy), abortable
    /// through `cancel` between attempts and during backoff waits.
    pub fn execute_with_policy_cancellable(
        &self,
        req: Req,
        policy: &RetryPolicy,
        cancel: &CancelToken,
    ) -> ClientResult<Reply> {
        executor::run_blocking(self.transport.as_ref(), req, policy, Some(cancel))
    }
}

impl std::fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient").finish_non_exhaustive()
    }
}

/// Builder for [`Client`] and [`BlockingClient`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: None,
        }
    }
}

impl ClientBuilder {
    /// Whole-request timeout applied to every request without its own.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connection-establishment timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// User-Agent header sent with every request.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the async client.
    pub fn build(self) -> ClientResult<Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout);
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::build(format!("failed to build HTTP client: {e}")))?;
        Ok(Client::with_transport(ReqwestTransport::new(client)))
    }

    /// Build the blocking client.
    pub fn build_blocking(self) -> ClientResult<BlockingClient> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout);
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::build(format!("failed to build HTTP client: {e}")))?;
        Ok(BlockingClient::with_transport(ReqwestBlockingTransport::new(client)))
    }
}
