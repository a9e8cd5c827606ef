//! Request descriptor and body types.
//!
//! A [`Req`] is the immutable-once-built description the transports and
//! the retry orchestrator work from: method, URL, ordered headers, an
//! optional per-request timeout, and a body. Setters consume and return
//! the value, so construction chains with `?`.

use std::time::Duration;

use bytes::Bytes;
use hermod_common::QueryEdit;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Request payload.
///
/// `Empty` and `Bytes` can be resent unchanged on a retry. `Stream` and
/// `Reader` are single-use: a request carrying one executes exactly once,
/// whatever the retry policy says.
#[derive(Debug)]
pub enum Body {
    /// No payload.
    Empty,
    /// In-memory payload; cheap to clone per attempt.
    Bytes(Bytes),
    /// Single-use streaming payload for the async client.
    Stream(reqwest::Body),
    /// Single-use streaming payload for the blocking client.
    Reader(reqwest::blocking::Body),
}

impl Body {
    /// Whether this payload can be resent byte-identical on a retry.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Body::Empty | Body::Bytes(_))
    }
}

/// An HTTP request under construction.
#[derive(Debug)]
pub struct Req {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) body: Body,
}

impl Req {
    /// Build a request for `method` against `url`.
    pub fn new(method: Method, url: &str) -> ClientResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| ClientError::build(format!("invalid url `{url}`: {e}")))?;
        Ok(Self::from_url(method, url))
    }

    /// Build a request from an already-parsed URL.
    pub fn from_url(method: Method, url: Url) -> Self {
        Self { method, url, headers: Vec::new(), timeout: None, body: Body::Empty }
    }

    /// GET request.
    pub fn get(url: &str) -> ClientResult<Self> {
        Self::new(Method::GET, url)
    }

    /// POST request.
    pub fn post(url: &str) -> ClientResult<Self> {
        Self::new(Method::POST, url)
    }

    /// PUT request.
    pub fn put(url: &str) -> ClientResult<Self> {
        Self::new(Method::PUT, url)
    }

    /// PATCH request.
    pub fn patch(url: &str) -> ClientResult<Self> {
        Self::new(Method::PATCH, url)
    }

    /// DELETE request.
    pub fn delete(url: &str) -> ClientResult<Self> {
        Self::new(Method::DELETE, url)
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> ClientResult<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.push((name, value));
        Ok(self)
    }

    /// Replace every value of `name` (case-insensitively) with `value`.
    pub fn set_header(
        self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> ClientResult<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        Ok(self.set_header_pair(name, value))
    }

    pub(crate) fn set_header_pair(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.retain(|(existing, _)| *existing != name);
        self.headers.push((name, value));
        self
    }

    /// Drop every value of `name`. Unknown or invalid names are a no-op.
    #[must_use]
    pub fn remove_header(mut self, name: &str) -> Self {
        if let Ok(name) = HeaderName::try_from(name) {
            self.headers.retain(|(existing, _)| *existing != name);
        }
        self
    }

    /// Append several headers at once.
    pub fn headers<'a, I>(mut self, entries: I) -> ClientResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (name, value) in entries {
            self = self.header(name, value)?;
        }
        Ok(self)
    }

    /// Per-request timeout covering the whole exchange.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// UTF-8 text payload (repeatable).
    #[must_use]
    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.body = Body::Bytes(Bytes::from(text.into()));
        self
    }

    /// In-memory byte payload (repeatable).
    #[must_use]
    pub fn body_bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Body::Bytes(bytes.into());
        self
    }

    /// Single-use streaming payload for the async client. Disables retries.
    #[must_use]
    pub fn body_stream(mut self, body: impl Into<reqwest::Body>) -> Self {
        self.body = Body::Stream(body.into());
        self
    }

    /// Single-use reader payload for the blocking client. Disables retries.
    #[must_use]
    pub fn body_reader<R>(mut self, reader: R) -> Self
    where
        R: std::io::Read + Send + 'static,
    {
        self.body = Body::Reader(reqwest::blocking::Body::new(reader));
        self
    }

    /// Apply a query edit to the request URL immediately.
    ///
    /// The URL is finalized here, before any transport call; edits do not
    /// accumulate lazily.
    #[must_use]
    pub fn query(mut self, edit: &QueryEdit) -> Self {
        self.url = edit.apply(&self.url);
        self
    }

    /// Apply an authentication strategy to this request.
    ///
    /// Auth uses replace semantics for both headers and query keys, so
    /// chain it after plain headers when it should win.
    pub fn auth(self, auth: &crate::auth::Auth) -> ClientResult<Self> {
        auth.apply(self)
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL as finalized so far.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request payload.
    pub fn body(&self) -> &Body {
        &self.body
    }
}

fn parse_header(name: &str, value: &str) -> ClientResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| ClientError::build(format!("invalid header name `{name}`: {e}")))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| ClientError::build(format!("invalid value for header `{name}`: {e}")))?;
    Ok((name, value))
}
