//! Response snapshot type.
//!
//! A [`Reply`] captures everything from the wire exchange once at receive
//! time — status, headers, final URL, body bytes — and never touches the
//! transport again. Derived views (`text`, `json`) are computed on demand.

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// An immutable view over a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
}

impl Reply {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, url: Url, body: Bytes) -> Self {
        Self { status, headers, url, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status is in the 2xx success range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Final URL of the exchange (after any redirects).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, case-insensitively.
    ///
    /// Returns `None` when the header is absent or its value is not valid
    /// visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of `name`, in order. Empty when the header is absent.
    pub fn header_all(&self, name: &str) -> Vec<&str> {
        self.headers.get_all(name).iter().filter_map(|v| v.to_str().ok()).collect()
    }

    /// Raw response body bytes.
    pub fn content(&self) -> &[u8] {
        &self.body
    }

    /// Consume the reply, returning the body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Response body decoded as text.
    ///
    /// The charset comes from the `Content-Type` header when present;
    /// UTF-8 (lossy) is the fallback. Latin-1 is decoded directly; other
    /// charsets fall back to lossy UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        match self.charset().as_deref() {
            Some("iso-8859-1" | "latin-1" | "latin1") => {
                Cow::Owned(self.body.iter().map(|&b| char::from(b)).collect())
            }
            _ => String::from_utf8_lossy(&self.body),
        }
    }

    /// Response body parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body).map_err(ClientError::Decode)
    }

    fn charset(&self) -> Option<String> {
        let content_type = self.header(CONTENT_TYPE.as_str())?;
        let lower = content_type.to_ascii_lowercase();
        let index = lower.find("charset=")?;

        let rest = &lower[index + "charset=".len()..];
        let value = rest.split(';').next().unwrap_or(rest);
        Some(value.trim().trim_matches('"').to_string())
    }
}
