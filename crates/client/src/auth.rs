//! Authentication strategies.
//!
//! Each strategy knows how to stamp itself onto a request: header-based
//! schemes replace their header (so auth wins over plain header pairs
//! applied earlier), and query-based auth uses replace semantics for its
//! key. Debug output never reveals credentials.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hermod_common::QueryEdit;
use reqwest::header::AUTHORIZATION;

use crate::error::ClientResult;
use crate::request::Req;

/// An authentication strategy to apply to a request.
#[derive(Clone)]
pub struct Auth {
    scheme: Scheme,
}

#[derive(Clone)]
enum Scheme {
    Bearer(String),
    Basic(String),
    Header { name: String, value: String },
    Query { key: String, value: String },
    Chain(Vec<Auth>),
}

impl Auth {
    /// `Authorization: Bearer <token>`.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { scheme: Scheme::Bearer(token.into()) }
    }

    /// `Authorization: Basic <base64(user:pass)>`.
    pub fn basic(user: &str, pass: &str) -> Self {
        let encoded = BASE64.encode(format!("{user}:{pass}"));
        Self { scheme: Scheme::Basic(encoded) }
    }

    /// Arbitrary header credential, replacing any existing value.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { scheme: Scheme::Header { name: name.into(), value: value.into() } }
    }

    /// Query-parameter credential with replace semantics for `key`.
    pub fn query(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { scheme: Scheme::Query { key: key.into(), value: value.into() } }
    }

    /// Apply several strategies in order.
    pub fn chain(auths: impl IntoIterator<Item = Auth>) -> Self {
        Self { scheme: Scheme::Chain(auths.into_iter().collect()) }
    }

    /// Stamp this strategy onto `req`.
    pub(crate) fn apply(&self, req: Req) -> ClientResult<Req> {
        match &self.scheme {
            Scheme::Bearer(token) => {
                req.set_header(AUTHORIZATION.as_str(), format!("Bearer {token}"))
            }
            Scheme::Basic(encoded) => {
                req.set_header(AUTHORIZATION.as_str(), format!("Basic {encoded}"))
            }
            Scheme::Header { name, value } => req.set_header(name, value),
            Scheme::Query { key, value } => {
                Ok(req.query(&QueryEdit::new().replace(key.clone(), value.clone())))
            }
            Scheme::Chain(auths) => {
                let mut req = req;
                for auth in auths {
                    req = auth.apply(req)?;
                }
                Ok(req)
            }
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scheme {
            Scheme::Bearer(_) => write!(f, "Auth(bearer ****)"),
            Scheme::Basic(_) => write!(f, "Auth(basic ****)"),
            Scheme::Header { name, .. } => write!(f, "Auth(header {name} ****)"),
            Scheme::Query { key, .. } => write!(f, "Auth(query {key}=****)"),
            Scheme::Chain(auths) => write!(f, "Auth(chain x{})", auths.len()),
        }
    }
}
