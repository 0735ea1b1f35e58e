//! Upstream target resolution.
//!
//! Turns an expanded `proxy` rule target into the origin to connect to and
//! the path and query to request there.

use axum::http::Uri;
use url::Url;

use crate::proxy::ProxyError;

/// Where a proxied request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    origin: String,
    authority: String,
    path: String,
    query: Option<String>,
}

impl ProxyTarget {
    /// Parse an expanded target URL.
    ///
    /// The target's own query wins; without one, `inbound_query` (the query
    /// string of the request being proxied) is carried over.
    pub fn parse(target: &str, inbound_query: Option<&str>) -> Result<Self, ProxyError> {
        let url = Url::parse(target).map_err(|_| ProxyError::InvalidTarget(target.to_string()))?;

        if url.scheme() != "http" {
            return Err(ProxyError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ProxyError::InvalidTarget(target.to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let query = url
            .query()
            .or(inbound_query)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        Ok(Self {
            origin: url.origin().ascii_serialization(),
            authority,
            path: url.path().to_string(),
            query,
        })
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// `host[:port]`, the value sent as the upstream `Host` header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// Absolute URI for the upstream request.
    pub fn uri(&self) -> Result<Uri, ProxyError> {
        let full = format!("{}{}", self.origin, self.path_and_query());
        full.parse::<Uri>().map_err(|_| ProxyError::InvalidTarget(full))
    }
}
