//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Matched proxy rule (expanded target)
//!     → target.rs (origin, path, query)
//!     → transport.rs (pooled hyper client)
//!     → Upstream response, or 500 {"error": "proxy_error"}
//! ```

pub mod target;
pub mod transport;

use std::error::Error as _;
use std::time::Duration;

pub use target::ProxyTarget;
pub use transport::ProxyTransport;

/// Errors raised while resolving or forwarding to an upstream.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid proxy target `{0}`")]
    InvalidTarget(String),

    #[error("unsupported upstream scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("upstream request failed")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ProxyError {
    /// The error and all of its sources, joined for display to clients.
    pub fn reason(&self) -> String {
        let mut reason = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        reason
    }
}
