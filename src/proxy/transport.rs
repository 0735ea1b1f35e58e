//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Forward method, headers and body to a per-call upstream origin
//! - Rewrite `Host` to the upstream ("change origin")
//! - Rewrite upstream `Location` headers back through the proxy
//! - Turn transport failures into a `500` JSON response
//!
//! # Design Decisions
//! - One pooled client per process, shared by every proxy rule
//! - Failures stay inside the request; nothing here can take the server down
//! - No upstream timeout unless configured
//! - A body error after the response head was sent aborts the response;
//!   nothing is written twice

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Version},
    response::{IntoResponse, Response},
    Json,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::{Duration, Instant};
use url::Url;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::proxy::{ProxyError, ProxyTarget};

const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Shared reverse-proxy client.
#[derive(Debug, Clone)]
pub struct ProxyTransport {
    client: Client<HttpConnector, Body>,
    timeout: Option<Duration>,
}

impl ProxyTransport {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build(HttpConnector::new());

        Self {
            client,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Forward `request` to `target` and produce the client response.
    ///
    /// Always yields a response: the upstream's, or a `500` describing the
    /// transport failure.
    pub async fn forward(&self, request: Request<Body>, target: &ProxyTarget) -> Response {
        let start = Instant::now();
        let inbound_host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let method = request.method().clone();

        match self.send(request, target).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                rewrite_location_header(
                    &mut parts.headers,
                    parts.status,
                    target,
                    inbound_host.as_deref(),
                );

                tracing::debug!(
                    method = %method,
                    upstream = %target.origin(),
                    path = %target.path_and_query(),
                    status = parts.status.as_u16(),
                    "Upstream responded"
                );
                metrics::record_proxy("ok", start);

                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::warn!(
                    method = %method,
                    upstream = %target.origin(),
                    path = %target.path_and_query(),
                    error = %e.reason(),
                    "Proxy error"
                );
                metrics::record_proxy("error", start);

                error_response(&e)
            }
        }
    }

    async fn send(
        &self,
        request: Request<Body>,
        target: &ProxyTarget,
    ) -> Result<Response<Incoming>, ProxyError> {
        let request = prepare_request(request, target)?;
        let pending = self.client.request(request);

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| ProxyError::Timeout(limit))?,
            None => pending.await,
        };

        result.map_err(ProxyError::Upstream)
    }
}

/// Re-target an inbound request at the upstream.
pub fn prepare_request(
    request: Request<Body>,
    target: &ProxyTarget,
) -> Result<Request<Body>, ProxyError> {
    let (mut parts, body) = request.into_parts();

    parts.uri = target.uri()?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);

    let host = HeaderValue::from_str(target.authority())
        .map_err(|_| ProxyError::InvalidTarget(target.origin().to_string()))?;
    parts.headers.insert(header::HOST, host);

    Ok(Request::from_parts(parts, body))
}

/// The `500` response sent when forwarding fails.
pub fn error_response(error: &ProxyError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "proxy_error",
            "reason": error.reason(),
        })),
    )
        .into_response()
}

/// Map an upstream `Location` back through the proxy.
///
/// Only absolute locations pointing at the upstream origin are rewritten.
/// With an inbound `Host` the result is absolute on that host; otherwise it
/// is reduced to a path.
pub fn rewrite_location(
    location: &str,
    target: &ProxyTarget,
    inbound_host: Option<&str>,
) -> Option<String> {
    let url = Url::parse(location).ok()?;
    if url.origin().ascii_serialization() != target.origin() {
        return None;
    }

    let mut rewritten = match inbound_host {
        Some(host) => format!("http://{host}"),
        None => String::new(),
    };
    rewritten.push_str(url.path());
    if let Some(query) = url.query() {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        rewritten.push('#');
        rewritten.push_str(fragment);
    }

    Some(rewritten)
}

fn rewrite_location_header(
    headers: &mut HeaderMap,
    status: StatusCode,
    target: &ProxyTarget,
    inbound_host: Option<&str>,
) {
    if !matches!(status.as_u16(), 201 | 301 | 302 | 307 | 308) {
        return;
    }

    let rewritten = headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|location| rewrite_location(location, target, inbound_host))
        .and_then(|location| HeaderValue::from_str(&location).ok());

    if let Some(value) = rewritten {
        headers.insert(header::LOCATION, value);
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
