//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Record the URL a request arrived with before any rewrite
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Original URL captured once; later rewrites never overwrite it

use axum::http::{HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The URL a request arrived with, stored as a request extension by the
/// first stage that rewrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUrl(pub Uri);

/// Store the current URI as the original URL unless one is already recorded.
pub fn preserve_original_url<B>(request: &mut Request<B>) {
    if request.extensions().get::<OriginalUrl>().is_none() {
        let uri = request.uri().clone();
        request.extensions_mut().insert(OriginalUrl(uri));
    }
}

/// Extension trait for reading the original URL back.
pub trait OriginalUrlExt {
    /// The URL before any rewrite, or the current URI when none happened.
    fn original_url(&self) -> &Uri;
}

impl<B> OriginalUrlExt for Request<B> {
    fn original_url(&self) -> &Uri {
        self.extensions()
            .get::<OriginalUrl>()
            .map(|o| &o.0)
            .unwrap_or_else(|| self.uri())
    }
}
