//! Locally generated responses.
//!
//! # Responsibilities
//! - Build the `303 See Other` redirect page
//! - Build the fallback `404`
//!
//! # Design Decisions
//! - Redirect bodies are HTML-escaped so targets cannot inject markup

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Escape `&`, `"`, `'`, `<` and `>` for inclusion in HTML.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `303 See Other` to `location`, with a small HTML body linking to it.
pub fn see_other(location: &str) -> Response {
    let Ok(location_header) = HeaderValue::from_str(location) else {
        tracing::warn!(location = %location, "Redirect target is not a valid header value");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let escaped = escape_html(location);
    let body = format!("Redirecting to <a href=\"{escaped}\">{escaped}</a>\n");

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::LOCATION, location_header)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Terminal handler for requests no stage claimed.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"/x?a=1&b="<script>'"#),
            "/x?a=1&amp;b=&quot;&lt;script&gt;&#39;"
        );
        assert_eq!(escape_html("/plain/path"), "/plain/path");
    }

    #[tokio::test]
    async fn test_see_other() {
        let response = see_other("/new");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/new");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Redirecting to <a href=\"/new\">/new</a>\n");
    }

    #[tokio::test]
    async fn test_see_other_escapes_body_only() {
        let response = see_other("/n?a=<b>");
        assert_eq!(response.headers()[header::LOCATION], "/n?a=<b>");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("href=\"/n?a=&lt;b&gt;\""));
        assert!(!body.contains("<b>"));
    }

    #[test]
    fn test_invalid_location_is_a_server_error() {
        assert_eq!(see_other("/bad\nheader").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
