//! Fixture script middleware.
//! Serves `/test/**.json` and `/mock/**.json` straight from the data roots and
//! hands `.js` fixtures to the host's script handler.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::path::Path;
use std::sync::Arc;

use crate::fixtures::lookup::{find_in, safe_relative};
use crate::fixtures::{Fixtures, ScriptOutcome};
use crate::routing::RequestPaths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Json,
    Script,
}

/// Match `/test/<file>.(js|json)` or `/mock/<file>.(js|json)`, returning the
/// path below the prefix.
pub fn match_fixture(path: &str) -> Option<(&str, FixtureKind)> {
    let rest = strip_prefix_ignore_case(path, "/test/")
        .or_else(|| strip_prefix_ignore_case(path, "/mock/"))?;

    let extension = Path::new(rest).extension()?.to_str()?;
    let kind = if extension.eq_ignore_ascii_case("json") {
        FixtureKind::Json
    } else if extension.eq_ignore_ascii_case("js") {
        FixtureKind::Script
    } else {
        return None;
    };

    Some((rest, kind))
}

fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let head = path.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &path[prefix.len()..])
}

/// The script stage.
pub async fn script_middleware(
    State(fixtures): State<Arc<Fixtures>>,
    request: Request,
    next: Next,
) -> Response {
    let paths = RequestPaths::from_uri(request.uri());
    let Some((relative, kind)) = match_fixture(&paths.path) else {
        return next.run(request).await;
    };
    let Some(relative) = safe_relative(relative) else {
        return next.run(request).await;
    };
    let Some(file) = find_in(&fixtures.data_paths, &relative).await else {
        return next.run(request).await;
    };

    match kind {
        FixtureKind::Json => match tokio::fs::read(&file).await {
            Ok(bytes) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, bytes.len())
                .body(Body::from(bytes))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "Failed to read fixture");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read fixture").into_response()
            }
        },
        FixtureKind::Script => match &fixtures.scripts {
            Some(handler) => match handler.handle(file, request).await {
                ScriptOutcome::Handled(response) => response,
                ScriptOutcome::Declined(request) => next.run(request).await,
            },
            None => {
                tracing::debug!(
                    file = %file.display(),
                    "No script handler registered, passing through"
                );
                next.run(request).await
            }
        },
    }
}
