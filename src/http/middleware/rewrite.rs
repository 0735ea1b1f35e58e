//! Rule dispatch middleware.
//! Resolves each request against the rule set and rewrites, redirects or
//! proxies it; unmatched requests continue down the pipeline untouched.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::http::request::preserve_original_url;
use crate::http::response::see_other;
use crate::observability::metrics;
use crate::proxy::{ProxyTarget, ProxyTransport};
use crate::routing::{Action, RuleSet, RuleStore};

/// State of the dispatch stage.
#[derive(Debug, Clone)]
pub struct RewriteState {
    pub rules: Arc<RuleStore>,
    pub transport: Arc<ProxyTransport>,
}

/// What the dispatch stage decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No rule matched (or the matched target was unusable).
    PassThrough,
    /// Answer `303` with this location.
    Redirect(String),
    /// Continue with this URI.
    Rewrite(Uri),
    /// Forward upstream.
    Proxy(ProxyTarget),
}

/// Decide how to handle a request URI under `rules`.
pub fn plan(rules: &RuleSet, uri: &Uri) -> Dispatch {
    let Some(found) = rules.resolve_uri(uri) else {
        return Dispatch::PassThrough;
    };

    let target = found.expand_target();
    metrics::record_rule_match(found.action());

    match found.action() {
        Action::Redirect => Dispatch::Redirect(target),
        Action::Rewrite => match parse_rewrite_target(&target) {
            Some(rewritten) => Dispatch::Rewrite(rewritten),
            None => {
                tracing::warn!(
                    pattern = %found.rule.pattern(),
                    target = %target,
                    "Rewrite target is not a URL path, ignoring rule"
                );
                Dispatch::PassThrough
            }
        },
        Action::Proxy => match ProxyTarget::parse(&target, uri.query()) {
            Ok(proxy_target) => Dispatch::Proxy(proxy_target),
            Err(e) => {
                tracing::warn!(
                    pattern = %found.rule.pattern(),
                    target = %target,
                    error = %e,
                    "Proxy target unusable, ignoring rule"
                );
                Dispatch::PassThrough
            }
        },
    }
}

fn parse_rewrite_target(target: &str) -> Option<Uri> {
    let uri = target.parse::<Uri>().ok()?;
    if target.starts_with('/') || uri.scheme().is_some() {
        Some(uri)
    } else {
        None
    }
}

/// What to do with a request once its [`Dispatch`] is applied.
pub enum Step {
    /// Hand the (possibly rewritten) request to the next stage.
    Continue(Request),
    /// Answer locally.
    Respond(Response),
    /// Forward the request upstream.
    Forward(Request, ProxyTarget),
}

/// Apply a dispatch decision to the request it was planned for.
pub fn apply(dispatch: Dispatch, mut request: Request) -> Step {
    match dispatch {
        Dispatch::PassThrough => Step::Continue(request),
        Dispatch::Redirect(location) => {
            tracing::debug!(from = %request.uri(), to = %location, "Redirecting");
            Step::Respond(see_other(&location))
        }
        Dispatch::Rewrite(uri) => {
            tracing::debug!(from = %request.uri(), to = %uri, "Rewriting");
            preserve_original_url(&mut request);
            *request.uri_mut() = uri;
            Step::Continue(request)
        }
        Dispatch::Proxy(target) => {
            tracing::debug!(
                from = %request.uri(),
                upstream = %target.origin(),
                path = %target.path_and_query(),
                "Proxying"
            );
            preserve_original_url(&mut request);
            Step::Forward(request, target)
        }
    }
}

/// The dispatch stage.
pub async fn rewrite_middleware(
    State(state): State<RewriteState>,
    request: Request,
    next: Next,
) -> Response {
    let rules = state.rules.for_request().await;
    let dispatch = plan(&rules, request.uri());

    match apply(dispatch, request) {
        Step::Continue(request) => next.run(request).await,
        Step::Respond(response) => response,
        Step::Forward(request, target) => state.transport.forward(request, &target).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::OriginalUrlExt;
    use crate::routing::parse_sources;
    use axum::body::Body;
    use axum::http::StatusCode;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_plan_no_match() {
        let rules = parse_sources(&["rewrite ^/a$ /b"]);
        assert_eq!(plan(&rules, &uri("/zzz")), Dispatch::PassThrough);
    }

    #[test]
    fn test_plan_redirect_with_captures() {
        let rules = parse_sources(&["redirect ^/old/(.*)$ /new/$1"]);
        assert_eq!(plan(&rules, &uri("/old/page")), Dispatch::Redirect("/new/page".into()));
    }

    #[test]
    fn test_plan_rewrite() {
        let rules = parse_sources(&["rewrite ^/testpage$ /example/page/testpage"]);
        assert_eq!(
            plan(&rules, &uri("/testpage")),
            Dispatch::Rewrite(uri("/example/page/testpage"))
        );
    }

    #[test]
    fn test_plan_rewrite_with_unusable_target_passes_through() {
        let rules = parse_sources(&["rewrite ^/a$ not-a-path"]);
        assert_eq!(plan(&rules, &uri("/a")), Dispatch::PassThrough);
    }

    #[test]
    fn test_plan_proxy_carries_query() {
        let rules = parse_sources(&["proxy ^/api/(.*)$ http://example.com/$1"]);
        let Dispatch::Proxy(target) = plan(&rules, &uri("/api/foo?x=1")) else {
            panic!("expected proxy");
        };
        assert_eq!(target.origin(), "http://example.com");
        assert_eq!(target.path(), "/foo");
        assert_eq!(target.query(), Some("x=1"));
    }

    #[test]
    fn test_plan_proxy_with_host_capture() {
        let rules = parse_sources(&["proxy ^/svc/(\\w+)/(.*)$ http://$1.local/$2"]);
        let Dispatch::Proxy(target) = plan(&rules, &uri("/svc/users/list")) else {
            panic!("expected proxy");
        };
        assert_eq!(target.origin(), "http://users.local");
        assert_eq!(target.path(), "/list");
    }

    #[test]
    fn test_plan_proxy_with_broken_expansion_passes_through() {
        // `$1` is empty for this request, leaving no host.
        let rules = parse_sources(&["proxy ^/svc/(\\w*)$ http://$1/"]);
        assert_eq!(plan(&rules, &uri("/svc/")), Dispatch::PassThrough);
    }

    fn request(uri: &str) -> Request {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_apply_proxy_records_original_url() {
        let rules = parse_sources(&["proxy ^/api/(.*)$ http://example.com/$1"]);
        let incoming = request("/api/foo?x=1");
        let dispatch = plan(&rules, incoming.uri());

        let Step::Forward(forwarded, target) = apply(dispatch, incoming) else {
            panic!("expected forward");
        };
        assert_eq!(target.path_and_query(), "/foo?x=1");
        assert_eq!(forwarded.original_url(), "/api/foo?x=1");
    }

    #[test]
    fn test_apply_rewrite_keeps_first_original_url() {
        let first = parse_sources(&["rewrite ^/a$ /b"]);
        let second = parse_sources(&["rewrite ^/b$ /c"]);

        let incoming = request("/a");
        let Step::Continue(rewritten) = apply(plan(&first, incoming.uri()), incoming) else {
            panic!("expected continue");
        };
        let Step::Continue(rewritten) = apply(plan(&second, rewritten.uri()), rewritten) else {
            panic!("expected continue");
        };

        assert_eq!(rewritten.uri(), "/c");
        assert_eq!(rewritten.original_url(), "/a");
    }

    #[test]
    fn test_apply_redirect_responds() {
        let dispatch = Dispatch::Redirect("/new".into());
        let Step::Respond(response) = apply(dispatch, request("/old")) else {
            panic!("expected response");
        };
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
