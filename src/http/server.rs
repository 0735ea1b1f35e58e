//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the rewrite → preview → script pipeline in front of the
//!   host's inner service
//! - Wire up middleware (tracing, request ID)
//! - Load the rule set and, under `reload = "watch"`, keep it current
//! - Bind server to listener and shut down gracefully

use axum::{middleware, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::watcher::{apply_updates, RuleWatcher};
use crate::config::{ReloadPolicy, ServerConfig};
use crate::fixtures::{Fixtures, PageDataHandler, Renderer, ScriptHandler};
use crate::http::middleware::preview::preview_middleware;
use crate::http::middleware::rewrite::{rewrite_middleware, RewriteState};
use crate::http::middleware::script::script_middleware;
use crate::http::request::UuidRequestId;
use crate::http::response::not_found;
use crate::lifecycle::signals::shutdown_signal;
use crate::proxy::ProxyTransport;
use crate::routing::{RuleSet, RuleStore};

/// The development server: rule dispatch, template preview and fixtures in
/// front of an optional host application.
pub struct HttpServer {
    config: ServerConfig,
    rules: Arc<RuleStore>,
    transport: Arc<ProxyTransport>,
    fixtures: Fixtures,
    inner: Option<Router>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let rules = Arc::new(RuleStore::new(
            config.rewrite.rule_files.clone(),
            config.rewrite.reload,
        ));
        let transport = Arc::new(ProxyTransport::new(&config.proxy));
        let fixtures = Fixtures::new(&config.fixtures);

        Self {
            config,
            rules,
            transport,
            fixtures,
            inner: None,
        }
    }

    /// Serve a fixed rule set instead of the configured rule files.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = Arc::new(RuleStore::fixed(rules));
        self
    }

    /// Replace the default JSON renderer used by the preview stage.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.fixtures.renderer = Arc::new(renderer);
        self
    }

    /// Register the handler that executes `.js` fixtures.
    pub fn with_script_handler(mut self, handler: impl ScriptHandler + 'static) -> Self {
        self.fixtures.scripts = Some(Arc::new(handler));
        self
    }

    /// Register the handler that runs page data scripts for the preview
    /// stage.
    pub fn with_page_data_handler(mut self, handler: impl PageDataHandler + 'static) -> Self {
        self.fixtures.page_data = Some(Arc::new(handler));
        self
    }

    /// Mount the host application behind the pipeline. Requests no stage
    /// answers reach it with their rewritten URI.
    pub fn with_inner(mut self, inner: Router) -> Self {
        self.inner = Some(inner);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let fixtures = Arc::new(self.fixtures.clone());
        let rewrite_state = RewriteState {
            rules: Arc::clone(&self.rules),
            transport: Arc::clone(&self.transport),
        };
        let inner = self
            .inner
            .clone()
            .unwrap_or_else(|| Router::new().fallback(not_found));

        Router::new()
            .fallback_service(inner)
            .layer(middleware::from_fn_with_state(Arc::clone(&fixtures), script_middleware))
            .layer(middleware::from_fn_with_state(fixtures, preview_middleware))
            .layer(middleware::from_fn_with_state(rewrite_state, rewrite_middleware))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires or the process is interrupted.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        if !self.rules.files().is_empty() {
            let rules = self.rules.reload().await;
            tracing::info!(
                files = ?self.rules.files(),
                rules = rules.len(),
                reload = ?self.rules.policy(),
                "Rule set loaded"
            );
        }

        // Dropping the watcher stops it, so it lives until the server exits.
        let watching = self.rules.policy() == ReloadPolicy::Watch && !self.rules.files().is_empty();
        let _watcher = if watching {
            let (watcher, updates) = RuleWatcher::new(self.rules.files());
            match watcher.run() {
                Ok(handle) => {
                    tokio::spawn(apply_updates(
                        Arc::clone(&self.rules),
                        updates,
                        shutdown.resubscribe(),
                    ));
                    Some(handle)
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to start rule watcher, rules will not reload"
                    );
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            address = %addr,
            views = %self.fixtures.view_path.display(),
            data = ?self.fixtures.data_paths,
            "HTTP server starting"
        );

        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
