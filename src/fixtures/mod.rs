//! Fixture-backed collaborators of the preview and script stages.
//!
//! # Responsibilities
//! - Locate templates and fixture data on disk
//! - Define the rendering capability the preview stage calls into
//! - Define the script capability the script stage delegates `.js` files to
//! - Define the page data capability that extends preview data from a
//!   page's `.js` file
//!
//! # Design Decisions
//! - Capabilities are supplied by the host; the server ships a JSON
//!   renderer and no script or page data handler
//! - Fixture files are re-read per request so edits show up immediately

pub mod lookup;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::FixtureConfig;

/// Error type renderers may return.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Renders a template with its fixture data.
pub trait Renderer: Send + Sync {
    /// `template` is relative to the view root, e.g. `example/testpage.tpl`.
    fn render(&self, template: &str, data: Value) -> Result<Response, RenderError>;
}

/// Default renderer: answers with the template name and the data it
/// would have been rendered with.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, template: &str, data: Value) -> Result<Response, RenderError> {
        Ok(Json(serde_json::json!({
            "template": template,
            "data": data,
        }))
        .into_response())
    }
}

/// Result of handing a request to a [`ScriptHandler`].
pub enum ScriptOutcome {
    /// The script produced the response.
    Handled(Response),
    /// The script passed; the request continues down the pipeline.
    Declined(Request<Body>),
}

/// Executes fixture scripts (`/test/**.js`, `/mock/**.js`) as request handlers.
pub trait ScriptHandler: Send + Sync {
    fn handle(&self, script: PathBuf, request: Request<Body>) -> BoxFuture<'static, ScriptOutcome>;
}

/// Runs a page's data script (`<data>/<namespace>/page/<page>.js`) before
/// the page is rendered.
///
/// The handler sees the request and the data loaded from the page's JSON
/// fixture. Returning `Some(locals)` merges `locals` into that data;
/// `None` renders the data unchanged. Anything needed from `request` must
/// be copied out before the returned future is built.
pub trait PageDataHandler: Send + Sync {
    fn augment(
        &self,
        script: PathBuf,
        request: &Request<Body>,
        data: &Value,
    ) -> BoxFuture<'static, Option<Value>>;
}

/// Shallow-merge `locals` into `data`: top-level keys of `locals` win.
/// When either side is not an object, `locals` replaces `data`.
pub fn merge_locals(data: Value, locals: Value) -> Value {
    match (data, locals) {
        (Value::Object(mut data), Value::Object(locals)) => {
            data.extend(locals);
            Value::Object(data)
        }
        (_, locals) => locals,
    }
}

/// Shared state of the preview and script stages.
#[derive(Clone)]
pub struct Fixtures {
    pub view_path: PathBuf,
    pub data_paths: Vec<PathBuf>,
    pub renderer: Arc<dyn Renderer>,
    pub scripts: Option<Arc<dyn ScriptHandler>>,
    pub page_data: Option<Arc<dyn PageDataHandler>>,
}

impl Fixtures {
    pub fn new(config: &FixtureConfig) -> Self {
        Self {
            view_path: config.view_path.clone(),
            data_paths: config.data_paths.clone(),
            renderer: Arc::new(JsonRenderer),
            scripts: None,
            page_data: None,
        }
    }
}

impl std::fmt::Debug for Fixtures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixtures")
            .field("view_path", &self.view_path)
            .field("data_paths", &self.data_paths)
            .field("scripts", &self.scripts.is_some())
            .field("page_data", &self.page_data.is_some())
            .finish()
    }
}
