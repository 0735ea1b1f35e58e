//! Template preview middleware.
//! Serves `/<namespace>/page/<page>` by rendering `<namespace>/<page>.tpl`
//! with the fixture data found at `<data>/<namespace>/page/<page>.json`,
//! optionally extended by the page's `<data>/<namespace>/page/<page>.js`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;

use crate::fixtures::lookup::{find_in, is_file, load_json, safe_relative};
use crate::fixtures::{merge_locals, Fixtures};
use crate::routing::RequestPaths;

/// A request path that names a preview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub namespace: String,
    pub page: String,
}

impl PageRef {
    /// Match `/<namespace>/page/<page>` (case-insensitive on `page`),
    /// dropping a trailing `.tpl` from the page name.
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let (namespace, rest) = rest.split_once('/')?;

        let valid_namespace = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if !valid_namespace {
            return None;
        }

        let (keyword, page) = rest.split_once('/')?;
        if !keyword.eq_ignore_ascii_case("page") {
            return None;
        }

        let page = match page.len().checked_sub(4) {
            Some(cut) if page.get(cut..).is_some_and(|ext| ext.eq_ignore_ascii_case(".tpl")) => {
                &page[..cut]
            }
            _ => page,
        };

        Some(Self {
            namespace: namespace.to_string(),
            page: page.to_string(),
        })
    }

    /// Template name relative to the view root.
    pub fn template_name(&self) -> String {
        format!("{}/{}.tpl", self.namespace, self.page)
    }

    /// Data file path relative to a data root.
    pub fn data_name(&self) -> String {
        format!("{}/page/{}.json", self.namespace, self.page)
    }

    /// Data script path relative to a data root.
    pub fn script_name(&self) -> String {
        format!("{}/page/{}.js", self.namespace, self.page)
    }
}

/// The preview stage.
pub async fn preview_middleware(
    State(fixtures): State<Arc<Fixtures>>,
    request: Request,
    next: Next,
) -> Response {
    let paths = RequestPaths::from_uri(request.uri());
    let Some(page) = PageRef::from_path(&paths.path) else {
        return next.run(request).await;
    };

    let template_name = page.template_name();
    let Some(template_rel) = safe_relative(&template_name) else {
        return next.run(request).await;
    };
    if !is_file(&fixtures.view_path.join(template_rel)).await {
        return next.run(request).await;
    }

    let mut data = match safe_relative(&page.data_name()) {
        Some(data_rel) => match find_in(&fixtures.data_paths, &data_rel).await {
            Some(file) => load_json(&file).await,
            None => Value::Object(Default::default()),
        },
        None => Value::Object(Default::default()),
    };

    if let Some(handler) = &fixtures.page_data {
        let script = match safe_relative(&page.script_name()) {
            Some(script_rel) => find_in(&fixtures.data_paths, &script_rel).await,
            None => None,
        };
        if let Some(script) = script {
            tracing::debug!(script = %script.display(), "Running page data script");
            if let Some(locals) = handler.augment(script, &request, &data).await {
                data = merge_locals(data, locals);
            }
        }
    }

    tracing::debug!(template = %template_name, "Rendering preview");

    match fixtures.renderer.render(&template_name, data) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(template = %template_name, error = %e, "Render failed");
            let message = format!("Failed to render {template_name}");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}
