//! Fixture file lookup.

use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Convert a URL-derived relative path into a filesystem path.
///
/// Only plain segments are accepted; `..`, roots and prefixes yield `None`.
pub fn safe_relative(relative: &str) -> Option<PathBuf> {
    let path = Path::new(relative.trim_start_matches('/'));
    let mut clean = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(segment) => clean.push(segment),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

/// First `<dir>/<relative>` that exists as a file, searching `dirs` in order.
pub async fn find_in(dirs: &[PathBuf], relative: &Path) -> Option<PathBuf> {
    for dir in dirs {
        let candidate = dir.join(relative);
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

pub async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Read a JSON data file. Unreadable or invalid files yield an empty object.
pub async fn load_json(path: &Path) -> Value {
    let parsed = match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    parsed.unwrap_or_else(|error| {
        tracing::warn!(path = %path.display(), error = %error, "Fixture data unusable, using {{}}");
        Value::Object(Default::default())
    })
}
