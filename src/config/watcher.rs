//! Rule file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use crate::routing::parser::load_rule_files_blocking;
use crate::routing::{RuleSet, RuleStore};

/// A watcher that monitors the rule files for changes.
pub struct RuleWatcher {
    files: Vec<PathBuf>,
    update_tx: mpsc::UnboundedSender<RuleSet>,
}

impl RuleWatcher {
    /// Create a new RuleWatcher.
    ///
    /// Returns the watcher and a receiver for rebuilt rule sets.
    pub fn new(files: &[PathBuf]) -> (Self, mpsc::UnboundedReceiver<RuleSet>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        let watcher = Self {
            files: files.to_vec(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in a background thread.
    ///
    /// Parent directories are watched rather than the files themselves so a
    /// rule file may be created after startup, or replaced by an editor.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let files = self.files.clone();

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let relevant = event
                    .paths
                    .iter()
                    .any(|p| files.iter().any(|f| same_file(p, f)));
                let kind = event.kind;
                if relevant && (kind.is_modify() || kind.is_create() || kind.is_remove()) {
                    tracing::info!("Rule file change detected, reloading...");
                    let _ = tx.send(load_rule_files_blocking(&files));
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        };
        let config = Config::default().with_poll_interval(Duration::from_secs(2));
        let mut watcher = RecommendedWatcher::new(handler, config)?;

        for dir in watch_dirs(&self.files) {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(files = ?self.files, "Rule watcher started");
        Ok(watcher)
    }
}

/// Apply rebuilt rule sets to the store until the channel closes or
/// shutdown is signalled.
pub async fn apply_updates(
    store: Arc<RuleStore>,
    mut updates: mpsc::UnboundedReceiver<RuleSet>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(rules) => store.replace(rules),
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

fn watch_dirs(files: &[PathBuf]) -> BTreeSet<PathBuf> {
    files
        .iter()
        .map(|f| match f.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
        .collect()
}

fn same_file(event_path: &Path, rule_file: &Path) -> bool {
    if event_path == rule_file {
        return true;
    }
    // Event paths are absolute; configured paths may be relative.
    match (event_path.file_name(), rule_file.file_name()) {
        (Some(a), Some(b)) if a == b => {
            let parent = rule_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            match std::fs::canonicalize(parent) {
                Ok(dir) => event_path.parent() == Some(dir.as_path()),
                Err(_) => true,
            }
        }
        _ => false,
    }
}
