//! Shared, reloadable rule set.
//!
//! # Responsibilities
//! - Hold the active [`RuleSet`] behind an atomically swapped pointer
//! - Rebuild the set from the configured rule files on demand
//! - Hand readers a complete snapshot that later reloads cannot mutate
//!
//! # Design Decisions
//! - Reload is a pure function of file contents; concurrent reloads may
//!   race but always publish equivalent sets, so no lock is taken
//! - Readers hold an `Arc<RuleSet>` for the duration of a request

use arc_swap::ArcSwap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ReloadPolicy;
use crate::routing::parser::load_rule_files;
use crate::routing::router::RuleSet;

/// The process-wide rule set and where it comes from.
#[derive(Debug)]
pub struct RuleStore {
    files: Vec<PathBuf>,
    policy: ReloadPolicy,
    current: ArcSwap<RuleSet>,
}

impl RuleStore {
    /// Create an empty store. Call [`RuleStore::reload`] to populate it.
    pub fn new(files: Vec<PathBuf>, policy: ReloadPolicy) -> Self {
        Self {
            files,
            policy,
            current: ArcSwap::from_pointee(RuleSet::default()),
        }
    }

    /// Create a store serving a fixed, in-memory rule set.
    pub fn fixed(rules: RuleSet) -> Self {
        Self {
            files: Vec::new(),
            policy: ReloadPolicy::Startup,
            current: ArcSwap::from_pointee(rules),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    /// The rule set to use for one request.
    ///
    /// Under [`ReloadPolicy::PerRequest`] the files are re-read first;
    /// otherwise the last published set is returned.
    pub async fn for_request(&self) -> Arc<RuleSet> {
        match self.policy {
            ReloadPolicy::PerRequest => self.reload().await,
            ReloadPolicy::Watch | ReloadPolicy::Startup => self.snapshot(),
        }
    }

    /// The last published rule set.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Rebuild from disk and publish the result.
    pub async fn reload(&self) -> Arc<RuleSet> {
        let rules = Arc::new(load_rule_files(&self.files).await);
        self.current.store(Arc::clone(&rules));
        rules
    }

    /// Publish an externally built rule set.
    pub fn replace(&self, rules: RuleSet) {
        tracing::info!(rules = rules.len(), "Rule set replaced");
        self.current.store(Arc::new(rules));
    }
}
