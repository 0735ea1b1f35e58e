//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the preview server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Rewrite/redirect/proxy rule sources.
    pub rewrite: RewriteConfig,

    /// Template and fixture data locations.
    pub fixtures: FixtureConfig,

    /// Upstream forwarding settings for `proxy` rules.
    pub proxy: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// When the rule files are re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Re-read on every request.
    #[default]
    PerRequest,
    /// Re-read when a file watcher reports a change.
    Watch,
    /// Read once at startup.
    Startup,
}

/// Rule source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Rule files, concatenated in this order. Missing files are allowed.
    pub rule_files: Vec<PathBuf>,

    /// Reload strategy.
    pub reload: ReloadPolicy,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            rule_files: vec![PathBuf::from("server.conf")],
            reload: ReloadPolicy::PerRequest,
        }
    }
}

/// Template and fixture locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Root directory holding `<namespace>/<page>.tpl` templates.
    pub view_path: PathBuf,

    /// Fixture data roots, searched in order.
    pub data_paths: Vec<PathBuf>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            view_path: PathBuf::from("views"),
            data_paths: vec![PathBuf::from("test")],
        }
    }
}

/// Upstream forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total upstream request timeout in seconds. `None` means no timeout.
    pub timeout_secs: Option<u64>,

    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
