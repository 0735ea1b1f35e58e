//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared with the HTTP server at startup
//!
//! Rule files (reload = "watch"):
//!     watcher.rs detects change
//!     → routing::parser rebuilds the RuleSet
//!     → RuleStore swaps it in atomically
//! ```
//!
//! # Design Decisions
//! - Server config is immutable once loaded; only rule files reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FixtureConfig, ListenerConfig, ObservabilityConfig, ReloadPolicy, RewriteConfig,
    ServerConfig, UpstreamConfig,
};
