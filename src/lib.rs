//! Local development server library: rule-based rewrite, redirect and
//! proxy dispatch in front of template preview and fixture serving.

pub mod config;
pub mod fixtures;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::ServerConfig;
pub use fixtures::{PageDataHandler, Renderer, ScriptHandler, ScriptOutcome};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
