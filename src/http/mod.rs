//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → middleware/rewrite.rs (rules: rewrite / 303 redirect / proxy)
//!     → middleware/preview.rs (template + fixture data)
//!     → middleware/script.rs (fixture JSON / scripts)
//!     → inner service, or response.rs 404
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{OriginalUrl, OriginalUrlExt, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
