//! Pipeline stages, outermost first.
//!
//! ```text
//! rewrite (rules: rewrite / redirect / proxy)
//!     → preview (template + fixture data)
//!     → script (fixture JSON / scripts)
//!     → inner service (404 by default)
//! ```
//!
//! Each stage either answers the request or calls `next`, so a rewrite is
//! visible to every stage after it.

pub mod preview;
pub mod rewrite;
pub mod script;
