//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Rule files (server.conf, ...)
//!     → parser.rs (line grammar, compile patterns)
//!     → router.rs (ordered RuleSet, first match wins)
//!     → store.rs (atomic swap on reload)
//!
//! Incoming Request (raw path+query, decoded path)
//!     → RuleSet::resolve
//!     → Return: Match (rule + captures) or None
//! ```
//!
//! # Design Decisions
//! - Rule sets are rebuilt wholesale, never mutated in place
//! - Deterministic: same files always resolve the same way
//! - First match wins (ordered by declaration)

pub mod matcher;
pub mod parser;
pub mod router;
pub mod store;

pub use matcher::{Action, Rule, RuleError};
pub use parser::{load_rule_files, parse_sources};
pub use router::{Match, RequestPaths, RuleSet};
pub use store::RuleStore;
