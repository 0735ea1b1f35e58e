//! Rule file parsing.
//!
//! # Responsibilities
//! - Split rule sources into lines (`\n` or `\r\n`)
//! - Recognise `<rewrite|redirect|proxy> <pattern> <target>` lines
//! - Compile recognised lines into [`Rule`]s, preserving order
//!
//! # Design Decisions
//! - Lines that are not rules (blank, comments, prose) are dropped silently
//! - A line that looks like a rule but fails to compile is dropped with a
//!   warning; the rest of the source still parses
//! - Missing sources contribute zero rules

use std::io::ErrorKind;
use std::path::Path;

use crate::routing::matcher::{Action, Rule};
use crate::routing::router::RuleSet;

/// Parse in-memory rule sources, concatenated in the order given.
pub fn parse_sources<S: AsRef<str>>(sources: &[S]) -> RuleSet {
    let rules = sources
        .iter()
        .flat_map(|source| source.as_ref().lines())
        .filter_map(parse_line)
        .collect();

    RuleSet::new(rules)
}

/// Parse a single line into a rule.
///
/// Returns `None` for anything that is not a well-formed rule.
pub fn parse_line(line: &str) -> Option<Rule> {
    let mut tokens = line.split_whitespace();
    let action = Action::from_keyword(tokens.next()?)?;
    let pattern = tokens.next()?;
    let target = tokens.next()?;

    if tokens.next().is_some() {
        return None;
    }

    match Rule::compile(action, pattern, target) {
        Ok(rule) => Some(rule),
        Err(e) => {
            tracing::warn!(line = %line.trim(), error = %e, "Skipping rule");
            None
        }
    }
}

/// Read rule files from disk and parse them in order.
///
/// A file that does not exist contributes nothing. A file that exists but
/// cannot be read is logged and likewise contributes nothing.
pub async fn load_rule_files<P: AsRef<Path>>(paths: &[P]) -> RuleSet {
    let mut sources = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(content) => sources.push(content),
            Err(e) => log_unreadable(path, &e),
        }
    }

    parse_sources(&sources)
}

/// Blocking variant of [`load_rule_files`] for use off the async runtime,
/// e.g. from a file watcher callback.
pub fn load_rule_files_blocking<P: AsRef<Path>>(paths: &[P]) -> RuleSet {
    let sources: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            let path = path.as_ref();
            std::fs::read_to_string(path)
                .map_err(|e| log_unreadable(path, &e))
                .ok()
        })
        .collect();

    parse_sources(&sources)
}

fn log_unreadable(path: &Path, error: &std::io::Error) {
    if error.kind() != ErrorKind::NotFound {
        tracing::warn!(path = %path.display(), error = %error, "Rule file unreadable, ignoring");
    }
}
