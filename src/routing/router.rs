//! Rule lookup.
//!
//! # Responsibilities
//! - Store compiled rules in declaration order
//! - Resolve request candidates to the first matching rule
//! - Derive match candidates from a request URI
//!
//! # Design Decisions
//! - Immutable after construction (shared via `Arc`, swapped on reload)
//! - Rule-major iteration: every candidate is tried against a rule before
//!   moving on to the next rule
//! - Explicit `None` on no match rather than a silent default

use axum::http::Uri;
use percent_encoding::percent_decode_str;

use crate::routing::matcher::{expand, Action, Rule};

/// An ordered, immutable collection of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// A rule that matched, with the capture groups for the matched candidate.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    pub rule: &'a Rule,
    /// Capture groups; index 0 is the whole match.
    pub groups: Vec<Option<String>>,
}

impl Match<'_> {
    pub fn action(&self) -> Action {
        self.rule.action()
    }

    /// The rule's target with `$n` placeholders filled in.
    pub fn expand_target(&self) -> String {
        expand(self.rule.target(), &self.groups)
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the first rule matching any candidate.
    pub fn resolve<S: AsRef<str>>(&self, candidates: &[S]) -> Option<Match<'_>> {
        self.rules.iter().find_map(|rule| {
            candidates
                .iter()
                .find_map(|candidate| rule.captures(candidate.as_ref()))
                .map(|groups| Match { rule, groups })
        })
    }

    /// Resolve against the candidates derived from `uri`.
    pub fn resolve_uri(&self, uri: &Uri) -> Option<Match<'_>> {
        self.resolve(&RequestPaths::from_uri(uri).candidates())
    }
}

/// The two views of a request URL that rules are tested against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPaths {
    /// Path plus query string, exactly as received.
    pub raw: String,
    /// Percent-decoded path without the query.
    pub path: String,
}

impl RequestPaths {
    pub fn from_uri(uri: &Uri) -> Self {
        let raw = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        let path = percent_decode_str(uri.path()).decode_utf8_lossy().into_owned();

        Self { raw, path }
    }

    /// Candidates in match order: raw first, then the decoded path.
    pub fn candidates(&self) -> Vec<&str> {
        if self.raw == self.path {
            vec![self.raw.as_str()]
        } else {
            vec![self.raw.as_str(), self.path.as_str()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::parser::parse_sources;

    #[test]
    fn test_first_declared_rule_wins() {
        let set = parse_sources(&["rewrite ^/a /first\nrewrite ^/a/b$ /more-specific"]);
        let found = set.resolve(&["/a/b"]).unwrap();
        assert_eq!(found.expand_target(), "/first");
    }

    #[test]
    fn test_rule_major_iteration() {
        // Rule 1 only matches the decoded path, rule 2 only the raw path.
        // Rule 1 still wins because it is declared first.
        let set = parse_sources(&["rewrite ^/a\\sb$ /decoded\nrewrite %20 /raw"]);
        let found = set.resolve(&["/a%20b", "/a b"]).unwrap();
        assert_eq!(found.expand_target(), "/decoded");
    }

    #[test]
    fn test_first_matching_candidate_supplies_captures() {
        let set = parse_sources(&["rewrite ^/(.*)$ /x/$1"]);
        let found = set.resolve(&["/raw?q=1", "/raw"]).unwrap();
        assert_eq!(found.expand_target(), "/x/raw?q=1");
    }

    #[test]
    fn test_no_match_returns_none() {
        let set = parse_sources(&["rewrite ^/a$ /b"]);
        assert!(set.resolve(&["/c", "/c"]).is_none());
        assert!(RuleSet::default().resolve(&["/a"]).is_none());
    }

    #[test]
    fn test_unresolved_groups_expand_empty() {
        let set = parse_sources(&["redirect ^/old/(a)?$ /new/$1/$2"]);
        let found = set.resolve(&["/old/"]).unwrap();
        assert_eq!(found.expand_target(), "/new//");
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let source = "rewrite ^/a /1\nredirect ^/b/(.*) /2/$1\nproxy ^/c http://up.local/";
        let first = parse_sources(&[source]);
        let second = parse_sources(&[source]);

        for path in ["/a", "/b/x", "/c", "/d"] {
            let a = first.resolve(&[path]).map(|m| (m.action(), m.expand_target()));
            let b = second.resolve(&[path]).map(|m| (m.action(), m.expand_target()));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_request_paths_from_uri() {
        let uri: Uri = "/caf%C3%A9/page?x=1".parse().unwrap();
        let paths = RequestPaths::from_uri(&uri);
        assert_eq!(paths.raw, "/caf%C3%A9/page?x=1");
        assert_eq!(paths.path, "/café/page");
        assert_eq!(paths.candidates(), vec!["/caf%C3%A9/page?x=1", "/café/page"]);
    }

    #[test]
    fn test_request_paths_collapse_when_identical() {
        let uri: Uri = "/plain".parse().unwrap();
        assert_eq!(RequestPaths::from_uri(&uri).candidates(), vec!["/plain"]);
    }
}
