//! Compiled routing rules.
//!
//! # Responsibilities
//! - Represent a single `(action, pattern, target)` rule
//! - Compile patterns as case-insensitive regular expressions
//! - Expand `$n` placeholders in targets from capture groups
//!
//! # Design Decisions
//! - Substring search semantics; patterns anchor themselves with `^`/`$`
//! - Missing capture groups expand to the empty string, never an error
//! - Rules are immutable once compiled

use regex::{Regex, RegexBuilder};
use std::fmt;

/// Error produced when a rule line cannot be compiled.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("proxy target `{0}` is not an absolute http URL")]
    InvalidProxyTarget(String),
}

/// What to do with a request once a rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Replace the request URI in-process and continue the pipeline.
    Rewrite,
    /// Terminate with `303 See Other`.
    Redirect,
    /// Forward to an upstream origin.
    Proxy,
}

impl Action {
    /// Parse an action keyword, ignoring ASCII case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("rewrite") {
            Some(Action::Rewrite)
        } else if keyword.eq_ignore_ascii_case("redirect") {
            Some(Action::Redirect)
        } else if keyword.eq_ignore_ascii_case("proxy") {
            Some(Action::Proxy)
        } else {
            None
        }
    }

    /// Lowercase keyword, used as a log field and metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Rewrite => "rewrite",
            Action::Redirect => "redirect",
            Action::Proxy => "proxy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled routing rule.
#[derive(Debug, Clone)]
pub struct Rule {
    action: Action,
    pattern: Regex,
    target: String,
}

impl Rule {
    /// Compile a rule from its raw tokens.
    ///
    /// Proxy targets are checked up front: with every placeholder filled
    /// in they must parse as an absolute `http://` URL.
    pub fn compile(action: Action, pattern: &str, target: &str) -> Result<Self, RuleError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        if action == Action::Proxy && !is_proxy_template(target) {
            return Err(RuleError::InvalidProxyTarget(target.to_string()));
        }

        Ok(Self {
            action,
            pattern: regex,
            target: target.to_string(),
        })
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Test the rule against one candidate, returning the capture groups.
    ///
    /// Index 0 is the whole match; groups that did not participate are `None`.
    pub fn captures(&self, candidate: &str) -> Option<Vec<Option<String>>> {
        self.pattern.captures(candidate).map(|caps| {
            caps.iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect()
        })
    }
}

/// Replace `$n` placeholders in `template` with the matching capture group.
///
/// Out-of-range and non-participating groups become the empty string. A `$`
/// not followed by a digit is copied verbatim.
pub fn expand(template: &str, groups: &[Option<String>]) -> String {
    expand_with(template, |index| {
        groups.get(index).and_then(|g| g.as_deref()).unwrap_or("")
    })
}

fn expand_with<'a>(template: &str, lookup: impl Fn(usize) -> &'a str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());

        if digits == 0 {
            out.push('$');
        } else {
            let group = after[..digits].parse::<usize>().map(&lookup).unwrap_or("");
            out.push_str(group);
        }
        rest = &after[digits..];
    }

    out.push_str(rest);
    out
}

fn is_proxy_template(target: &str) -> bool {
    // Placeholders are filled with a digit so `http://$1/` still yields a host.
    let probe = expand_with(target, |_| "0");
    match url::Url::parse(&probe) {
        Ok(url) => url.scheme() == "http" && url.host().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_action_keywords_ignore_case() {
        assert_eq!(Action::from_keyword("REWRITE"), Some(Action::Rewrite));
        assert_eq!(Action::from_keyword("Redirect"), Some(Action::Redirect));
        assert_eq!(Action::from_keyword("proxy"), Some(Action::Proxy));
        assert_eq!(Action::from_keyword("forward"), None);
    }

    #[test]
    fn test_pattern_is_case_insensitive() {
        let rule = Rule::compile(Action::Rewrite, "^/TestPage$", "/x").unwrap();
        assert!(rule.captures("/testpage").is_some());
        assert!(rule.captures("/TESTPAGE").is_some());
    }

    #[test]
    fn test_pattern_uses_substring_search() {
        let rule = Rule::compile(Action::Rewrite, "page", "/x").unwrap();
        assert!(rule.captures("/some/page/here").is_some());
    }

    #[test]
    fn test_escaped_slash_is_accepted() {
        let rule = Rule::compile(Action::Rewrite, r"^\/testpage", "/x").unwrap();
        assert!(rule.captures("/testpage").is_some());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Rule::compile(Action::Rewrite, "^/(unclosed", "/x").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn test_proxy_target_must_be_absolute() {
        assert!(Rule::compile(Action::Proxy, "^/api", "/relative").is_err());
        assert!(Rule::compile(Action::Proxy, "^/api", "ftp://host/").is_err());
        assert!(Rule::compile(Action::Proxy, "^/api", "http://upstream.local/$1").is_ok());
        assert!(Rule::compile(Action::Proxy, "^/(\\w+)", "http://$1.local/").is_ok());
    }

    #[test]
    fn test_expand_substitutes_groups() {
        let g = groups(&[Some("/old/a/b"), Some("a"), Some("b")]);
        assert_eq!(expand("/new/$2/$1", &g), "/new/b/a");
        assert_eq!(expand("$0", &g), "/old/a/b");
    }

    #[test]
    fn test_expand_missing_groups_are_empty() {
        let g = groups(&[Some("/x"), None]);
        assert_eq!(expand("/a/$1/$2/$12", &g), "/a///");
    }

    #[test]
    fn test_expand_keeps_bare_dollar() {
        assert_eq!(expand("/price$/$", &[]), "/price$/$");
    }
}
