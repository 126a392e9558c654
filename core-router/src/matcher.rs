//! Route pattern compilation.
//!
//! Patterns are the small path dialect used by the route table:
//!
//! - literal text, matched case-insensitively
//! - `:name` for one path segment
//! - `:name?` for an optional segment (it absorbs its leading `/`)
//! - `*` for anything, including further slashes
//!
//! A compiled [`PathMatcher`] is anchored at both ends and tolerates a single
//! trailing slash on the input path.

use regex::Regex;
use std::collections::BTreeMap;

use crate::error::{Result, RouterError};

/// Regex fragment for one named segment.
const SEGMENT: &str = "[^/]+?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    /// Segment name, or its position among unnamed keys (`"0"`, `"1"`, …).
    pub name: String,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct PathMatcher {
    pattern: String,
    regex: Regex,
    keys: Vec<PathKey>,
}

impl PathMatcher {
    pub fn compile(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut source = String::from("(?i)^");
        let mut keys = Vec::new();
        let mut unnamed = 0usize;
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ':' => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            name.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        return Err(invalid("`:` must be followed by a segment name"));
                    }
                    if keys.iter().any(|key: &PathKey| key.name == name) {
                        return Err(invalid(&format!("segment `{}` is declared twice", name)));
                    }

                    let optional = chars.next_if_eq(&'?').is_some();
                    let prefixed = literal.ends_with('/');
                    if prefixed {
                        literal.pop();
                    }
                    source.push_str(&regex::escape(&literal));
                    literal.clear();

                    let prefix = if prefixed { "/" } else { "" };
                    if optional {
                        source.push_str(&format!("(?:{}({}))?", prefix, SEGMENT));
                    } else {
                        source.push_str(&format!("{}({})", prefix, SEGMENT));
                    }
                    keys.push(PathKey { name, optional });
                }
                '*' => {
                    source.push_str(&regex::escape(&literal));
                    literal.clear();
                    source.push_str("(.*)");
                    keys.push(PathKey {
                        name: unnamed.to_string(),
                        optional: false,
                    });
                    unnamed += 1;
                }
                other => literal.push(other),
            }
        }

        if literal.ends_with('/') {
            literal.pop();
        }
        source.push_str(&regex::escape(&literal));
        source.push_str("/?$");

        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            keys,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.keys
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let captures = (0..=self.keys.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();

        Some(PathMatch {
            captures,
            names: self.keys.iter().map(|key| key.name.clone()).collect(),
        })
    }
}

/// Result of matching one path.
///
/// `captures[0]` is the whole matched path and `captures[i]` is the value of
/// key `i - 1`. An optional segment that did not match is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    captures: Vec<Option<String>>,
    names: Vec<String>,
}

impl PathMatch {
    pub fn url(&self) -> &str {
        self.captures
            .first()
            .and_then(|c| c.as_deref())
            .unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.captures.get(index).and_then(|c| c.as_deref())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        let position = self.names.iter().position(|n| n == name)?;
        self.get(position + 1)
    }

    /// Named values that matched; unmatched optional segments are left out.
    pub fn params(&self) -> BTreeMap<String, String> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Some((name.clone(), self.get(i + 1)?.to_string())))
            .collect()
    }

    pub fn captures(&self) -> &[Option<String>] {
        &self.captures
    }

    /// Number of keys, i.e. the highest valid directive index.
    pub fn key_count(&self) -> usize {
        self.names.len()
    }
}
