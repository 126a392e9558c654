//! Route state templates.
//!
//! A route's state fields may copy captured path segments into navigation
//! state. Each directive is a sigil followed by a 1-based capture index:
//!
//! | Directive | Result |
//! |-----------|--------|
//! | `$N` | capture N verbatim |
//! | `@N` | capture N decoded from its URL slug to the canonical uuid |
//! | `#N` | capture N parsed as a base-10 integer |
//!
//! Templates are parsed once when the route is built and resolved in a
//! single pass per navigation. Substituted text is never re-scanned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Result, RouterError};
use crate::slug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// `$`
    Raw,
    /// `@`
    DecodeId,
    /// `#`
    Integer,
}

impl Sigil {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '$' => Some(Sigil::Raw),
            '@' => Some(Sigil::DecodeId),
            '#' => Some(Sigil::Integer),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Sigil::Raw => '$',
            Sigil::DecodeId => '@',
            Sigil::Integer => '#',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Directive { sigil: Sigil, index: usize },
}

/// A parsed template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

/// A resolved state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Integer(i64),
    Text(String),
}

impl StateValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Text(text) => Some(text),
            StateValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StateValue::Integer(n) => Some(*n),
            StateValue::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            StateValue::Integer(n) => Value::from(n),
            StateValue::Text(text) => Value::String(text),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Integer(n) => write!(f, "{}", n),
            StateValue::Text(text) => f.write_str(text),
        }
    }
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            let Some(sigil) = Sigil::from_char(c) else {
                text.push(c);
                continue;
            };

            let mut end = start + c.len_utf8();
            while let Some((i, _)) = chars.next_if(|(_, d)| d.is_ascii_digit()) {
                end = i + 1;
            }

            let digits = &source[start + c.len_utf8()..end];
            // An index too large for usize can never name a capture; it stays
            // as text.
            match digits.parse::<usize>() {
                Ok(index) => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Directive { sigil, index });
                }
                Err(_) => text.push_str(&source[start..end]),
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_directives(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Directive { .. }))
    }

    /// Highest capture index referenced, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Directive { index, .. } => Some(*index),
                Segment::Text(_) => None,
            })
            .max()
    }

    /// Substitute every directive from `captures`, where `captures[0]` is the
    /// whole matched path.
    pub fn resolve(&self, captures: &[Option<String>]) -> Result<StateValue> {
        if let [Segment::Directive {
            sigil: Sigil::Integer,
            index,
        }] = self.segments.as_slice()
        {
            let raw = capture(captures, *index)?;
            return parse_integer(*index, raw).map(StateValue::Integer);
        }

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Directive { sigil, index } => {
                    let raw = capture(captures, *index)?;
                    match sigil {
                        Sigil::Raw => out.push_str(raw),
                        Sigil::DecodeId => out.push_str(&slug::decode_id(raw)?.to_string()),
                        Sigil::Integer => out.push_str(&parse_integer(*index, raw)?.to_string()),
                    }
                }
            }
        }
        Ok(StateValue::Text(out))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Directive { sigil, index } => write!(f, "{}{}", sigil.as_char(), index)?,
            }
        }
        Ok(())
    }
}

/// An unmatched optional capture reads as the empty string; an index past the
/// end of the capture vector is an error.
fn capture(captures: &[Option<String>], index: usize) -> Result<&str> {
    match captures.get(index) {
        Some(value) => Ok(value.as_deref().unwrap_or_default()),
        None => Err(RouterError::MissingCapture { index }),
    }
}

fn parse_integer(index: usize, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| RouterError::InvalidInteger {
        index,
        value: raw.to_string(),
    })
}

/// One state field of a route: a template string, or any other JSON literal
/// copied as is.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Template(Template),
    Literal(Value),
}

impl TemplateValue {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(source) => TemplateValue::Template(Template::parse(&source)),
            other => TemplateValue::Literal(other),
        }
    }

    pub fn max_index(&self) -> Option<usize> {
        match self {
            TemplateValue::Template(template) => template.max_index(),
            TemplateValue::Literal(_) => None,
        }
    }

    pub fn resolve(&self, captures: &[Option<String>]) -> Result<Value> {
        match self {
            TemplateValue::Template(template) => template.resolve(captures).map(StateValue::into_json),
            TemplateValue::Literal(value) => Ok(value.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TemplateValue::Template(template) => Value::String(template.source().to_string()),
            TemplateValue::Literal(value) => value.clone(),
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(source: &str) -> Self {
        TemplateValue::Template(Template::parse(source))
    }
}

impl Serialize for TemplateValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TemplateValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(TemplateValue::from_json)
    }
}

/// Resolve `template` against plain captures.
pub fn resolve(template: &str, captures: &[&str]) -> Result<StateValue> {
    let captures: Vec<Option<String>> = captures.iter().map(|c| Some(c.to_string())).collect();
    Template::parse(template).resolve(&captures)
}
