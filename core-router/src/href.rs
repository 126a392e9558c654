//! Link calculation.
//!
//! UI links are described by an [`HrefTarget`] rather than a literal URL so
//! that ids are slug-encoded and names cleaned the same way everywhere. A
//! target's page may be a magic reference that is resolved against the
//! current location when the link is followed.

use serde::{Deserialize, Serialize};

use crate::enums::Page;
use crate::matcher::PathMatcher;
use crate::query::{write_query, QueryMap};
use crate::slug;

pub const PARENT_TOKEN: &str = "$parent";
pub const MODALLESS_TOKEN: &str = "$modalless";

const NAME_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageRef {
    Literal(String),
    /// First segment of the current pathname.
    Parent,
    /// The page that was showing before any modal opened.
    Modalless,
}

impl From<String> for PageRef {
    fn from(token: String) -> Self {
        match token.as_str() {
            PARENT_TOKEN => PageRef::Parent,
            MODALLESS_TOKEN => PageRef::Modalless,
            _ => PageRef::Literal(token),
        }
    }
}

impl From<&str> for PageRef {
    fn from(token: &str) -> Self {
        PageRef::from(token.to_string())
    }
}

impl From<PageRef> for String {
    fn from(page: PageRef) -> Self {
        match page {
            PageRef::Literal(token) => token,
            PageRef::Parent => PARENT_TOKEN.to_string(),
            PageRef::Modalless => MODALLESS_TOKEN.to_string(),
        }
    }
}

/// Description of a link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrefTarget {
    #[serde(default)]
    pub page: Option<PageRef>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub query: QueryMap,
    /// Use `id` as given instead of slug-encoding it.
    #[serde(default)]
    pub unencode: bool,
}

impl HrefTarget {
    pub fn page(page: impl Into<PageRef>) -> Self {
        Self {
            page: Some(page.into()),
            ..Default::default()
        }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn unencoded(mut self) -> Self {
        self.unencode = true;
        self
    }
}

/// Token written in URLs for the page behind a modal.
pub fn modalless_token(page: Page) -> &'static str {
    match page {
        Page::About => "About",
        Page::Music => "Media",
        Page::News => "News",
        Page::Records => "Records",
        Page::Admin => "ADMIN",
        _ => "",
    }
}

/// First segment of `pathname` when it has at least two, else empty.
pub fn parent_token(pathname: &str) -> String {
    PathMatcher::compile("/:page/*")
        .ok()
        .and_then(|matcher| matcher.matches(pathname))
        .and_then(|m| m.param("page").map(str::to_string))
        .unwrap_or_default()
}

/// Resolve a page reference to a concrete token.
pub fn resolve_page(page: &PageRef, pathname: &str, current_page: Page) -> String {
    match page {
        PageRef::Literal(token) => token.clone(),
        PageRef::Parent => parent_token(pathname),
        PageRef::Modalless => modalless_token(current_page).to_string(),
    }
}

/// Clean an entity name for use as the last URL segment.
///
/// `"The Green-Rooster / Bar"` becomes `"The_Green_Rooster_Bar"`.
pub fn sanitize_name(name: &str) -> String {
    let cut: String = name.chars().take(NAME_MAX_CHARS).collect();
    let mut out = String::with_capacity(cut.len());

    for c in cut.trim().chars() {
        let c = match c {
            ' ' | '-' | '\\' | '/' => '_',
            other => other,
        };
        if !(c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Build the URL for `target` given the current pathname and page.
pub fn calculate(target: &HrefTarget, pathname: &str, current_page: Page) -> String {
    let page = target
        .page
        .as_ref()
        .map(|page| resolve_page(page, pathname, current_page))
        .unwrap_or_default();
    let id = target.id.as_deref().filter(|id| !id.is_empty());

    let mut url = match (page.is_empty(), id) {
        (false, Some(id)) => {
            let id = if target.unencode {
                id.to_string()
            } else {
                slug::encode_if_uuid(id)
            };
            let mut url = format!("/{}/{}", urlencoding::encode(&page), urlencoding::encode(&id));
            let name = target.name.as_deref().map(sanitize_name).unwrap_or_default();
            if !name.is_empty() {
                url.push('/');
                url.push_str(&urlencoding::encode(&name));
            }
            url
        }
        (false, None) => format!("/{}", urlencoding::encode(&page)),
        (true, _) => "/".to_string(),
    };

    if !target.query.is_empty() {
        url.push('?');
        url.push_str(&write_query(&target.query));
    }
    url
}
