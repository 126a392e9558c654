//! In-memory document host for headless and desktop shells.

use bridge_traits::document::DocumentHost;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct DocumentState {
    pathname: String,
    search: String,
    history: Vec<String>,
    title: String,
    meta: HashMap<String, String>,
}

/// Tracks location, history, title and meta tags without a browser.
#[derive(Debug)]
pub struct HeadlessDocument {
    state: RwLock<DocumentState>,
}

impl HeadlessDocument {
    /// Start at `url`, which may include a query string.
    pub fn new(url: &str) -> Self {
        let (pathname, search) = split_url(url);
        Self {
            state: RwLock::new(DocumentState {
                pathname,
                search,
                history: vec![url.to_string()],
                ..DocumentState::default()
            }),
        }
    }

    pub fn title(&self) -> String {
        self.state.read().title.clone()
    }

    pub fn meta(&self, name: &str) -> Option<String> {
        self.state.read().meta.get(name).cloned()
    }

    /// Every URL the document has been at, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.state.read().history.clone()
    }

    /// Move back one entry, as the browser back button would. Returns `false`
    /// when there is nothing to go back to.
    pub fn back(&self) -> bool {
        let mut state = self.state.write();
        if state.history.len() < 2 {
            return false;
        }
        state.history.pop();
        let current = state.history.last().cloned().unwrap_or_default();
        let (pathname, search) = split_url(&current);
        state.pathname = pathname;
        state.search = search;
        true
    }
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new("/")
    }
}

fn split_url(url: &str) -> (String, String) {
    match url.find('?') {
        Some(idx) => (url[..idx].to_string(), url[idx..].to_string()),
        None => (url.to_string(), String::new()),
    }
}

impl DocumentHost for HeadlessDocument {
    fn pathname(&self) -> String {
        self.state.read().pathname.clone()
    }

    fn search(&self) -> String {
        self.state.read().search.clone()
    }

    fn push_state(&self, url: &str) {
        debug!(url, "History push");
        let (pathname, search) = split_url(url);
        let mut state = self.state.write();
        state.pathname = pathname;
        state.search = search;
        state.history.push(url.to_string());
    }

    fn set_title(&self, title: &str) {
        self.state.write().title = title.to_string();
    }

    fn set_meta_tag(&self, name: &str, content: &str) {
        self.state
            .write()
            .meta
            .insert(name.to_string(), content.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_state_splits_query() {
        let document = HeadlessDocument::default();
        document.push_state("/Events?page=2&sort=date");

        assert_eq!(document.pathname(), "/Events");
        assert_eq!(document.search(), "?page=2&sort=date");
        assert_eq!(document.history(), vec!["/", "/Events?page=2&sort=date"]);
    }

    #[test]
    fn test_back_restores_previous_location() {
        let document = HeadlessDocument::new("/About");
        document.push_state("/Media?page=1");

        assert!(document.back());
        assert_eq!(document.pathname(), "/About");
        assert_eq!(document.search(), "");
        assert!(!document.back());
    }

    #[test]
    fn test_title_and_meta() {
        let document = HeadlessDocument::default();
        document.set_title("Sound of Jersey | Events");
        document.set_meta_tag("robots", "noindex");

        assert_eq!(document.title(), "Sound of Jersey | Events");
        assert_eq!(document.meta("robots").as_deref(), Some("noindex"));
        assert_eq!(document.meta("og:url"), None);
    }
}
