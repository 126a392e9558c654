//! Paging parameters and the server's page envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default page size of list endpoints that are read one page at a time.
pub const DEFAULT_PAGE_LIMIT: u32 = 15;

/// Page size used when reading a whole collection.
pub const FULL_COLLECTION_LIMIT: u32 = 100;

/// Query parameters of a paged request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// Page number, 0-indexed.
    pub page: u32,
    pub limit: u32,
    /// Server sort expression, e.g. `name,asc`. Empty for the default order.
    #[serde(default)]
    pub sort: String,
}

impl PageQuery {
    /// ```
    /// use core_library::PageQuery;
    ///
    /// let query = PageQuery::new(2, 20).sorted("name,asc");
    /// assert_eq!(query.to_query_string(), "page=2&limit=20&sort=name%2Casc");
    /// ```
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            sort: String::new(),
        }
    }

    pub fn sorted(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    /// The same query for another page.
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn to_query_string(&self) -> String {
        format!(
            "page={}&limit={}&sort={}",
            self.page,
            self.limit,
            urlencoding::encode(&self.sort)
        )
    }

    /// `url` with this query appended.
    pub fn apply(&self, url: &str) -> String {
        format!("{}?{}", url, self.to_query_string())
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestPage<T = Value> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    /// This page's number, 0-indexed.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub size: u32,
}

impl<T> RestPage<T> {
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    /// Page numbers after this one.
    pub fn remaining_pages(&self) -> std::ops::Range<u32> {
        (self.number + 1)..self.total_pages.max(self.number + 1)
    }

    pub fn map<U, F>(self, f: F) -> RestPage<U>
    where
        F: FnMut(T) -> U,
    {
        RestPage {
            content: self.content.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            number: self.number,
            total_elements: self.total_elements,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string() {
        assert_eq!(
            PageQuery::default().apply("/api/v1/Media"),
            "/api/v1/Media?page=0&limit=15&sort="
        );
        assert_eq!(PageQuery::new(0, 100).at_page(3).page, 3);
    }

    #[test]
    fn test_page_envelope() {
        let page: RestPage = serde_json::from_value(json!({
            "content": [{"id": "a"}],
            "totalPages": 4,
            "number": 1,
            "totalElements": 31,
            "size": 10,
            "first": false
        }))
        .unwrap();

        assert!(page.has_next());
        assert_eq!(page.remaining_pages().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(page.total_elements, 31);
    }

    #[test]
    fn test_last_page() {
        let page = RestPage::<u8> {
            content: vec![1],
            total_pages: 1,
            number: 0,
            total_elements: 1,
            size: 15,
        };
        assert!(!page.has_next());
        assert_eq!(page.remaining_pages().count(), 0);
        assert_eq!(page.map(u32::from).content, vec![1u32]);
    }
}
