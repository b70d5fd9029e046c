//! Cursor pagination types for list operations.
//!
//! A cursor is the opaque id of the last document returned. Stores
//! translate it into a start-after position on the query's sort order,
//! which keeps pages stable when newer documents are inserted.

use serde::{Deserialize, Serialize};

/// Request parameters for a cursor-paginated query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CursorRequest {
    /// Requested page size; clamped by [`CursorRequest::effective_limit`].
    #[serde(default)]
    pub limit: Option<u32>,
    /// Id of the last item of the previous page.
    #[serde(default)]
    pub cursor: Option<String>,
}

impl CursorRequest {
    /// Create a new cursor request.
    pub fn new(limit: Option<u32>, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    /// First page with the given size.
    pub fn first(limit: u32) -> Self {
        Self::new(Some(limit), None)
    }

    /// Resolve the page size: `default` when unset, clamped to `1..=max`.
    pub fn effective_limit(&self, default: u32, max: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, max.max(1))
    }
}

/// A page of results plus the cursor for the next page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorPage<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Cursor to pass back for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    /// Create a new page.
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// Create an empty last page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    /// Map the items, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }

    /// Whether another page follows.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_defaults_and_clamps() {
        assert_eq!(CursorRequest::default().effective_limit(20, 100), 20);
        assert_eq!(CursorRequest::first(500).effective_limit(20, 100), 100);
        assert_eq!(CursorRequest::first(0).effective_limit(20, 100), 1);
        assert_eq!(CursorRequest::first(35).effective_limit(20, 100), 35);
    }

    #[test]
    fn test_map_keeps_cursor() {
        let page = CursorPage::new(vec![1, 2], Some("n2".to_string()));
        let mapped = page.map(|v| v * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.next_cursor.as_deref(), Some("n2"));
        assert!(mapped.has_more());
    }
}
