//! Document queries: filters, ordering, limit and cursor.

use serde::{Deserialize, Serialize};

use super::filter::FilterField;
use super::sorting::SortField;

/// A collection query: conjunctive filters, ordering, limit, and a
/// start-after cursor.
///
/// Stores always append the document id as the final tie-breaker, in the
/// direction of the last sort field, so the order is total and cursors
/// are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// All filters must match.
    pub filters: Vec<FilterField>,
    /// Sort order, most significant first.
    pub order_by: Vec<SortField>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
    /// Id of the document after which results start.
    pub start_after: Option<String>,
}

impl Query {
    /// An unfiltered query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter.
    pub fn filter(mut self, filter: FilterField) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a sort field.
    pub fn order_by(mut self, sort: SortField) -> Self {
        self.order_by.push(sort);
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Start after the document with the given id.
    pub fn start_after(mut self, cursor: Option<String>) -> Self {
        self.start_after = cursor;
        self
    }
}
