//! Configuration for the orgward library.
//!
//! # Example
//!
//! ```rust
//! use orgward::config::PaginationConfig;
//!
//! // Use defaults
//! let config = PaginationConfig::default();
//!
//! // Or customize
//! let config = PaginationConfig {
//!     default_per_page: 50,
//!     max_per_page: 200,
//! };
//! ```

use crate::types::ListQuery;

/// Bounds applied to list operations.
///
/// List actions clamp incoming page parameters against this before hitting
/// the store, so a caller cannot request an unbounded page.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Page size used when the caller passes zero.
    pub default_per_page: u32,
    /// Hard cap on the page size.
    pub max_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 100,
        }
    }
}

impl PaginationConfig {
    /// Normalize a query: 1-based page, page size within bounds.
    #[must_use]
    pub fn clamp(&self, query: &ListQuery) -> ListQuery {
        let per_page = match query.per_page {
            0 => self.default_per_page,
            n => n.min(self.max_per_page),
        };

        ListQuery {
            page: query.page.max(1),
            per_page,
            search: query.search.clone(),
        }
    }
}
