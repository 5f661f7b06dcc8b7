//! Pagination types for list results.
//!
//! Pages are 1-based at the interface and translated to a zero-based row
//! offset before they reach storage.

use serde::{Deserialize, Serialize};

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page, always at least 1.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a page request. Callers are expected to pass `page >= 1` and
    /// `page_size >= 1`; zero values are clamped to 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Returns the zero-based row offset, `(page - 1) * page_size`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Returns the row limit.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// Pagination metadata returned with a list result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Total matching rows.
    pub total: u64,
    /// Total pages for the given page size.
    pub total_pages: u64,
}

impl PaginationMeta {
    /// Builds metadata for the given request and total.
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages: total.div_ceil(u64::from(request.page_size)),
        }
    }

    /// Returns `true` if a later page exists.
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }
}
