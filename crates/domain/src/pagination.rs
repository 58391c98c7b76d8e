//! Pagination metadata computation.

use serde::Serialize;

use docman_core::{AppError, AppResult};

/// Validated pagination bounds for a listing request.
///
/// The HTTP layer validates raw query parameters before constructing one;
/// a limit of zero is rejected there so metadata computation never divides
/// by a requested zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u64,
    offset: u64,
}

impl PageRequest {
    /// Creates validated pagination bounds. The limit must be positive.
    pub fn new(limit: u64, offset: u64) -> AppResult<Self> {
        if limit == 0 {
            return Err(AppError::Validation(
                "limit must be greater than zero".to_owned(),
            ));
        }

        Ok(Self { limit, offset })
    }

    /// Returns the requested page size.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns the requested row offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Derived pagination summary attached to listing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    /// Total rows matching the listing scope.
    pub total_count: u64,
    /// One-based page number the offset lands on.
    pub current_page: u64,
    /// Total number of pages.
    pub page_count: u64,
    /// Effective page size after clamping against the total.
    pub page_size: u64,
    /// Whether the requested page is past the end of available rows.
    pub exhausted: bool,
}

/// Computes page metadata from validated bounds and the fetch outcome.
///
/// Limit and offset are clamped to the total count; when the clamped limit
/// is zero (an empty result set) the current page is defined as 1 and the
/// page count as 0. `fetched_count` is the number of rows the storage fetch
/// actually returned at these bounds; zero signals an exhausted page.
#[must_use]
pub fn compute(limit: u64, offset: u64, total_count: u64, fetched_count: usize) -> PageMetadata {
    let effective_limit = limit.min(total_count);
    let effective_offset = offset.min(total_count);
    let exhausted = fetched_count == 0;

    if effective_limit == 0 {
        return PageMetadata {
            total_count,
            current_page: 1,
            page_count: 0,
            page_size: 0,
            exhausted,
        };
    }

    PageMetadata {
        total_count,
        current_page: effective_offset / effective_limit + 1,
        page_count: total_count.div_ceil(effective_limit),
        page_size: effective_limit,
        exhausted,
    }
}
