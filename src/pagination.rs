//! # Pagination State
//!
//! The limit/offset window over a query's result set. All transitions are
//! pure: a failed transition leaves the window untouched.

use thiserror::Error;

/// Page size assumed when no explicit limit is set (the service's own default)
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Local validation errors; these never reach the network
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid {name}: '{value}' ({reason})")]
    InvalidBound {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("No more pages: the last result reported hasMore=false")]
    NoMorePages,
}

/// Where a session stands with respect to paging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// No result yet
    Idle,
    /// At least one page has been fetched and `has_more` is known
    Paged,
}

/// The slice of a result set being viewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    limit: Option<u64>,
    offset: u64,
    has_more: Option<bool>,
    total_results: Option<u64>,
}

/// Parse a user-supplied bound, rejecting anything that is not an integer
pub fn parse_bound(name: &'static str, raw: &str) -> Result<i64, PaginationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| PaginationError::InvalidBound {
            name,
            value: raw.to_string(),
            reason: "not an integer",
        })
}

fn check_limit(limit: i64) -> Result<u64, PaginationError> {
    if limit <= 0 {
        return Err(PaginationError::InvalidBound {
            name: "limit",
            value: limit.to_string(),
            reason: "must be greater than zero",
        });
    }
    Ok(limit as u64)
}

fn check_offset(offset: i64) -> Result<u64, PaginationError> {
    if offset < 0 {
        return Err(PaginationError::InvalidBound {
            name: "offset",
            value: offset.to_string(),
            reason: "must not be negative",
        });
    }
    Ok(offset as u64)
}

impl PageWindow {
    /// Seed a window from explicit overrides; absent values use the defaults
    pub fn with_explicit(limit: Option<i64>, offset: Option<i64>) -> Result<Self, PaginationError> {
        Ok(Self {
            limit: limit.map(check_limit).transpose()?,
            offset: offset.map(check_offset).transpose()?.unwrap_or(0),
            has_more: None,
            total_results: None,
        })
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn has_more(&self) -> Option<bool> {
        self.has_more
    }

    pub fn total_results(&self) -> Option<u64> {
        self.total_results
    }

    /// The effective step used by navigation
    pub fn page_size(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn state(&self) -> PagerState {
        match self.has_more {
            Some(_) => PagerState::Paged,
            None => PagerState::Idle,
        }
    }

    pub fn next_page(&mut self) -> Result<(), PaginationError> {
        if self.has_more == Some(false) {
            return Err(PaginationError::NoMorePages);
        }
        self.offset = self.offset.saturating_add(self.page_size());
        Ok(())
    }

    /// Step back one page, stopping at offset 0
    pub fn prev_page(&mut self) {
        self.offset = self.offset.saturating_sub(self.page_size());
    }

    pub fn set_limit(&mut self, limit: Option<i64>) -> Result<(), PaginationError> {
        self.limit = limit.map(check_limit).transpose()?;
        Ok(())
    }

    pub fn set_offset(&mut self, offset: Option<i64>) -> Result<(), PaginationError> {
        self.offset = offset.map(check_offset).transpose()?.unwrap_or(0);
        Ok(())
    }

    /// Copy of this window updated with what the service echoed back
    pub fn after_response(
        &self,
        offset: Option<u64>,
        has_more: bool,
        total_results: Option<u64>,
    ) -> Self {
        Self {
            limit: self.limit,
            offset: offset.unwrap_or(self.offset),
            has_more: Some(has_more),
            total_results,
        }
    }
}
