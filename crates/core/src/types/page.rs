//! Pagination window for list queries.
//!
//! Requests express pagination as `rows` / `skip`, where a negative `rows`
//! means "no limit". [`Page`] is the validated form used by the
//! collection layer.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Page`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// `skip` was negative.
    #[error("skip must not be negative (got {0})")]
    NegativeSkip(i64),
}

/// A validated `rows` / `skip` pagination window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    limit: Option<u64>,
    offset: u64,
}

impl Page {
    /// Every row, starting at the first.
    pub const ALL: Self = Self {
        limit: None,
        offset: 0,
    };

    /// Build a page from raw `rows` / `skip` request values.
    ///
    /// Any negative `rows` means unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NegativeSkip`] if `skip` is negative.
    pub fn from_rows_skip(rows: i64, skip: i64) -> Result<Self, PageError> {
        let offset = u64::try_from(skip).map_err(|_| PageError::NegativeSkip(skip))?;
        let limit = u64::try_from(rows).ok();
        Ok(Self { limit, offset })
    }

    /// Maximum number of rows, or `None` for no limit.
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Number of leading rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Apply the window to an ordered iterator.
    pub fn window<I: Iterator>(&self, iter: I) -> impl Iterator<Item = I::Item> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        iter.skip(skip).take(take)
    }
}
