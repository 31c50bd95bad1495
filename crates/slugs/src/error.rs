//! Slug allocation error types.

use thiserror::Error;

/// Errors returned by a [`SlugAllocator`](crate::SlugAllocator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    /// The exact path is already reserved in the group by another owner.
    #[error("Slug '{path}' is already taken in group '{group}'")]
    Conflict { group: String, path: String },

    /// The allocation service could not be reached or failed remotely.
    #[error("Slug service unavailable: {0}")]
    Unavailable(String),
}

impl SlugError {
    /// Returns true for the one failure callers are expected to handle.
    pub fn is_conflict(&self) -> bool {
        matches!(self, SlugError::Conflict { .. })
    }
}
