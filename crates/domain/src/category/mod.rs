//! Category aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod fields;
mod service;

pub use aggregate::Category;
pub use commands::{CategoryCreate, CategoryDelete, CategoryUpdate};
pub use events::{CategoryCreatedData, CategoryDeletedData, CategoryEvent, CategoryUpdatedData};
pub use fields::{CategoryFields, Locale, PictureId, Translation, Translations};
pub use service::CategoryService;

use common::AggregateId;
use slugs::SlugError;
use thiserror::Error;

use crate::access::CommandKind;

/// Slug group every category reservation is made in.
pub const CATEGORY_GROUP: &str = "category";

/// Errors that can occur during category operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    /// The actor may not run this command. Nothing was done.
    #[error("Access denied: {command} not permitted")]
    AccessDenied { command: CommandKind },

    /// A field was rejected, e.g. a slug held by another category.
    #[error("Validation failed on '{field}': {reason}")]
    ValidationFailed {
        field: &'static str,
        reason: &'static str,
    },

    /// The category does not exist.
    #[error("Category not found: {0}")]
    NotFound(AggregateId),

    /// The slug service failed. Allocator calls that completed before the
    /// failure are not undone.
    #[error("Slug allocator failure: {0}")]
    AllocatorFailure(#[source] SlugError),
}

impl CategoryError {
    /// The rejection a slug conflict turns into.
    pub fn slug_taken() -> Self {
        CategoryError::ValidationFailed {
            field: "slug",
            reason: "taken",
        }
    }

    /// Short label used for the command outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            CategoryError::AccessDenied { .. } => "access_denied",
            CategoryError::ValidationFailed { .. } => "validation_failed",
            CategoryError::NotFound(_) => "not_found",
            CategoryError::AllocatorFailure(_) => "allocator_failure",
        }
    }
}

impl From<SlugError> for CategoryError {
    fn from(e: SlugError) -> Self {
        if e.is_conflict() {
            CategoryError::slug_taken()
        } else {
            CategoryError::AllocatorFailure(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_conflict_becomes_validation_failure() {
        let err: CategoryError = SlugError::Conflict {
            group: CATEGORY_GROUP.to_string(),
            path: "shoes".to_string(),
        }
        .into();
        assert_eq!(err, CategoryError::slug_taken());
        assert_eq!(err.to_string(), "Validation failed on 'slug': taken");
    }

    #[test]
    fn other_slug_errors_are_allocator_failures() {
        let err: CategoryError = SlugError::Unavailable("connection reset".into()).into();
        assert_eq!(err.kind(), "allocator_failure");
    }
}
