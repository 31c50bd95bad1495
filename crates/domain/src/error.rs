//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::category::CategoryError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A category command was rejected.
    #[error("Category error: {0}")]
    Category(#[from] CategoryError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns the category error if this is a rejected category command.
    pub fn as_category(&self) -> Option<&CategoryError> {
        match self {
            DomainError::Category(e) => Some(e),
            _ => None,
        }
    }
}
