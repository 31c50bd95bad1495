use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors returned by an [`EventStore`](crate::EventStore).
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The stream was not at the version the append expected, or the batch
    /// reuses a version already in the stream.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The batch handed to `append` was malformed.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// A payload or snapshot did not (de)serialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
