//! Projection error types.

use thiserror::Error;

/// Errors that stop a projection from catching up.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Reading the event log failed.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// An event of a type the projection handles did not decode.
    #[error("{projection} cannot decode {event_type} at version {version}: {source}")]
    Decode {
        projection: &'static str,
        event_type: String,
        version: event_store::Version,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
