//! Startup and runtime errors of the service binary.

use domain::DomainError;
use projections::ProjectionError;
use thiserror::Error;

/// Errors that stop the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A configuration variable holds a value that cannot be used.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    /// The metrics listener address does not parse.
    #[error("invalid metrics address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// The Prometheus exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// Bootstrapping the root category failed.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The subcategory index could not catch up.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// The index follower returned before shutdown was requested.
    #[error("index follower stopped before shutdown")]
    FollowerStopped,

    /// The index follower task panicked or was cancelled.
    #[error("index follower task failed: {0}")]
    Follower(#[from] tokio::task::JoinError),
}
