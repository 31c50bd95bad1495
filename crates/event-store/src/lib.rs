//! Event log abstraction for the category service.
//!
//! The durable log is owned by the platform; this crate defines the
//! [`EventStore`] contract the domain appends to and the projections read
//! from, plus an [`InMemoryEventStore`] used by the service binary and tests.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod snapshot;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use query::EventQuery;
pub use snapshot::Snapshot;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
