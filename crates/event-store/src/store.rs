use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected version of the aggregate for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,

    /// When set, the store renumbers the batch so it starts right after the
    /// aggregate's current version instead of trusting the envelope versions.
    pub assign_versions: bool,
}

impl AppendOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the aggregate to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
            assign_versions: false,
        }
    }

    /// Creates options expecting the aggregate to not exist (new aggregate).
    pub fn expect_new() -> Self {
        Self::expect_version(Version::initial())
    }

    /// Appends after whatever is currently at the end of the aggregate's stream.
    ///
    /// No version check is made, so two writers that read the same snapshot
    /// both succeed and the later append wins.
    pub fn at_stream_end() -> Self {
        Self {
            expected_version: None,
            assign_versions: true,
        }
    }
}

/// A stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// An event store is responsible for persisting and retrieving events.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends events to the store.
    ///
    /// Events are appended atomically - either all succeed or none do.
    /// If `options.expected_version` is set, the operation will fail with
    /// `ConcurrencyConflict` if the current version doesn't match.
    ///
    /// Returns the new version of the aggregate after appending.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Retrieves all events for a specific aggregate.
    ///
    /// Events are returned in version order (oldest first).
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves all events for an aggregate starting from a specific version.
    ///
    /// Useful when replaying from a snapshot.
    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: &AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events matching a query.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Retrieves events by type, in commit order.
    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>>;

    /// Streams all events in the store.
    ///
    /// Events are returned in commit (insertion) order.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Gets the current version of an aggregate.
    ///
    /// Returns None if the aggregate has no events.
    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>>;

    /// Saves a snapshot of an aggregate's state.
    ///
    /// If a snapshot already exists for this aggregate, it is replaced.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()>;

    /// Retrieves the latest snapshot for an aggregate.
    ///
    /// Returns None if no snapshot exists.
    async fn get_snapshot(&self, aggregate_id: &AggregateId) -> Result<Option<Snapshot>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Checks if an aggregate exists (has any events or a snapshot).
    async fn aggregate_exists(&self, aggregate_id: &AggregateId) -> Result<bool> {
        if self.get_aggregate_version(aggregate_id).await?.is_some() {
            return Ok(true);
        }
        Ok(self.get_snapshot(aggregate_id).await?.is_some())
    }

    /// Loads an aggregate's events, optionally starting from a snapshot.
    ///
    /// If a snapshot exists, returns the snapshot and events after it.
    /// Otherwise, returns None and all events.
    async fn load_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<(Option<Snapshot>, Vec<EventEnvelope>)> {
        if let Some(snapshot) = self.get_snapshot(aggregate_id).await? {
            let events = self
                .get_events_for_aggregate_from_version(aggregate_id, snapshot.version.next())
                .await?;
            Ok((Some(snapshot), events))
        } else {
            let events = self.get_events_for_aggregate(aggregate_id).await?;
            Ok((None, events))
        }
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates a batch before appending.
///
/// The batch must be non-empty, target a single aggregate and carry
/// sequential versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::InvalidAppend(
            "Cannot append empty event list".to_string(),
        ));
    };

    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "All events must be for the same aggregate".to_string(),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::InvalidAppend(
                "All events must have the same aggregate type".to_string(),
            ));
        }
    }

    let mut expected_version = first.version;
    for event in events.iter().skip(1) {
        expected_version = expected_version.next();
        if event.version != expected_version {
            return Err(EventStoreError::InvalidAppend(format!(
                "Event versions must be sequential. Expected {}, got {}",
                expected_version, event.version
            )));
        }
    }

    Ok(())
}
