use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Snapshot, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// In-memory event store.
///
/// Events are kept in a single vector in commit order, which is the order
/// [`EventStore::stream_all_events`] replays them in.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    snapshots: Arc<RwLock<HashMap<AggregateId, Snapshot>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

fn current_version(store: &[EventEnvelope], aggregate_id: &AggregateId) -> Version {
    store
        .iter()
        .filter(|e| &e.aggregate_id == aggregate_id)
        .map(|e| e.version)
        .max()
        .unwrap_or(Version::initial())
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        mut events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id.clone();

        let mut store = self.events.write().await;
        let current_version = current_version(&store, &aggregate_id);

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        if options.assign_versions {
            let mut version = current_version;
            for event in &mut events {
                version = version.next();
                event.version = version;
            }
        }

        // Unique (aggregate_id, version) constraint
        let first_new_version = events[0].version;
        if first_new_version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        let appended = events.len();
        store.extend(events);

        metrics::counter!("event_store_events_appended").increment(appended as u64);
        tracing::debug!(%aggregate_id, %last_version, appended, "events appended");

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| &e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: &AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| &e.aggregate_id == aggregate_id && e.version >= from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let events = store
            .iter()
            .filter(|e| query.matches(e))
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(events)
    }

    async fn get_events_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        Ok(store
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.events.read().await.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: &AggregateId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        let version = store
            .iter()
            .filter(|e| &e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.aggregate_id.clone(), snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: &AggregateId) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(aggregate_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventStoreExt;

    fn create_test_event(
        aggregate_id: &AggregateId,
        version: Version,
        event_type: &str,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id.clone())
            .aggregate_type("Category")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    async fn seed(
        store: &InMemoryEventStore,
        id: &AggregateId,
        version: Version,
        event_type: &str,
    ) {
        store
            .append(
                vec![create_test_event(id, version, event_type)],
                AppendOptions::new(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();
        let event = create_test_event(&aggregate_id, Version::first(), "CategoryCreated");

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), Version::first());

        let events = store.get_events_for_aggregate(&aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn empty_append_is_invalid() {
        let store = InMemoryEventStore::new();
        let result = store.append(vec![], AppendOptions::new()).await;
        assert!(matches!(result, Err(EventStoreError::InvalidAppend(_))));
    }

    #[tokio::test]
    async fn concurrency_conflict_on_wrong_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let event1 = create_test_event(&aggregate_id, Version::first(), "CategoryCreated");
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = create_test_event(&aggregate_id, Version::new(2), "CategoryUpdated");
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_version(Version::initial()),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_version_without_check_conflicts() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        seed(&store, &aggregate_id, Version::first(), "CategoryCreated").await;

        let result = store
            .append(
                vec![create_test_event(&aggregate_id, Version::first(), "CategoryUpdated")],
                AppendOptions::new(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn at_stream_end_renumbers_stale_batches() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        store
            .append(
                vec![create_test_event(&aggregate_id, Version::first(), "CategoryCreated")],
                AppendOptions::at_stream_end(),
            )
            .await
            .unwrap();

        // Two writers that both read version 1
        for _ in 0..2 {
            store
                .append(
                    vec![create_test_event(&aggregate_id, Version::new(2), "CategoryUpdated")],
                    AppendOptions::at_stream_end(),
                )
                .await
                .unwrap();
        }

        let versions: Vec<i64> = store
            .get_events_for_aggregate(&aggregate_id)
            .await
            .unwrap()
            .iter()
            .map(|e| e.version.as_i64())
            .collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_events_from_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let events = vec![
            create_test_event(&aggregate_id, Version::new(1), "CategoryCreated"),
            create_test_event(&aggregate_id, Version::new(2), "CategoryUpdated"),
            create_test_event(&aggregate_id, Version::new(3), "CategoryUpdated"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let from_v2 = store
            .get_events_for_aggregate_from_version(&aggregate_id, Version::new(2))
            .await
            .unwrap();
        assert_eq!(from_v2.len(), 2);
        assert_eq!(from_v2[0].version, Version::new(2));
        assert_eq!(from_v2[1].version, Version::new(3));
    }

    #[tokio::test]
    async fn get_events_by_type() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        seed(&store, &id1, Version::first(), "CategoryCreated").await;
        seed(&store, &id2, Version::first(), "CategoryCreated").await;
        seed(&store, &id1, Version::new(2), "CategoryDeleted").await;

        let created = store.get_events_by_type("CategoryCreated").await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].aggregate_id, id1);

        let deleted = store.get_events_by_type("CategoryDeleted").await.unwrap();
        assert_eq!(deleted.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_counts_as_existing_aggregate() {
        let store = InMemoryEventStore::new();
        let root = AggregateId::root();
        assert!(!store.aggregate_exists(&root).await.unwrap());

        let snapshot = Snapshot::new(
            root.clone(),
            "Category",
            Version::initial(),
            serde_json::json!({"name": "root"}),
        );
        store.save_snapshot(snapshot).await.unwrap();

        assert!(store.aggregate_exists(&root).await.unwrap());
        let (snapshot, events) = store.load_aggregate(&root).await.unwrap();
        assert_eq!(snapshot.unwrap().version, Version::initial());
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn load_aggregate_returns_events_after_snapshot() {
        let store = InMemoryEventStore::new();
        let id = AggregateId::root();

        store
            .save_snapshot(Snapshot::new(
                id.clone(),
                "Category",
                Version::initial(),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(&id, Version::first(), "CategoryUpdated")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let (snapshot, events) = store.load_aggregate(&id).await.unwrap();
        assert!(snapshot.is_some());
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn snapshot_not_found() {
        let store = InMemoryEventStore::new();
        let result = store.get_snapshot(&AggregateId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn query_events_with_filters() {
        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();

        let events = vec![
            create_test_event(&id1, Version::new(1), "CategoryCreated"),
            create_test_event(&id1, Version::new(2), "CategoryUpdated"),
            create_test_event(&id1, Version::new(3), "CategoryUpdated"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let query = EventQuery::new()
            .aggregate_id(id1.clone())
            .from_version(Version::new(2))
            .to_version(Version::new(2));
        let results = store.query_events(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].version, Version::new(2));

        let query = EventQuery::for_aggregate(id1).event_type("CategoryUpdated").limit(1);
        let results = store.query_events(query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].version, Version::new(2));
    }

    #[tokio::test]
    async fn stream_all_events_in_commit_order() {
        use futures_util::StreamExt;

        let store = InMemoryEventStore::new();
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();

        seed(&store, &id1, Version::first(), "CategoryCreated").await;
        seed(&store, &id2, Version::first(), "CategoryCreated").await;
        seed(&store, &id1, Version::new(2), "CategoryDeleted").await;

        let stream = store.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.map(|e| e.unwrap()).collect().await;
        let order: Vec<(&AggregateId, &str)> = events
            .iter()
            .map(|e| (&e.aggregate_id, e.event_type.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (&id1, "CategoryCreated"),
                (&id2, "CategoryCreated"),
                (&id1, "CategoryDeleted"),
            ]
        );
    }

    #[tokio::test]
    async fn get_aggregate_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new();

        let version = store.get_aggregate_version(&aggregate_id).await.unwrap();
        assert!(version.is_none());

        let events = vec![
            create_test_event(&aggregate_id, Version::new(1), "CategoryCreated"),
            create_test_event(&aggregate_id, Version::new(2), "CategoryUpdated"),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        let version = store.get_aggregate_version(&aggregate_id).await.unwrap();
        assert_eq!(version, Some(Version::new(2)));
    }
}
