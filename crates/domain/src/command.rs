//! Loading aggregates, running commands and appending their events.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, EventStoreExt, Snapshot, Version};
use serde::Serialize;

use crate::aggregate::{Aggregate, DomainEvent, SnapshotCapable};
use crate::error::DomainError;

/// What a committed command produced.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// State with the new events folded in.
    pub aggregate: A,

    pub events: Vec<A::Event>,

    /// Stream version after the append, as assigned by the store.
    pub new_version: Version,
}

/// A request addressed to one aggregate.
pub trait Command: Send + Sync {
    type Aggregate: Aggregate;

    fn aggregate_id(&self) -> AggregateId;
}

/// How appends guard against writes made since the aggregate was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Fail with a concurrency conflict when the stream moved on.
    #[default]
    Optimistic,

    /// Append at the end of the stream regardless. An intervening write is
    /// logged as `concurrent_write` and the later command wins.
    LastWriteWins,
}

/// Runs commands for one aggregate type against an event store.
///
/// Loads start from the latest snapshot and replay later events. A command
/// closure turns the loaded state into events, which are wrapped in
/// envelopes and appended under the configured [`Concurrency`] policy.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    concurrency: Concurrency,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new command handler with optimistic concurrency.
    pub fn new(store: S) -> Self {
        Self {
            store,
            concurrency: Concurrency::Optimistic,
            _phantom: PhantomData,
        }
    }

    /// Sets the append policy.
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuilds an aggregate from its snapshot and later events.
    ///
    /// An unknown id yields the default state at version 0.
    pub async fn load(&self, aggregate_id: &AggregateId) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let (snapshot, events) = self.store.load_aggregate(aggregate_id).await?;

        let mut aggregate = if let Some(snapshot) = snapshot {
            let version = snapshot.version;
            let mut restored = self.restore_from_snapshot(snapshot)?;
            restored.set_version(version);
            restored
        } else {
            A::default()
        };

        // Apply events after snapshot
        for envelope in events {
            let event: A::Event = envelope.decode()?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Like [`CommandHandler::load`], but None when the aggregate is absent or
    /// deleted.
    pub async fn load_existing(
        &self,
        aggregate_id: &AggregateId,
    ) -> Result<Option<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de>,
    {
        let aggregate = self.load(aggregate_id).await?;
        if aggregate.id().is_some() {
            Ok(Some(aggregate))
        } else {
            Ok(None)
        }
    }

    /// Loads the aggregate, then [`CommandHandler::commit`]s the command.
    pub async fn execute<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let aggregate = self.load(aggregate_id).await?;
        self.commit(aggregate_id, aggregate, command_fn).await
    }

    /// Runs a command against an aggregate the caller already loaded and
    /// persists the resulting events.
    ///
    /// Lets callers do asynchronous work between the load and the append.
    pub async fn commit<F>(
        &self,
        aggregate_id: &AggregateId,
        mut aggregate: A,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let current_version = aggregate.version();

        // Execute command to get events
        let events = command_fn(&aggregate)?;

        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events: vec![],
                new_version: current_version,
            });
        }

        // Build envelopes for persistence
        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;
        let expected_version = Version::new(current_version.as_i64() + events.len() as i64);

        let options = match self.concurrency {
            Concurrency::Optimistic if current_version == Version::initial() => {
                AppendOptions::expect_new()
            }
            Concurrency::Optimistic => AppendOptions::expect_version(current_version),
            Concurrency::LastWriteWins => AppendOptions::at_stream_end(),
        };

        let new_version = self.store.append(envelopes, options).await?;

        if new_version != expected_version {
            tracing::warn!(
                %aggregate_id,
                aggregate_type = A::aggregate_type(),
                loaded_version = %current_version,
                %new_version,
                "concurrent_write"
            );
        }

        // Apply events to aggregate
        for event in &events {
            aggregate.apply(event.clone());
        }
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    /// Wraps events in envelopes numbered from `current_version + 1`.
    fn build_envelopes(
        &self,
        aggregate_id: &AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError>
    where
        A::Event: Serialize,
    {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut version = current_version;

        for event in events {
            version = version.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id.clone())
                .aggregate_type(A::aggregate_type())
                .event_type(event.event_type())
                .version(version)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }

    fn restore_from_snapshot(&self, snapshot: Snapshot) -> Result<A, DomainError>
    where
        A: for<'de> serde::Deserialize<'de>,
    {
        let aggregate: A = snapshot.restore()?;
        Ok(aggregate)
    }
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: SnapshotCapable,
{
    /// Loads the aggregate, then [`CommandHandler::commit_with_snapshot`]s the
    /// command.
    pub async fn execute_with_snapshot<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: for<'de> serde::Deserialize<'de> + Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let aggregate = self.load(aggregate_id).await?;
        self.commit_with_snapshot(aggregate_id, aggregate, command_fn)
            .await
    }

    /// Commits a command against a loaded aggregate and saves a snapshot
    /// when the new version lands on the snapshot interval.
    pub async fn commit_with_snapshot<F>(
        &self,
        aggregate_id: &AggregateId,
        aggregate: A,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        A::Event: Serialize,
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let result = self.commit(aggregate_id, aggregate, command_fn).await?;

        if result.aggregate.should_snapshot() {
            self.save_snapshot(aggregate_id, &result.aggregate).await?;
        }

        Ok(result)
    }

    /// Stores the aggregate's state as the starting point for future loads.
    pub async fn save_snapshot(
        &self,
        aggregate_id: &AggregateId,
        aggregate: &A,
    ) -> Result<(), DomainError> {
        let snapshot = Snapshot::capture(
            aggregate_id.clone(),
            A::aggregate_type(),
            aggregate.version(),
            aggregate,
        )?;
        self.store.save_snapshot(snapshot).await?;
        Ok(())
    }
}
