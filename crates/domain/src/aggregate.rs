//! Event-sourced aggregate traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded against an aggregate, named in the past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Name stored in the envelope's `event_type` (e.g. "CategoryCreated").
    fn event_type(&self) -> &'static str;
}

/// State rebuilt by folding an aggregate's events in version order.
///
/// Command methods on implementors inspect the state and return new events;
/// only [`Aggregate::apply`] changes it.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;

    /// Rejection returned by command methods.
    type Error: std::error::Error + Send + Sync;

    /// Name stored in the envelope's `aggregate_type` (e.g. "Category").
    fn aggregate_type() -> &'static str;

    /// None for a fresh aggregate and for one whose stream ended in a deletion.
    fn id(&self) -> Option<AggregateId>;

    /// Version of the last folded event, 0 if none.
    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    /// Folds one event into the state. Must not fail and must not have side
    /// effects: the event already happened.
    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// An aggregate whose state can be stored as a snapshot.
///
/// Snapshots shorten replay, and they are also how an aggregate is seeded
/// without an event.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Number of versions between automatic snapshots.
    fn snapshot_interval() -> usize {
        100
    }

    /// True when the current version lands on the snapshot interval.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}
