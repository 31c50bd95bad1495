use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{AggregateId, Version};

/// Serialized state of one aggregate as of `version`.
///
/// Loading starts from the snapshot and replays only later events. A snapshot
/// can also be the sole record of an aggregate: the root category is seeded
/// that way, with no event behind it, so stores must treat a snapshot as
/// proof of existence.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct Snapshot {
    pub aggregate_id: AggregateId,

    /// The type of aggregate (e.g., "Category").
    pub aggregate_type: String,

    /// Last stream version folded into `state`. Zero for a seeded aggregate.
    pub version: Version,

    pub taken_at: DateTime<Utc>,

    pub state: serde_json::Value,
}

impl Snapshot {
    /// Wraps already-serialized state.
    pub fn new(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        state: serde_json::Value,
    ) -> Self {
        Self {
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            version,
            taken_at: Utc::now(),
            state,
        }
    }

    /// Serializes `state` into a snapshot.
    pub fn capture<T: Serialize>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            aggregate_id,
            aggregate_type,
            version,
            serde_json::to_value(state)?,
        ))
    }

    /// Rebuilds the captured state.
    pub fn restore<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }
}
