use chrono::{DateTime, Utc};

use crate::{AggregateId, EventEnvelope, Version};

/// Builder for constructing event queries.
///
/// Allows filtering events by various criteria such as aggregate ID,
/// event type, version range, and time range.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Filter by aggregate ID.
    pub aggregate_id: Option<AggregateId>,

    /// Filter by aggregate type.
    pub aggregate_type: Option<String>,

    /// Filter by event types (any of these types).
    pub event_types: Option<Vec<String>>,

    /// Filter by minimum version (inclusive).
    pub from_version: Option<Version>,

    /// Filter by maximum version (inclusive).
    pub to_version: Option<Version>,

    /// Earliest recording time (inclusive).
    pub recorded_from: Option<DateTime<Utc>>,

    /// Latest recording time (inclusive).
    pub recorded_to: Option<DateTime<Utc>>,

    /// Maximum number of events to return.
    pub limit: Option<usize>,

    /// Number of events to skip.
    pub offset: Option<usize>,
}

impl EventQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a specific aggregate.
    pub fn for_aggregate(aggregate_id: AggregateId) -> Self {
        Self {
            aggregate_id: Some(aggregate_id),
            ..Default::default()
        }
    }

    /// Creates a query for events of a specific type.
    pub fn for_event_type(event_type: impl Into<String>) -> Self {
        Self {
            event_types: Some(vec![event_type.into()]),
            ..Default::default()
        }
    }

    /// Filters by aggregate ID.
    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    /// Filters by aggregate type.
    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    /// Filters by event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    /// Filters by multiple event types (any of these).
    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    /// Filters to events starting from this version (inclusive).
    pub fn from_version(mut self, version: Version) -> Self {
        self.from_version = Some(version);
        self
    }

    /// Filters to events up to this version (inclusive).
    pub fn to_version(mut self, version: Version) -> Self {
        self.to_version = Some(version);
        self
    }

    /// Filters to events recorded at or after `at`.
    pub fn recorded_from(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_from = Some(at);
        self
    }

    /// Filters to events recorded at or before `at`.
    pub fn recorded_to(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_to = Some(at);
        self
    }

    /// Limits the number of events returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many events before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the envelope passes every filter set on this query.
    ///
    /// `limit` and `offset` are paging concerns and are not checked here.
    pub fn matches(&self, event: &EventEnvelope) -> bool {
        if let Some(ref id) = self.aggregate_id
            && &event.aggregate_id != id
        {
            return false;
        }
        if let Some(ref aggregate_type) = self.aggregate_type
            && &event.aggregate_type != aggregate_type
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&event.event_type)
        {
            return false;
        }
        if let Some(from) = self.from_version
            && event.version < from
        {
            return false;
        }
        if let Some(to) = self.to_version
            && event.version > to
        {
            return false;
        }
        if let Some(from) = self.recorded_from
            && event.recorded_at < from
        {
            return false;
        }
        if let Some(to) = self.recorded_to
            && event.recorded_at > to
        {
            return false;
        }
        true
    }
}
