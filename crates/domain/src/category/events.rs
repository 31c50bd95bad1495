//! Category domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::CategoryFields;

/// Events that can occur on a category aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CategoryEvent {
    /// Category was created with its full field set.
    CategoryCreated(CategoryCreatedData),

    /// Category fields were replaced.
    CategoryUpdated(CategoryUpdatedData),

    /// Category was deleted.
    CategoryDeleted(CategoryDeletedData),
}

impl DomainEvent for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::CategoryCreated(_) => "CategoryCreated",
            CategoryEvent::CategoryUpdated(_) => "CategoryUpdated",
            CategoryEvent::CategoryDeleted(_) => "CategoryDeleted",
        }
    }
}

/// Data for CategoryCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreatedData {
    /// The new category's id.
    pub category: AggregateId,

    /// Declared fields, including the allocated slug.
    pub data: CategoryFields,

    pub created_at: DateTime<Utc>,
}

/// Data for CategoryUpdated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUpdatedData {
    pub category: AggregateId,

    /// The complete field set after the update.
    pub data: CategoryFields,

    pub updated_at: DateTime<Utc>,
}

/// Data for CategoryDeleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDeletedData {
    pub category: AggregateId,
    pub deleted_at: DateTime<Utc>,
}

impl CategoryEvent {
    /// Creates a CategoryCreated event.
    pub fn category_created(category: AggregateId, data: CategoryFields) -> Self {
        CategoryEvent::CategoryCreated(CategoryCreatedData {
            category,
            data,
            created_at: Utc::now(),
        })
    }

    /// Creates a CategoryUpdated event.
    pub fn category_updated(category: AggregateId, data: CategoryFields) -> Self {
        CategoryEvent::CategoryUpdated(CategoryUpdatedData {
            category,
            data,
            updated_at: Utc::now(),
        })
    }

    /// Creates a CategoryDeleted event.
    pub fn category_deleted(category: AggregateId) -> Self {
        CategoryEvent::CategoryDeleted(CategoryDeletedData {
            category,
            deleted_at: Utc::now(),
        })
    }

    /// Returns the id of the category the event is about.
    pub fn category(&self) -> &AggregateId {
        match self {
            CategoryEvent::CategoryCreated(data) => &data.category,
            CategoryEvent::CategoryUpdated(data) => &data.category,
            CategoryEvent::CategoryDeleted(data) => &data.category,
        }
    }

    /// Returns the field set carried by the event, if any.
    pub fn fields(&self) -> Option<&CategoryFields> {
        match self {
            CategoryEvent::CategoryCreated(data) => Some(&data.data),
            CategoryEvent::CategoryUpdated(data) => Some(&data.data),
            CategoryEvent::CategoryDeleted(_) => None,
        }
    }
}
