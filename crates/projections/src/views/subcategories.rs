//! Subcategory index: parent category to its direct children.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{Category, CategoryEvent, CategoryFields, Slug};
use event_store::{EventEnvelope, Version};
use tokio::sync::RwLock;

use crate::error::{ProjectionError, Result};
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// A category as the index last saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub id: AggregateId,
    pub fields: CategoryFields,
    /// Stream version of the event that produced this record.
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

impl CategoryRecord {
    pub fn name(&self) -> &str {
        &self.fields.name
    }

    pub fn slug(&self) -> Option<&Slug> {
        self.fields.slug.as_ref()
    }

    pub fn parent(&self) -> Option<&AggregateId> {
        self.fields.parent.as_ref()
    }
}

#[derive(Default)]
struct IndexState {
    records: HashMap<AggregateId, CategoryRecord>,
    /// Parent id (None for top level) -> child ids, ordered by id.
    children: HashMap<Option<AggregateId>, BTreeSet<AggregateId>>,
    position: ProjectionPosition,
}

impl IndexState {
    fn attach(&mut self, record: CategoryRecord) {
        if let Some(previous) = self.records.get(&record.id)
            && previous.parent() != record.parent()
        {
            let old_parent = previous.fields.parent.clone();
            self.detach_from(&old_parent, &record.id);
        }

        self.children
            .entry(record.fields.parent.clone())
            .or_default()
            .insert(record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    fn remove(&mut self, id: &AggregateId) {
        if let Some(record) = self.records.remove(id) {
            self.detach_from(&record.fields.parent, id);
        }
    }

    fn detach_from(&mut self, parent: &Option<AggregateId>, id: &AggregateId) {
        if let Some(set) = self.children.get_mut(parent) {
            set.remove(id);
            if set.is_empty() {
                self.children.remove(parent);
            }
        }
    }

    fn children_of(&self, parent: &Option<AggregateId>) -> Vec<CategoryRecord> {
        self.children
            .get(parent)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Derived index answering "which categories sit directly under this one".
///
/// Built only from category events, in the order they were committed, so a
/// read may lag the latest command. A deleted category's children keep
/// pointing at it and are still listed under its id.
#[derive(Clone, Default)]
pub struct SubcategoryIndex {
    state: Arc<RwLock<IndexState>>,
}

impl SubcategoryIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the direct children of a category, ordered by id.
    pub async fn subcategories(&self, category: &AggregateId) -> Vec<CategoryRecord> {
        self.state
            .read()
            .await
            .children_of(&Some(category.clone()))
    }

    /// Returns categories without a parent, ordered by id.
    pub async fn top_level(&self) -> Vec<CategoryRecord> {
        self.state.read().await.children_of(&None)
    }

    /// Returns the indexed record of a category.
    pub async fn get(&self, category: &AggregateId) -> Option<CategoryRecord> {
        self.state.read().await.records.get(category).cloned()
    }
}

#[async_trait]
impl Projection for SubcategoryIndex {
    fn name(&self) -> &'static str {
        "SubcategoryIndex"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if !event.is_for(<Category as domain::Aggregate>::aggregate_type()) {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let mut state = self.state.write().await;

        // Undecodable events are stepped past, then reported.
        let category_event: CategoryEvent = match event.decode() {
            Ok(decoded) => decoded,
            Err(source) => {
                state.position = state.position.advance();
                return Err(ProjectionError::Decode {
                    projection: "SubcategoryIndex",
                    event_type: event.event_type.clone(),
                    version: event.version,
                    source,
                });
            }
        };

        match category_event {
            CategoryEvent::CategoryCreated(data) => {
                state.attach(CategoryRecord {
                    id: data.category,
                    fields: data.data,
                    version: event.version,
                    updated_at: data.created_at,
                });
            }
            CategoryEvent::CategoryUpdated(data) => {
                if !state.records.contains_key(&data.category) {
                    tracing::debug!(category = %data.category, "update for unindexed category, inserting");
                }
                state.attach(CategoryRecord {
                    id: data.category,
                    fields: data.data,
                    version: event.version,
                    updated_at: data.updated_at,
                });
            }
            CategoryEvent::CategoryDeleted(data) => {
                state.remove(&data.category);
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = IndexState::default();
        Ok(())
    }
}

impl ReadModel for SubcategoryIndex {
    fn name(&self) -> &'static str {
        "SubcategoryIndex"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.state.try_read().map(|s| s.records.len()).unwrap_or(0)
    }
}
