//! Category aggregate implementation.

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};
use slugs::Slug;

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::{CategoryError, CategoryEvent, CategoryFields};

/// Category aggregate root.
///
/// A category exists from its creation event until its deletion event. The
/// snapshot form is the flat record `{id, version, name, ...}`, which is also
/// how the bootstrap root is seeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category identifier.
    id: Option<AggregateId>,

    /// Current version of the event stream.
    #[serde(default)]
    version: Version,

    #[serde(flatten)]
    fields: CategoryFields,
}

impl Aggregate for Category {
    type Event = CategoryEvent;
    type Error = CategoryError;

    fn aggregate_type() -> &'static str {
        "Category"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id.clone()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CategoryEvent::CategoryCreated(data) => {
                self.id = Some(data.category);
                self.fields = data.data;
            }
            CategoryEvent::CategoryUpdated(data) => {
                self.id = Some(data.category);
                self.fields = data.data;
            }
            CategoryEvent::CategoryDeleted(_) => {
                *self = Category {
                    version: self.version,
                    ..Category::default()
                };
            }
        }
    }
}

impl SnapshotCapable for Category {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Category {
    /// Builds the record the service seeds at startup.
    pub fn root() -> Self {
        Self {
            id: Some(AggregateId::root()),
            version: Version::initial(),
            fields: CategoryFields::named(common::ROOT_ID),
        }
    }

    /// Returns the full declared field set.
    pub fn fields(&self) -> &CategoryFields {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    /// Returns the slug currently held, if any.
    pub fn slug(&self) -> Option<&Slug> {
        self.fields.slug.as_ref().filter(|s| !s.is_empty())
    }

    pub fn parent(&self) -> Option<&AggregateId> {
        self.fields.parent.as_ref()
    }

    /// Returns true while the category has not been deleted.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }
}

// Command methods (return events)
impl Category {
    /// Creates a category with fields whose slug is already allocated.
    ///
    /// Ids are generator-assigned, so no prior existence is checked.
    pub fn create(
        &self,
        id: AggregateId,
        fields: CategoryFields,
    ) -> Result<Vec<CategoryEvent>, CategoryError> {
        fields.validate()?;
        Ok(vec![CategoryEvent::category_created(id, fields)])
    }

    /// Replaces the whole field set.
    pub fn update(
        &self,
        id: &AggregateId,
        fields: CategoryFields,
    ) -> Result<Vec<CategoryEvent>, CategoryError> {
        self.ensure_exists(id)?;
        fields.validate()?;
        Ok(vec![CategoryEvent::category_updated(id.clone(), fields)])
    }

    /// Deletes the category.
    pub fn delete(&self, id: &AggregateId) -> Result<Vec<CategoryEvent>, CategoryError> {
        self.ensure_exists(id)?;
        Ok(vec![CategoryEvent::category_deleted(id.clone())])
    }

    fn ensure_exists(&self, id: &AggregateId) -> Result<(), CategoryError> {
        match &self.id {
            Some(current) if current == id => Ok(()),
            _ => Err(CategoryError::NotFound(id.clone())),
        }
    }
}
