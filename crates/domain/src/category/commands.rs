//! Category commands.

use common::AggregateId;

use crate::command::Command;

use super::{Category, CategoryFields};

/// Command to create a category.
#[derive(Debug, Clone)]
pub struct CategoryCreate {
    /// Id the new category will get.
    pub category: AggregateId,

    /// Declared fields; the slug is allocated when left empty.
    pub fields: CategoryFields,
}

impl CategoryCreate {
    /// Creates the command with a freshly generated id.
    pub fn new(fields: CategoryFields) -> Self {
        Self::with_id(AggregateId::new(), fields)
    }

    /// Creates the command for a caller-chosen id.
    pub fn with_id(category: AggregateId, fields: CategoryFields) -> Self {
        Self { category, fields }
    }
}

impl Command for CategoryCreate {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category.clone()
    }
}

/// Command to replace the fields of an existing category.
#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    pub category: AggregateId,
    pub fields: CategoryFields,
}

impl CategoryUpdate {
    pub fn new(category: AggregateId, fields: CategoryFields) -> Self {
        Self { category, fields }
    }
}

impl Command for CategoryUpdate {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category.clone()
    }
}

/// Command to delete a category.
#[derive(Debug, Clone)]
pub struct CategoryDelete {
    pub category: AggregateId,
}

impl CategoryDelete {
    pub fn new(category: AggregateId) -> Self {
        Self { category }
    }
}

impl Command for CategoryDelete {
    type Aggregate = Category;

    fn aggregate_id(&self) -> AggregateId {
        self.category.clone()
    }
}
