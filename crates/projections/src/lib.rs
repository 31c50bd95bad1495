//! Query side of the category service.
//!
//! The [`ProjectionProcessor`] reads the event log in commit order and feeds
//! each registered [`Projection`]. The only read model is the
//! [`SubcategoryIndex`], which answers "what sits directly under this
//! category". Reads are eventually consistent with the command side.

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{CategoryRecord, SubcategoryIndex};
