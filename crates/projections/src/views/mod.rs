//! Read model views for the CQRS query side.

pub mod subcategories;

pub use subcategories::{CategoryRecord, SubcategoryIndex};
