//! Shared types for the category service workspace.

pub mod types;

pub use types::{AggregateId, ROOT_ID};
