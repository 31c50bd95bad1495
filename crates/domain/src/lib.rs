//! Domain layer for the category service.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandHandler for command processing
//! - Access policy over the fixed role set
//! - Category aggregate and the service running its command handlers

pub mod access;
pub mod aggregate;
pub mod category;
pub mod command;
pub mod error;

pub use access::{Access, AccessPolicy, Actor, AdminOnly, CommandKind, Role};
pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use category::{
    CATEGORY_GROUP, Category, CategoryCreate, CategoryCreatedData, CategoryDelete,
    CategoryDeletedData, CategoryError, CategoryEvent, CategoryFields, CategoryService,
    CategoryUpdate, CategoryUpdatedData, Locale, PictureId, Translation, Translations,
};
pub use command::{Command, CommandHandler, CommandResult, Concurrency};
pub use error::DomainError;
pub use slugs::Slug;
