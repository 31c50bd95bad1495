//! Slug allocation for the category service.
//!
//! Slugs are owned by a separate service that partitions its namespace into
//! groups. This crate defines the [`SlugAllocator`] protocol the category
//! command handlers speak, and an in-memory implementation of it.

pub mod allocator;
pub mod error;
pub mod memory;
pub mod slug;

pub use allocator::SlugAllocator;
pub use error::SlugError;
pub use memory::{InMemorySlugAllocator, SlugCall};
pub use self::slug::{Slug, slugify};
