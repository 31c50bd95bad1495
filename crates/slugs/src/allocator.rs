//! The slug allocation protocol.

use async_trait::async_trait;
use common::AggregateId;

use crate::{Slug, SlugError};

/// Client for the remote slug allocation service.
///
/// Every call is addressed to a `group`, a named partition of the slug
/// namespace, and carries the id of the entity that owns the reservation.
#[async_trait]
pub trait SlugAllocator: Send + Sync {
    /// Derives a slug from `title` and reserves it for `owner`.
    ///
    /// The returned slug may differ from the plain derivation when that is
    /// already in use.
    async fn create_slug(
        &self,
        group: &str,
        title: &str,
        owner: &AggregateId,
    ) -> Result<Slug, SlugError>;

    /// Reserves the exact `path` for `owner`.
    ///
    /// Fails with [`SlugError::Conflict`] when another owner holds it.
    async fn take_slug(&self, group: &str, path: &Slug, owner: &AggregateId)
    -> Result<(), SlugError>;

    /// Frees a reservation. Releasing a path that is not held is not an error.
    async fn release_slug(
        &self,
        group: &str,
        path: &Slug,
        owner: &AggregateId,
    ) -> Result<(), SlugError>;
}
