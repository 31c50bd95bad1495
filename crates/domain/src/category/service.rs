//! Category service implementing the create, update and delete handlers.
//!
//! Every handler authorizes first, then validates, then talks to the slug
//! allocator, and only then appends its single event. A crash between a
//! successful allocator call and the append leaves an orphaned reservation;
//! nothing here retries or compensates.

use std::time::Instant;

use common::AggregateId;
use event_store::{EventQuery, EventStore, Version};
use slugs::{Slug, SlugAllocator};

use crate::access::{Access, AccessPolicy, Actor, AdminOnly, CommandKind};
use crate::aggregate::Aggregate;
use crate::command::{Command, CommandHandler, Concurrency};
use crate::error::DomainError;

use super::{
    CATEGORY_GROUP, Category, CategoryCreate, CategoryDelete, CategoryError, CategoryEvent,
    CategoryFields, CategoryUpdate,
};

/// Service for managing categories.
///
/// Same-id commands are not serialized against each other. Appends go to the
/// end of the stream, so of two concurrent updates the later one wins; the
/// handler logs `concurrent_write` when that happens.
pub struct CategoryService<S, L, P = AdminOnly>
where
    S: EventStore,
    L: SlugAllocator,
    P: AccessPolicy,
{
    handler: CommandHandler<S, Category>,
    slugs: L,
    policy: P,
}

impl<S, L> CategoryService<S, L, AdminOnly>
where
    S: EventStore,
    L: SlugAllocator,
{
    /// Creates a service that only lets administrators write.
    pub fn new(store: S, slugs: L) -> Self {
        Self::with_policy(store, slugs, AdminOnly)
    }
}

impl<S, L, P> CategoryService<S, L, P>
where
    S: EventStore,
    L: SlugAllocator,
    P: AccessPolicy,
{
    /// Creates a service with a custom access policy.
    pub fn with_policy(store: S, slugs: L, policy: P) -> Self {
        Self {
            handler: CommandHandler::new(store).with_concurrency(Concurrency::LastWriteWins),
            slugs,
            policy,
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Category> {
        &self.handler
    }

    /// Returns the slug allocator the service talks to.
    pub fn slugs(&self) -> &L {
        &self.slugs
    }

    /// Creates a category and returns its id.
    ///
    /// Without a slug one is derived from the name; with one, that exact
    /// slug is reserved or the command fails with `slug: taken`.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        actor: &Actor,
        cmd: CategoryCreate,
    ) -> Result<AggregateId, DomainError> {
        let started = Instant::now();
        let result = self.run_create(actor, cmd).await;
        record_outcome(CommandKind::Create, &result, started);
        result
    }

    /// Replaces the fields of a category and returns its id.
    ///
    /// A changed slug releases the old one before reserving the new one. If
    /// the reservation then fails no event is appended, so the stored
    /// category still names the released slug while the allocator no longer
    /// holds it for this category. Updating again with that same slug makes
    /// no allocator call.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        actor: &Actor,
        cmd: CategoryUpdate,
    ) -> Result<AggregateId, DomainError> {
        let started = Instant::now();
        let result = self.run_update(actor, cmd).await;
        record_outcome(CommandKind::Update, &result, started);
        result
    }

    /// Deletes a category, releasing its slug first. A category without a
    /// slug, such as the seeded root, makes no allocator call.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, actor: &Actor, cmd: CategoryDelete) -> Result<(), DomainError> {
        let started = Instant::now();
        let result = self.run_delete(actor, cmd).await;
        record_outcome(CommandKind::Delete, &result, started);
        result
    }

    /// Loads a category by ID.
    ///
    /// Returns None if the category doesn't exist or was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, category: &AggregateId) -> Result<Option<Category>, DomainError> {
        self.handler.load_existing(category).await
    }

    /// Returns the recorded events of a category with their versions, oldest
    /// first. A deleted category keeps its history; a seeded root has none.
    #[tracing::instrument(skip(self))]
    pub async fn history(
        &self,
        category: &AggregateId,
    ) -> Result<Vec<(Version, CategoryEvent)>, DomainError> {
        let query = EventQuery::for_aggregate(category.clone())
            .aggregate_type(<Category as Aggregate>::aggregate_type());
        let envelopes = self.handler.store().query_events(query).await?;

        let mut events = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            events.push((envelope.version, envelope.decode()?));
        }
        Ok(events)
    }

    /// Seeds the root category when it is missing.
    ///
    /// The root is written as a snapshot, bypassing the create handler, so it
    /// has no event and no slug. Returns true if it had to be created.
    #[tracing::instrument(skip(self))]
    pub async fn ensure_root(&self) -> Result<bool, DomainError> {
        let id = AggregateId::root();
        if self.get(&id).await?.is_some() {
            tracing::debug!("root category present");
            return Ok(false);
        }

        // A deleted root still has a stream; seed past its end.
        let version = self
            .handler
            .store()
            .get_aggregate_version(&id)
            .await?
            .unwrap_or(Version::initial());
        let mut root = Category::root();
        root.set_version(version);
        self.handler.save_snapshot(&id, &root).await?;

        tracing::info!(%version, "root category created");
        Ok(true)
    }

    async fn run_create(
        &self,
        actor: &Actor,
        cmd: CategoryCreate,
    ) -> Result<AggregateId, DomainError> {
        self.authorize(actor, CommandKind::Create)?;
        cmd.fields.validate()?;

        let category = cmd.aggregate_id();
        let mut fields = cmd.fields;
        fields.slug = Some(self.acquire_slug(&category, &fields).await?);

        // Ids are fresh, so there is nothing to load.
        let result = self
            .handler
            .commit_with_snapshot(&category, Category::default(), |c| {
                c.create(category.clone(), fields)
            })
            .await?;

        tracing::info!(%category, version = %result.new_version, "category created");
        Ok(category)
    }

    async fn run_update(
        &self,
        actor: &Actor,
        cmd: CategoryUpdate,
    ) -> Result<AggregateId, DomainError> {
        self.authorize(actor, CommandKind::Update)?;
        cmd.fields.validate()?;

        let category = cmd.aggregate_id();
        let current = self.load_required(&category).await?;
        let mut fields = cmd.fields;

        let held = current.slug().cloned();
        let requested = fields.requested_slug().cloned();
        if requested != held {
            if let Some(old) = &held {
                self.release_slug(&category, old).await?;
            }
            match self.acquire_slug(&category, &fields).await {
                Ok(slug) => fields.slug = Some(slug),
                Err(e) => {
                    if let Some(old) = &held {
                        tracing::warn!(%category, released = %old, error = %e, "slug released but replacement failed");
                    }
                    return Err(e.into());
                }
            }
        } else {
            fields.slug = held;
        }

        let result = self
            .handler
            .commit_with_snapshot(&category, current, |c| c.update(&category, fields))
            .await?;

        tracing::info!(%category, version = %result.new_version, "category updated");
        Ok(category)
    }

    async fn run_delete(&self, actor: &Actor, cmd: CategoryDelete) -> Result<(), DomainError> {
        self.authorize(actor, CommandKind::Delete)?;

        let category = cmd.aggregate_id();
        let current = self.load_required(&category).await?;

        if let Some(slug) = current.slug().cloned() {
            self.release_slug(&category, &slug).await?;
        }

        let result = self
            .handler
            .commit_with_snapshot(&category, current, |c| c.delete(&category))
            .await?;

        tracing::info!(%category, version = %result.new_version, "category deleted");
        Ok(())
    }

    fn authorize(&self, actor: &Actor, command: CommandKind) -> Result<(), CategoryError> {
        match self.policy.check(actor, command) {
            Access::Allow => Ok(()),
            Access::Deny => {
                tracing::warn!(actor = %actor.id, role = ?actor.role, %command, "access denied");
                Err(CategoryError::AccessDenied { command })
            }
        }
    }

    async fn load_required(&self, category: &AggregateId) -> Result<Category, DomainError> {
        self.handler
            .load_existing(category)
            .await?
            .ok_or_else(|| CategoryError::NotFound(category.clone()).into())
    }

    /// Takes the requested slug, or derives one from the name.
    async fn acquire_slug(
        &self,
        owner: &AggregateId,
        fields: &CategoryFields,
    ) -> Result<Slug, CategoryError> {
        match fields.requested_slug() {
            Some(slug) => {
                count_allocator_call("take");
                if let Err(e) = self.slugs.take_slug(CATEGORY_GROUP, slug, owner).await {
                    tracing::info!(%owner, %slug, error = %e, "slug not reserved");
                    return Err(e.into());
                }
                Ok(slug.clone())
            }
            None => {
                count_allocator_call("create");
                let slug = self
                    .slugs
                    .create_slug(CATEGORY_GROUP, &fields.name, owner)
                    .await?;
                tracing::debug!(%owner, %slug, "slug derived from name");
                Ok(slug)
            }
        }
    }

    async fn release_slug(&self, owner: &AggregateId, slug: &Slug) -> Result<(), CategoryError> {
        count_allocator_call("release");
        self.slugs.release_slug(CATEGORY_GROUP, slug, owner).await?;
        Ok(())
    }
}

fn count_allocator_call(op: &'static str) {
    metrics::counter!("slug_allocator_calls_total", "op" => op).increment(1);
}

fn record_outcome<T>(command: CommandKind, result: &Result<T, DomainError>, started: Instant) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(DomainError::Category(e)) => e.kind(),
        Err(_) => "error",
    };
    metrics::counter!(
        "category_commands_total",
        "command" => command.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("category_command_duration_seconds", "command" => command.as_str())
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Role;
    use crate::aggregate::DomainEvent;
    use event_store::InMemoryEventStore;
    use slugs::{InMemorySlugAllocator, SlugCall};

    fn service() -> CategoryService<InMemoryEventStore, InMemorySlugAllocator> {
        CategoryService::new(InMemoryEventStore::new(), InMemorySlugAllocator::new())
    }

    fn admin() -> Actor {
        Actor::admin("admin-1")
    }

    #[tokio::test]
    async fn test_create_without_slug_derives_one() {
        let service = service();
        let cmd = CategoryCreate::new(CategoryFields::named("Shoes"));
        let id = cmd.category.clone();

        let created = service.create(&admin(), cmd).await.unwrap();
        assert_eq!(created, id);

        let category = service.get(&id).await.unwrap().unwrap();
        assert_eq!(category.slug().map(Slug::as_str), Some("shoes"));
        assert_eq!(
            service.slugs().calls(),
            vec![SlugCall::Create {
                group: CATEGORY_GROUP.to_string(),
                title: "Shoes".to_string(),
                owner: id,
            }]
        );
    }

    #[tokio::test]
    async fn test_create_with_taken_slug_is_rejected() {
        let service = service();
        service
            .slugs()
            .reserve(CATEGORY_GROUP, "shoes", AggregateId::new());

        let cmd = CategoryCreate::new(CategoryFields::named("Shoes").with_slug("shoes"));
        let id = cmd.category.clone();
        let err = service.create(&admin(), cmd).await.unwrap_err();

        assert_eq!(err.as_category(), Some(&CategoryError::slug_taken()));
        assert!(service.get(&id).await.unwrap().is_none());
        assert_eq!(service.handler().store().event_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_with_empty_name_makes_no_allocator_call() {
        let service = service();
        let err = service
            .create(&admin(), CategoryCreate::new(CategoryFields::named("")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_category(),
            Some(CategoryError::ValidationFailed { field: "name", .. })
        ));
        assert_eq!(service.slugs().call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_unchanged_slug_skips_allocator() {
        let service = service();
        let id = service
            .create(&admin(), CategoryCreate::new(CategoryFields::named("Shoes")))
            .await
            .unwrap();
        service.slugs().clear_calls();

        service
            .update(
                &admin(),
                CategoryUpdate::new(
                    id.clone(),
                    CategoryFields::named("Shoes & Boots").with_slug("shoes"),
                ),
            )
            .await
            .unwrap();

        assert_eq!(service.slugs().call_count(), 0);
        let category = service.get(&id).await.unwrap().unwrap();
        assert_eq!(category.name(), "Shoes & Boots");
    }

    #[tokio::test]
    async fn test_update_missing_category_is_not_found() {
        let service = service();
        let id = AggregateId::new();

        let err = service
            .update(&admin(), CategoryUpdate::new(id.clone(), CategoryFields::named("x")))
            .await
            .unwrap_err();

        assert_eq!(err.as_category(), Some(&CategoryError::NotFound(id)));
        assert_eq!(service.slugs().call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_releases_slug() {
        let service = service();
        let id = service
            .create(&admin(), CategoryCreate::new(CategoryFields::named("Shoes")))
            .await
            .unwrap();

        service
            .delete(&admin(), CategoryDelete::new(id.clone()))
            .await
            .unwrap();

        assert!(!service.slugs().is_reserved(CATEGORY_GROUP, "shoes"));
        assert!(service.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_viewer_is_denied() {
        let service = service();
        let viewer = Actor::new("v-1", Role::Viewer);

        let err = service
            .create(&viewer, CategoryCreate::new(CategoryFields::named("Shoes")))
            .await
            .unwrap_err();

        assert_eq!(
            err.as_category(),
            Some(&CategoryError::AccessDenied {
                command: CommandKind::Create
            })
        );
        assert_eq!(service.slugs().call_count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_root_is_idempotent() {
        let service = service();

        assert!(service.ensure_root().await.unwrap());
        assert!(!service.ensure_root().await.unwrap());

        let root = service.get(&AggregateId::root()).await.unwrap().unwrap();
        assert_eq!(root.name(), "root");
        assert!(root.slug().is_none());
        assert_eq!(service.handler().store().event_count().await, 0);
        assert_eq!(service.slugs().call_count(), 0);
    }

    #[tokio::test]
    async fn test_history_lists_events_after_delete() {
        let service = service();
        let id = service
            .create(&admin(), CategoryCreate::new(CategoryFields::named("Shoes")))
            .await
            .unwrap();
        service
            .update(
                &admin(),
                CategoryUpdate::new(id.clone(), CategoryFields::named("Boots").with_slug("shoes")),
            )
            .await
            .unwrap();
        service
            .delete(&admin(), CategoryDelete::new(id.clone()))
            .await
            .unwrap();

        let history = service.history(&id).await.unwrap();
        let kinds: Vec<_> = history
            .iter()
            .map(|(v, e)| (v.as_i64(), e.event_type()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (1, "CategoryCreated"),
                (2, "CategoryUpdated"),
                (3, "CategoryDeleted")
            ]
        );
        assert!(history.iter().all(|(_, e)| e.category() == &id));
    }

    #[tokio::test]
    async fn test_history_of_seeded_root_is_empty() {
        let service = service();
        service.ensure_root().await.unwrap();

        assert!(service.history(&AggregateId::root()).await.unwrap().is_empty());
    }
}
