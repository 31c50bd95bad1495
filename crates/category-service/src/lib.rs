//! Category service wiring.
//!
//! Puts the command side ([`CategoryService`]) and the query side
//! ([`SubcategoryIndex`] fed by a [`ProjectionProcessor`]) on one event store,
//! seeds the root category and keeps the index following the store.

pub mod config;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use common::AggregateId;
use domain::CategoryService;
use event_store::EventStore;
use projections::{CategoryRecord, Projection, ProjectionProcessor, SubcategoryIndex};
use slugs::SlugAllocator;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use config::{Config, LogFormat};
pub use error::ServiceError;

/// The running pieces of the service.
pub struct App<S: EventStore + Clone + 'static, L: SlugAllocator> {
    pub service: CategoryService<S, L>,
    pub index: SubcategoryIndex,
    pub processor: Arc<ProjectionProcessor<S>>,
}

impl<S: EventStore + Clone + 'static, L: SlugAllocator> App<S, L> {
    /// Wires a service and a subcategory index onto the same store.
    pub fn new(store: S, slugs: L) -> Self {
        let service = CategoryService::new(store.clone(), slugs);

        let index = SubcategoryIndex::new();
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(index.clone()) as Box<dyn Projection>);

        Self {
            service,
            index,
            processor: Arc::new(processor),
        }
    }

    /// Seeds the root category if missing and brings the index up to date.
    ///
    /// Safe to run on every start.
    #[tracing::instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<(), ServiceError> {
        if self.service.ensure_root().await? {
            metrics::counter!("category_root_bootstraps_total").increment(1);
        }
        let delivered = self.processor.run_catch_up().await?;
        tracing::info!(delivered, "bootstrap complete");
        Ok(())
    }

    /// Starts the index follower on the current runtime.
    ///
    /// The task stops after a final catch-up once `shutdown` is set to true.
    pub fn spawn_follower(
        &self,
        poll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<Result<(), ServiceError>> {
        let processor = Arc::clone(&self.processor);
        tokio::spawn(async move {
            processor.follow(poll_interval, shutdown).await?;
            Ok(())
        })
    }

    /// Direct children of the root category, as the index currently sees them.
    pub async fn root_children(&self) -> Vec<CategoryRecord> {
        self.index.subcategories(&AggregateId::root()).await
    }
}
