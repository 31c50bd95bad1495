//! Projection processor for feeding events to projections.

use std::time::Duration;

use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;
use tokio::sync::watch;

use crate::Result;
use crate::projection::Projection;

/// Processes events from an event store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: replays all events from the store to bring projections up to date
/// - Single event delivery: delivers a new event to all projections
/// - Rebuild: resets all projections and replays from scratch
/// - Follow: keeps catching up on an interval until told to stop
///
/// It is the only writer of the projections it holds, and delivers events in
/// the store's commit order.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Runs catch-up processing: streams all events from the store and delivers
    /// them to each projection that hasn't already seen them.
    ///
    /// Returns the number of deliveries made.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<u64> {
        let mut stream = self.store.stream_all_events().await?;
        let mut event_index: u64 = 0;
        let mut delivered: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            event_index += 1;

            for projection in &self.projections {
                if projection.position().await.is_behind(event_index) {
                    if let Err(e) = projection.handle(&event).await {
                        tracing::error!(
                            projection = projection.name(),
                            event_type = %event.event_type,
                            error = %e,
                            "delivery failed"
                        );
                        return Err(e);
                    }
                    metrics::counter!("projections_events_processed").increment(1);
                    delivered += 1;
                }
            }
        }

        if delivered > 0 {
            tracing::info!(events_seen = event_index, delivered, "catch-up complete");
        } else {
            tracing::trace!(events_seen = event_index, "projections up to date");
        }

        Ok(delivered)
    }

    /// Delivers a single event to all registered projections.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
        }
        Ok(())
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await?;
        Ok(())
    }

    /// Catches up every `poll_interval` until `shutdown` flips to true or its
    /// sender is dropped. A final catch-up runs before returning.
    ///
    /// A failed catch-up is logged and retried on the next tick, so one bad
    /// event or a store hiccup does not stop the follower.
    #[tracing::instrument(skip(self, shutdown))]
    pub async fn follow(
        &self,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_catch_up().await {
                        metrics::counter!("projections_catch_up_failures").increment(1);
                        tracing::warn!(error = %e, "catch-up failed, retrying on next tick");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.run_catch_up().await?;
        tracing::info!("projection follower stopped");
        Ok(())
    }
}
