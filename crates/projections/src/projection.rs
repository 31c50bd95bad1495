//! Projection trait and delivery position.

use async_trait::async_trait;
use event_store::EventEnvelope;

use crate::Result;

/// How far into the store's commit order a projection has read.
///
/// Every delivered event advances the position, including events the
/// projection ignores, so it always equals the number of log entries seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    pub events_processed: u64,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }

    /// True if the event at 1-based `log_index` has not been delivered yet.
    pub fn is_behind(&self, log_index: u64) -> bool {
        self.events_processed < log_index
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// An event handler that maintains a read model.
///
/// The processor is the only caller of `handle` and delivers events one at a
/// time in commit order. Readers may observe the read model between
/// deliveries, so it lags the log by however much has not been delivered.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    /// Folds one event into the read model and advances the position.
    ///
    /// An event left behind the position after an error is offered again on
    /// the next catch-up. An event that can never apply, such as one that
    /// does not decode, should be stepped past before the error is returned.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Drops all derived state and returns to position zero.
    async fn reset(&self) -> Result<()>;
}
