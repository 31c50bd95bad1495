//! Query-side access to projected state.

/// A read model built by a projection.
///
/// Counts are best effort: an implementation may report 0 rather than wait
/// while a delivery holds its state.
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of live entries.
    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
