//! In-memory slug allocator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::AggregateId;

use crate::{Slug, SlugAllocator, SlugError, slugify};

/// A call received by [`InMemorySlugAllocator`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugCall {
    Create {
        group: String,
        title: String,
        owner: AggregateId,
    },
    Take {
        group: String,
        path: Slug,
        owner: AggregateId,
    },
    Release {
        group: String,
        path: Slug,
        owner: AggregateId,
    },
}

impl SlugCall {
    /// Short operation name, matching the protocol method.
    pub fn op(&self) -> &'static str {
        match self {
            SlugCall::Create { .. } => "create",
            SlugCall::Take { .. } => "take",
            SlugCall::Release { .. } => "release",
        }
    }
}

#[derive(Debug, Default)]
struct AllocatorState {
    /// (group, path) -> owner
    reservations: HashMap<(String, String), AggregateId>,
    calls: Vec<SlugCall>,
    fail_next: bool,
    fail_on_create: bool,
    fail_on_take: bool,
}

impl AllocatorState {
    fn holder(&self, group: &str, path: &str) -> Option<&AggregateId> {
        self.reservations.get(&(group.to_string(), path.to_string()))
    }

    fn take_failure(&mut self, fail_op: bool) -> Result<(), SlugError> {
        if std::mem::take(&mut self.fail_next) || fail_op {
            return Err(SlugError::Unavailable(
                "slug service did not respond".to_string(),
            ));
        }
        Ok(())
    }
}

/// Slug allocator that keeps reservations in process memory.
///
/// Used by the service binary when no remote allocator is configured, and by
/// tests, which can inspect the call log and inject failures.
#[derive(Debug, Clone, Default)]
pub struct InMemorySlugAllocator {
    state: Arc<Mutex<AllocatorState>>,
}

impl InMemorySlugAllocator {
    /// Creates an allocator with no reservations.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, AllocatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next call fail with [`SlugError::Unavailable`].
    pub fn set_fail_next(&self, fail: bool) {
        self.state().fail_next = fail;
    }

    /// Makes every create call fail with [`SlugError::Unavailable`].
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state().fail_on_create = fail;
    }

    /// Makes every take call fail with [`SlugError::Unavailable`].
    pub fn set_fail_on_take(&self, fail: bool) {
        self.state().fail_on_take = fail;
    }

    /// Reserves `path` for `owner` without recording a call.
    pub fn reserve(&self, group: &str, path: &str, owner: AggregateId) {
        self.state()
            .reservations
            .insert((group.to_string(), path.to_string()), owner);
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<SlugCall> {
        self.state().calls.clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Forgets the call log, keeping reservations.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Returns the owner holding `path` in `group`, if any.
    pub fn holder(&self, group: &str, path: &str) -> Option<AggregateId> {
        self.state().holder(group, path).cloned()
    }

    /// Returns true if `path` is reserved in `group`.
    pub fn is_reserved(&self, group: &str, path: &str) -> bool {
        self.holder(group, path).is_some()
    }

    /// Returns the number of reservations in `group`.
    pub fn reservation_count(&self, group: &str) -> usize {
        self.state()
            .reservations
            .keys()
            .filter(|(g, _)| g == group)
            .count()
    }
}

#[async_trait]
impl SlugAllocator for InMemorySlugAllocator {
    async fn create_slug(
        &self,
        group: &str,
        title: &str,
        owner: &AggregateId,
    ) -> Result<Slug, SlugError> {
        let mut state = self.state();
        state.calls.push(SlugCall::Create {
            group: group.to_string(),
            title: title.to_string(),
            owner: owner.clone(),
        });
        let fail = state.fail_on_create;
        state.take_failure(fail)?;

        let base = slugify(title);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while let Some(holder) = state.holder(group, &candidate) {
            if holder == owner {
                break;
            }
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }

        state
            .reservations
            .insert((group.to_string(), candidate.clone()), owner.clone());
        tracing::debug!(group, slug = %candidate, %owner, "slug created");

        Ok(Slug::new(candidate))
    }

    async fn take_slug(
        &self,
        group: &str,
        path: &Slug,
        owner: &AggregateId,
    ) -> Result<(), SlugError> {
        let mut state = self.state();
        state.calls.push(SlugCall::Take {
            group: group.to_string(),
            path: path.clone(),
            owner: owner.clone(),
        });
        let fail = state.fail_on_take;
        state.take_failure(fail)?;

        if let Some(holder) = state.holder(group, path.as_str())
            && holder != owner
        {
            return Err(SlugError::Conflict {
                group: group.to_string(),
                path: path.to_string(),
            });
        }

        state
            .reservations
            .insert((group.to_string(), path.to_string()), owner.clone());
        tracing::debug!(group, slug = %path, %owner, "slug taken");

        Ok(())
    }

    async fn release_slug(
        &self,
        group: &str,
        path: &Slug,
        owner: &AggregateId,
    ) -> Result<(), SlugError> {
        let mut state = self.state();
        state.calls.push(SlugCall::Release {
            group: group.to_string(),
            path: path.clone(),
            owner: owner.clone(),
        });
        state.take_failure(false)?;

        let key = (group.to_string(), path.to_string());
        if state.reservations.get(&key) == Some(owner) {
            state.reservations.remove(&key);
            tracing::debug!(group, slug = %path, %owner, "slug released");
        }

        Ok(())
    }
}
