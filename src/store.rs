//! Persistence seam for committed timetables.
//!
//! A [`ScheduleStore`] keeps one schedule per scope and allows a single
//! writer per scope at a time. Writers hold a [`ScopeGuard`] for the whole
//! generate-then-commit sequence; a second writer gets
//! [`SchedulingError::ScopeBusy`] until the guard is dropped.
//!
//! Commits replace every prior entry of the scope as a unit.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::SchedulingError;
use crate::models::{ScheduleEntry, ScopeKey};

/// Storage for committed schedules.
pub trait ScheduleStore: Send + Sync {
    /// Takes the write lock of `scope`.
    ///
    /// # Errors
    /// `ScopeBusy` when another writer holds it.
    fn lock_scope(&self, scope: &ScopeKey) -> Result<(), SchedulingError>;

    /// Releases the write lock of `scope`. Releasing an unlocked scope is a no-op.
    fn unlock_scope(&self, scope: &ScopeKey);

    /// Replaces every entry of `scope` with `entries`, all or nothing.
    fn replace(&self, scope: &ScopeKey, entries: Vec<ScheduleEntry>) -> Result<(), SchedulingError>;

    /// Committed entries of `scope` (empty when never committed).
    fn load(&self, scope: &ScopeKey) -> Result<Vec<ScheduleEntry>, SchedulingError>;
}

/// Write lock on one scope. Released on drop.
pub struct ScopeGuard<'a, S: ScheduleStore + ?Sized> {
    store: &'a S,
    scope: ScopeKey,
}

impl<'a, S: ScheduleStore + ?Sized> ScopeGuard<'a, S> {
    /// Locks `scope` on `store`.
    pub fn acquire(store: &'a S, scope: ScopeKey) -> Result<Self, SchedulingError> {
        store.lock_scope(&scope)?;
        Ok(Self { store, scope })
    }

    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    /// Replaces the scope's schedule, then releases the lock.
    pub fn commit(self, entries: &[ScheduleEntry]) -> Result<(), SchedulingError> {
        self.store.replace(&self.scope, entries.to_vec())?;
        debug!(event = "committed", scope = %self.scope, entries = entries.len());
        Ok(())
    }
}

impl<S: ScheduleStore + ?Sized> Drop for ScopeGuard<'_, S> {
    fn drop(&mut self) {
        self.store.unlock_scope(&self.scope);
    }
}

impl<S: ScheduleStore + ?Sized> std::fmt::Debug for ScopeGuard<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").field("scope", &self.scope).finish()
    }
}

#[derive(Debug, Default)]
struct Inner {
    schedules: HashMap<ScopeKey, Vec<ScheduleEntry>>,
    locked: HashSet<ScopeKey>,
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>, SchedulingError> {
        self.inner
            .lock()
            .map_err(|e| SchedulingError::Store(format!("store lock poisoned: {e}")))
    }

    /// Whether a writer currently holds `scope`.
    pub fn is_locked(&self, scope: &ScopeKey) -> bool {
        self.inner().map(|i| i.locked.contains(scope)).unwrap_or(false)
    }
}

impl ScheduleStore for InMemoryStore {
    fn lock_scope(&self, scope: &ScopeKey) -> Result<(), SchedulingError> {
        if self.inner()?.locked.insert(scope.clone()) {
            Ok(())
        } else {
            Err(SchedulingError::ScopeBusy(scope.clone()))
        }
    }

    fn unlock_scope(&self, scope: &ScopeKey) {
        // Poisoning must not leave a scope locked forever.
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.locked.remove(scope);
    }

    fn replace(&self, scope: &ScopeKey, entries: Vec<ScheduleEntry>) -> Result<(), SchedulingError> {
        self.inner()?.schedules.insert(scope.clone(), entries);
        Ok(())
    }

    fn load(&self, scope: &ScopeKey) -> Result<Vec<ScheduleEntry>, SchedulingError> {
        Ok(self.inner()?.schedules.get(scope).cloned().unwrap_or_default())
    }
}
