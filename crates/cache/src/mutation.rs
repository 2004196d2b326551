//! In-flight mutation tracking.

use std::collections::HashMap;
use std::sync::Mutex;

use pocketnotes_events::{CacheEventKind, EventBus, MutationKind};

/// Counts running mutations per kind.
#[derive(Default)]
pub(crate) struct MutationTracker {
    running: Mutex<HashMap<MutationKind, usize>>,
}

impl MutationTracker {
    /// Register a mutation. The count drops again when the guard does.
    pub fn begin<'a>(&'a self, bus: &'a EventBus, kind: MutationKind) -> MutationGuard<'a> {
        *self.lock().entry(kind).or_insert(0) += 1;
        bus.publish(CacheEventKind::MutationStarted { kind });
        tracing::debug!(%kind, "Mutation started");
        MutationGuard {
            tracker: self,
            bus,
            kind,
            ok: false,
        }
    }

    pub fn count(&self, kind: MutationKind) -> usize {
        self.lock().get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.lock().values().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MutationKind, usize>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps a mutation counted until it settles or its future is dropped.
///
/// A guard dropped without [`finish`](MutationGuard::finish) settles as
/// failed.
pub(crate) struct MutationGuard<'a> {
    tracker: &'a MutationTracker,
    bus: &'a EventBus,
    kind: MutationKind,
    ok: bool,
}

impl MutationGuard<'_> {
    pub fn finish<T, E>(mut self, result: Result<T, E>) -> Result<T, E> {
        self.ok = result.is_ok();
        result
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        if let Some(count) = self.tracker.lock().get_mut(&self.kind) {
            *count = count.saturating_sub(1);
        }
        self.bus.publish(CacheEventKind::MutationSettled {
            kind: self.kind,
            ok: self.ok,
        });
        tracing::debug!(kind = %self.kind, ok = self.ok, "Mutation settled");
    }
}
