//! Per-record async locks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// State guarded by a record lock.
///
/// Tracks the deferred cleanup checks still owed to containers inside the
/// record, keyed by nested path.
#[derive(Debug)]
pub(crate) struct RecordState {
    pending: HashMap<Vec<String>, u64>,
    counter: Arc<AtomicU64>,
}

impl RecordState {
    /// Records a write at `nested`.
    ///
    /// Pending checks at or below the written path are cancelled; checks
    /// elsewhere in the record are kept.
    pub(crate) fn wrote(&mut self, nested: &[String]) {
        self.pending.retain(|path, _| !path.starts_with(nested));
    }

    /// Registers a check of the container at `nested` and returns its
    /// token. A newer registration for the same path supersedes older ones.
    pub(crate) fn expect_check(&mut self, nested: &[String]) -> u64 {
        let token = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        self.pending.insert(nested.to_vec(), token);
        token
    }

    /// Claims the check registered under `token`.
    ///
    /// Returns false if it was cancelled or superseded.
    pub(crate) fn take_check(&mut self, nested: &[String], token: u64) -> bool {
        if self.pending.get(nested) == Some(&token) {
            self.pending.remove(nested);
            true
        } else {
            false
        }
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// One async mutex per root key.
///
/// Mutations of the same record are serialized; different records
/// proceed independently. Entries nobody holds and with no pending checks
/// are pruned as new locks are handed out.
#[derive(Debug, Default)]
pub(crate) struct RecordLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<RecordState>>>>,
    counter: Arc<AtomicU64>,
}

impl RecordLocks {
    const PRUNE_THRESHOLD: usize = 1024;

    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `root`.
    pub(crate) async fn lock(&self, root: &str) -> OwnedMutexGuard<RecordState> {
        let lock = {
            let mut locks = self.locks.lock();
            if locks.len() >= Self::PRUNE_THRESHOLD {
                locks.retain(|_, lock| {
                    let idle = lock.try_lock().is_ok_and(|state| state.is_idle());
                    Arc::strong_count(lock) > 1 || !idle
                });
            }
            let lock = locks.entry(root.to_string()).or_insert_with(|| {
                Arc::new(AsyncMutex::new(RecordState {
                    pending: HashMap::new(),
                    counter: Arc::clone(&self.counter),
                }))
            });
            Arc::clone(lock)
        };
        lock.lock_owned().await
    }

    /// Number of tracked records.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[tokio::test]
    async fn same_root_is_serialized() {
        let locks = Arc::new(RecordLocks::new());
        let guard = locks.lock("a").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let mut state = locks.lock("a").await;
                state.expect_check(&path("b"))
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        assert_eq!(waiter.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn different_roots_are_independent() {
        let locks = RecordLocks::new();
        let _a = locks.lock("a").await;
        let _b = locks.lock("b").await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn sibling_writes_keep_pending_checks() {
        let locks = RecordLocks::new();
        let mut state = locks.lock("a").await;
        let token = state.expect_check(&path("b"));

        state.wrote(&path("keep"));
        state.wrote(&path("b.c"));
        assert!(state.take_check(&path("b"), token));
        assert!(!state.take_check(&path("b"), token));
    }

    #[tokio::test]
    async fn writes_at_or_above_cancel_checks() {
        let locks = RecordLocks::new();
        let mut state = locks.lock("a").await;

        let token = state.expect_check(&path("b"));
        state.wrote(&path("b"));
        assert!(!state.take_check(&path("b"), token));

        let token = state.expect_check(&path("b.c"));
        state.wrote(&[]);
        assert!(!state.take_check(&path("b.c"), token));
    }

    #[tokio::test]
    async fn newer_check_supersedes_older() {
        let locks = RecordLocks::new();
        let mut state = locks.lock("a").await;
        let old = state.expect_check(&path("b"));
        let new = state.expect_check(&path("b"));
        assert!(!state.take_check(&path("b"), old));
        assert!(state.take_check(&path("b"), new));
    }

    #[tokio::test]
    async fn pruning_keeps_records_with_pending_checks() {
        let locks = RecordLocks::new();
        let token = locks.lock("pending").await.expect_check(&path("b"));
        for i in 0..RecordLocks::PRUNE_THRESHOLD {
            drop(locks.lock(&format!("idle_{i}")).await);
        }
        drop(locks.lock("trigger").await);

        assert!(locks.len() < RecordLocks::PRUNE_THRESHOLD);
        assert!(locks.lock("pending").await.take_check(&path("b"), token));
    }
}
