//! Deferred cascade cleanup.
//!
//! A nested delete can leave its parent container empty. In deferred mode
//! the parent check is queued here and run by a per-store worker task
//! once its delay has elapsed. Each check carries a token registered with
//! the record's lock state; a later write at or above the checked
//! container cancels it, while writes elsewhere in the record do not.

use crate::store::StoreInner;
use nestdb_codec::KeyPath;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

/// A queued ancestor check.
#[derive(Debug, Clone)]
pub(crate) struct CleanupTask {
    /// Container to check.
    pub(crate) parent: KeyPath,
    /// Token registered for the check in the record's lock state.
    pub(crate) token: u64,
    /// Earliest time the check may run.
    pub(crate) due: Instant,
}

/// Sending half of the cleanup queue.
#[derive(Debug)]
pub(crate) struct CleanupQueue {
    sender: mpsc::UnboundedSender<CleanupTask>,
    delay: Duration,
}

impl CleanupQueue {
    pub(crate) fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<CleanupTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, delay }, receiver)
    }

    /// Queues a check of `parent` to run after the delay.
    pub(crate) fn schedule(&self, parent: KeyPath, token: u64) {
        trace!(path = %parent, token, "cleanup check queued");
        let task = CleanupTask {
            parent,
            token,
            due: Instant::now() + self.delay,
        };
        if self.sender.send(task).is_err() {
            debug!("cleanup worker stopped; check dropped");
        }
    }
}

/// Spawns the worker draining `receiver`.
///
/// The worker holds only a weak reference to the store, so it exits once
/// the store is dropped. Tasks all share one delay and therefore arrive in
/// due order.
pub(crate) fn spawn_worker(
    store: Weak<StoreInner>,
    mut receiver: mpsc::UnboundedReceiver<CleanupTask>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = receiver.recv().await {
            tokio::time::sleep_until(task.due).await;
            let Some(store) = store.upgrade() else {
                break;
            };
            store.run_cleanup(task).await;
        }
        debug!("cleanup worker finished");
    })
}
