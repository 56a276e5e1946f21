//! Producer side of the palace work queue

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What happened to an enqueue request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    /// The job was added to the queue
    Queued,
    /// The same task is already waiting; nothing was added
    Coalesced,
    /// The queue is at capacity; the job was dropped
    Full,
    /// The workers have stopped; the job was dropped
    Closed,
}

/// Cloneable handle for submitting palace jobs
#[derive(Clone)]
pub struct PalaceQueue {
    tx: mpsc::Sender<i64>,
    /// Ids sent but not yet picked up by a worker
    pending: Arc<Mutex<HashSet<i64>>>,
}

impl PalaceQueue {
    pub(super) fn new(tx: mpsc::Sender<i64>, pending: Arc<Mutex<HashSet<i64>>>) -> Self {
        Self { tx, pending }
    }

    /// Submit a render for `task_id` without waiting
    pub fn enqueue(&self, task_id: i64) -> EnqueueResult {
        debug!(task_id, "PalaceQueue::enqueue: called");
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if pending.contains(&task_id) {
            debug!(task_id, "PalaceQueue::enqueue: already pending, coalesced");
            return EnqueueResult::Coalesced;
        }

        match self.tx.try_send(task_id) {
            Ok(()) => {
                pending.insert(task_id);
                EnqueueResult::Queued
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(task_id, "Palace queue full, dropping job");
                EnqueueResult::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(task_id, "Palace workers stopped, dropping job");
                EnqueueResult::Closed
            }
        }
    }

    /// Number of jobs waiting for a worker
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}
