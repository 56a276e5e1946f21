//! Worker pool consuming the palace queue

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::PalaceQueue;
use crate::palace::{PalaceError, PalaceGenerator, PalaceOutcome};

/// Something that renders a task's palace
#[async_trait]
pub trait PalaceRenderer: Send + Sync {
    async fn render(&self, task_id: i64) -> Result<PalaceOutcome, PalaceError>;
}

#[async_trait]
impl PalaceRenderer for PalaceGenerator {
    async fn render(&self, task_id: i64) -> Result<PalaceOutcome, PalaceError> {
        self.generate_palace_image(task_id).await
    }
}

type TaskLocks = Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>;

/// Fixed pool of palace workers
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `count` workers behind a queue holding up to `capacity` jobs
    pub fn start(renderer: Arc<dyn PalaceRenderer>, count: usize, capacity: usize) -> (PalaceQueue, Self) {
        let count = count.max(1);
        let capacity = capacity.max(1);
        debug!(count, capacity, "WorkerPool::start: called");

        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(AsyncMutex::new(rx));
        let pending: Arc<Mutex<HashSet<i64>>> = Arc::new(Mutex::new(HashSet::new()));
        let locks: TaskLocks = Arc::new(Mutex::new(HashMap::new()));

        let handles = (0..count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    renderer.clone(),
                    rx.clone(),
                    pending.clone(),
                    locks.clone(),
                ))
            })
            .collect();

        info!(count, capacity, "Palace workers started");
        (PalaceQueue::new(tx, pending), Self { handles })
    }

    /// Wait for every worker to exit
    ///
    /// Workers drain the queue and stop once all `PalaceQueue` handles are dropped.
    pub async fn join(self) {
        debug!(workers = self.handles.len(), "WorkerPool::join: called");
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Palace worker panicked");
            }
        }
        info!("Palace workers stopped");
    }
}

/// Per-task lock, created on first use
fn task_lock(locks: &TaskLocks, task_id: i64) -> Arc<AsyncMutex<()>> {
    let mut locks = match locks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    locks.entry(task_id).or_default().clone()
}

/// Drop the per-task lock once no other worker holds or waits on it
fn release_task_lock(locks: &TaskLocks, task_id: i64, lock: Arc<AsyncMutex<()>>) {
    let mut locks = match locks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    // One reference in the map plus ours
    if Arc::strong_count(&lock) == 2 {
        locks.remove(&task_id);
    }
}

async fn worker_loop(
    worker_id: usize,
    renderer: Arc<dyn PalaceRenderer>,
    rx: Arc<AsyncMutex<mpsc::Receiver<i64>>>,
    pending: Arc<Mutex<HashSet<i64>>>,
    locks: TaskLocks,
) {
    debug!(worker_id, "worker_loop: started");

    loop {
        let next = rx.lock().await.recv().await;
        let Some(task_id) = next else {
            break;
        };

        // From here on a new enqueue for this task must queue a fresh run
        if let Ok(mut pending) = pending.lock() {
            pending.remove(&task_id);
        }

        let lock = task_lock(&locks, task_id);
        {
            let _guard = lock.lock().await;
            debug!(worker_id, task_id, "worker_loop: rendering");
            match renderer.render(task_id).await {
                Ok(PalaceOutcome::Rendered { completed, total, path }) => {
                    info!(worker_id, task_id, completed, total, %path, "Palace job done");
                }
                Ok(PalaceOutcome::Skipped) => {
                    warn!(worker_id, task_id, "Palace job skipped");
                }
                Err(e) => {
                    error!(worker_id, task_id, error = %e, "Palace job failed");
                }
            }
        }
        release_task_lock(&locks, task_id, lock);
    }

    debug!(worker_id, "worker_loop: queue closed, exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::EnqueueResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Renderer that blocks each run until a permit is released
    struct GatedRenderer {
        gate: Semaphore,
        started: AtomicUsize,
        finished: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        seen: Mutex<Vec<i64>>,
    }

    impl GatedRenderer {
        fn new(permits: usize) -> Arc<Self> {
            Arc::new(Self {
                gate: Semaphore::new(permits),
                started: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PalaceRenderer for GatedRenderer {
        async fn render(&self, task_id: i64) -> Result<PalaceOutcome, PalaceError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let permit = self.gate.acquire().await.unwrap();
            permit.forget();

            self.seen.lock().unwrap().push(task_id);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(PalaceOutcome::Skipped)
        }
    }

    async fn wait_for(counter: &AtomicUsize, value: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.load(Ordering::SeqCst) < value {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_jobs_run() {
        let renderer = GatedRenderer::new(100);
        let (queue, pool) = WorkerPool::start(renderer.clone(), 2, 8);

        assert_eq!(queue.enqueue(1), EnqueueResult::Queued);
        assert_eq!(queue.enqueue(2), EnqueueResult::Queued);
        wait_for(&renderer.finished, 2).await;

        let mut seen = renderer.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![1, 2]);

        drop(queue);
        pool.join().await;
    }

    #[tokio::test]
    async fn test_pending_ids_coalesce() {
        let renderer = GatedRenderer::new(0);
        let (queue, pool) = WorkerPool::start(renderer.clone(), 1, 8);

        assert_eq!(queue.enqueue(1), EnqueueResult::Queued);
        wait_for(&renderer.started, 1).await;

        // Task 1 is running, task 2 waits behind it
        assert_eq!(queue.enqueue(2), EnqueueResult::Queued);
        assert_eq!(queue.enqueue(2), EnqueueResult::Coalesced);
        assert_eq!(queue.pending_count(), 1);

        renderer.gate.add_permits(10);
        wait_for(&renderer.finished, 2).await;
        assert_eq!(renderer.started.load(Ordering::SeqCst), 2);

        drop(queue);
        pool.join().await;
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let renderer = GatedRenderer::new(0);
        let (queue, pool) = WorkerPool::start(renderer.clone(), 1, 1);

        assert_eq!(queue.enqueue(1), EnqueueResult::Queued);
        wait_for(&renderer.started, 1).await;
        assert_eq!(queue.enqueue(2), EnqueueResult::Queued);
        assert_eq!(queue.enqueue(3), EnqueueResult::Full);

        renderer.gate.add_permits(10);
        wait_for(&renderer.finished, 2).await;
        drop(queue);
        pool.join().await;
        assert!(!renderer.seen.lock().unwrap().contains(&3));
    }

    #[tokio::test]
    async fn test_same_task_runs_serialized() {
        let renderer = GatedRenderer::new(0);
        let (queue, pool) = WorkerPool::start(renderer.clone(), 2, 8);

        assert_eq!(queue.enqueue(7), EnqueueResult::Queued);
        wait_for(&renderer.started, 1).await;

        // No longer pending once a worker took it, so this queues a second run
        assert_eq!(queue.enqueue(7), EnqueueResult::Queued);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(renderer.started.load(Ordering::SeqCst), 1);

        renderer.gate.add_permits(10);
        wait_for(&renderer.finished, 2).await;
        assert_eq!(renderer.max_in_flight.load(Ordering::SeqCst), 1);

        drop(queue);
        pool.join().await;
    }

    #[tokio::test]
    async fn test_join_drains_queue() {
        let renderer = GatedRenderer::new(100);
        let (queue, pool) = WorkerPool::start(renderer.clone(), 1, 8);
        for id in 1..=4 {
            assert_eq!(queue.enqueue(id), EnqueueResult::Queued);
        }
        drop(queue);
        pool.join().await;
        assert_eq!(renderer.finished.load(Ordering::SeqCst), 4);
    }
}
