//! Bounded worker pool for model-call operations.
//!
//! A thin wrapper over `tokio::spawn` gated by a semaphore: at most
//! `capacity` scheduled operations run concurrently, the rest queue on the
//! semaphore in submission order. Statement capture and context mutation
//! never go through the pool; only scheduled calls do.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::debug;

/// Default number of concurrent workers when settings do not say otherwise.
pub const DEFAULT_WORKERS: usize = 8;

/// A bounded pool of parallel execution workers.
///
/// Cloning is cheap and all clones share the same permit budget.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Create a pool with the given capacity (clamped to at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Total number of workers.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Workers currently idle.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Acquire a worker permit, waiting while the pool is saturated.
    ///
    /// For tasks spawned outside the pool that want to bound only their
    /// hot section: waiting on other deferred values must not hold a
    /// worker slot. The permit releases on drop.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("worker pool semaphore closed")
    }

    /// Spawn `work` on the pool.
    ///
    /// The task is submitted immediately; it waits for a permit before the
    /// future starts executing and releases it when the future completes.
    /// The task runs to completion even if the returned handle is dropped.
    pub fn spawn<F>(&self, work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .expect("worker pool semaphore closed");
            debug!("worker permit acquired");
            work.await
        })
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(WorkerPool::new(0).capacity(), 1);
        assert_eq!(WorkerPool::new(4).capacity(), 4);
    }

    #[tokio::test]
    async fn spawned_work_runs() {
        let pool = WorkerPool::new(2);
        let out = pool.spawn(async { 41 + 1 }).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn acquired_permit_releases_on_drop() {
        let pool = WorkerPool::new(1);
        let permit = pool.acquire().await;
        assert_eq!(pool.available(), 0);
        drop(permit);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn dropped_handle_still_completes() {
        let pool = WorkerPool::new(1);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        drop(pool.spawn(async move {
            let _ = c.fetch_add(1, Ordering::SeqCst);
        }));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permits_bound_concurrency() {
        let pool = WorkerPool::new(2);
        let peak = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let peak = Arc::clone(&peak);
            let live = Arc::clone(&live);
            handles.push(pool.spawn(async move {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                let _ = live.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
