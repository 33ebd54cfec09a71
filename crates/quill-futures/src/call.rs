//! A single scheduled asynchronous operation.
//!
//! [`CallFuture`] is the leaf of the deferred value graph: it wraps work
//! submitted to the [`WorkerPool`] at construction time. The caller is never
//! blocked by creation; forcing happens through [`CallFuture::resolve`],
//! which memoizes the outcome so the work runs at most once regardless of
//! how many consumers force it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{FutureError, Result};
use crate::pool::WorkerPool;

/// Life-cycle of a scheduled call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallState {
    /// Submitted, not yet polled by the runtime.
    Pending,
    /// A worker is executing the operation.
    Running,
    /// Completed successfully; result memoized.
    Resolved,
    /// Completed with an error (including timeout); error memoized.
    Failed,
}

struct CallInner {
    label: String,
    state: Mutex<CallState>,
    handle: Mutex<Option<JoinHandle<Result<String>>>>,
    cell: OnceCell<Result<String>>,
}

impl CallInner {
    fn set_state(&self, next: CallState) {
        *self.state.lock() = next;
    }
}

/// Handle to a scheduled asynchronous operation producing a string.
///
/// Cheap to clone; all clones share the same memoized result.
#[derive(Clone)]
pub struct CallFuture {
    inner: Arc<CallInner>,
}

impl CallFuture {
    /// Schedule `work` on `pool` and return immediately.
    ///
    /// If `timeout` is set and expires before the work completes, the call
    /// transitions to [`CallState::Failed`] with [`FutureError::Timeout`].
    /// Sibling calls are unaffected. The work itself is not interrupted
    /// observably before the timeout; there is no cancellation.
    pub fn spawn<F>(
        pool: &WorkerPool,
        label: impl Into<String>,
        timeout: Option<Duration>,
        work: F,
    ) -> Self
    where
        F: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        let (inner, task) = Self::prepare(label.into(), timeout, work);
        let handle = pool.spawn(task);
        *inner.handle.lock() = Some(handle);
        Self { inner }
    }

    /// Schedule `work` directly on the runtime, bypassing pool gating.
    ///
    /// For work that bounds its own hot section with an explicit
    /// [`WorkerPool::acquire`] permit, so that awaiting other deferred
    /// values does not hold a worker slot. Timeout semantics match
    /// [`CallFuture::spawn`].
    pub fn spawn_unbounded<F>(label: impl Into<String>, timeout: Option<Duration>, work: F) -> Self
    where
        F: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        let (inner, task) = Self::prepare(label.into(), timeout, work);
        let handle = tokio::spawn(task);
        *inner.handle.lock() = Some(handle);
        Self { inner }
    }

    fn prepare<F>(
        label: String,
        timeout: Option<Duration>,
        work: F,
    ) -> (
        Arc<CallInner>,
        impl std::future::Future<Output = Result<String>> + Send + 'static,
    )
    where
        F: std::future::Future<Output = Result<String>> + Send + 'static,
    {
        let inner = Arc::new(CallInner {
            label,
            state: Mutex::new(CallState::Pending),
            handle: Mutex::new(None),
            cell: OnceCell::new(),
        });

        let task_inner = Arc::clone(&inner);
        let task = async move {
            task_inner.set_state(CallState::Running);
            debug!(label = %task_inner.label, "call running");
            let out = match timeout {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(res) => res,
                    Err(_) => Err(FutureError::Timeout {
                        label: task_inner.label.clone(),
                        timeout: limit,
                    }),
                },
                None => work.await,
            };
            match &out {
                Ok(_) => task_inner.set_state(CallState::Resolved),
                Err(e) => {
                    warn!(label = %task_inner.label, error = %e, "call failed");
                    task_inner.set_state(CallState::Failed);
                }
            }
            out
        };
        (inner, task)
    }

    /// Wrap an already-known value without touching the pool.
    #[must_use]
    pub fn ready(label: impl Into<String>, value: impl Into<String>) -> Self {
        let inner = Arc::new(CallInner {
            label: label.into(),
            state: Mutex::new(CallState::Resolved),
            handle: Mutex::new(None),
            cell: OnceCell::new(),
        });
        // The cell is empty, set cannot fail.
        let _ = inner.cell.set(Ok(value.into()));
        Self { inner }
    }

    /// The label describing this call.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Current life-cycle state.
    #[must_use]
    pub fn state(&self) -> CallState {
        *self.inner.state.lock()
    }

    /// Whether the call has completed (successfully or not).
    #[must_use]
    pub fn done(&self) -> bool {
        matches!(self.state(), CallState::Resolved | CallState::Failed)
    }

    /// Force the call, waiting for completion if necessary.
    ///
    /// The first forcing awaits the worker task; every later forcing
    /// (and every clone) returns the memoized outcome without re-running
    /// the work.
    pub async fn resolve(&self) -> Result<String> {
        self.inner
            .cell
            .get_or_init(|| async {
                let handle = self.inner.handle.lock().take();
                match handle {
                    Some(h) => match h.await {
                        Ok(res) => res,
                        Err(e) => Err(FutureError::Worker {
                            label: self.inner.label.clone(),
                            message: e.to_string(),
                        }),
                    },
                    None => Err(FutureError::Worker {
                        label: self.inner.label.clone(),
                        message: "task handle missing".into(),
                    }),
                }
            })
            .await
            .clone()
    }
}

impl std::fmt::Debug for CallFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallFuture")
            .field("label", &self.inner.label)
            .field("state", &self.state())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pool() -> WorkerPool {
        WorkerPool::new(4)
    }

    #[tokio::test]
    async fn resolves_to_value() {
        let c = CallFuture::spawn(&pool(), "c1", None, async { Ok("hello".to_string()) });
        assert_eq!(c.resolve().await.unwrap(), "hello");
        assert_eq!(c.state(), CallState::Resolved);
    }

    #[tokio::test]
    async fn ready_value_skips_pool() {
        let c = CallFuture::ready("lit", "fixed");
        assert_eq!(c.state(), CallState::Resolved);
        assert_eq!(c.resolve().await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn unbounded_spawn_runs_without_a_permit() {
        let p = WorkerPool::new(1);
        let _held = p.acquire().await;
        // The pool is fully occupied; an unbounded call still runs.
        let c = CallFuture::spawn_unbounded("free", None, async { Ok("ran".to_string()) });
        assert_eq!(c.resolve().await.unwrap(), "ran");
    }

    #[tokio::test]
    async fn work_runs_once_across_forces_and_clones() {
        let counter = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&counter);
        let c = CallFuture::spawn(&pool(), "once", None, async move {
            let _ = n.fetch_add(1, Ordering::SeqCst);
            Ok("v".to_string())
        });
        let c2 = c.clone();
        assert_eq!(c.resolve().await.unwrap(), "v");
        assert_eq!(c2.resolve().await.unwrap(), "v");
        assert_eq!(c.resolve().await.unwrap(), "v");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_memoized() {
        let c = CallFuture::spawn(&pool(), "bad", None, async {
            Err(FutureError::call_failed("bad", "boom"))
        });
        let first = c.resolve().await.unwrap_err();
        let second = c.resolve().await.unwrap_err();
        assert_eq!(first, second);
        assert_eq!(c.state(), CallState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_the_call() {
        let c = CallFuture::spawn(
            &pool(),
            "slow",
            Some(Duration::from_millis(10)),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("late".to_string())
            },
        );
        let err = c.resolve().await.unwrap_err();
        assert!(matches!(err, FutureError::Timeout { .. }));
        assert_eq!(c.state(), CallState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_does_not_affect_siblings() {
        let p = pool();
        let slow = CallFuture::spawn(&p, "slow", Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        });
        let fine = CallFuture::spawn(&p, "fine", Some(Duration::from_secs(60)), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok("on time".to_string())
        });
        assert!(slow.resolve().await.is_err());
        assert_eq!(fine.resolve().await.unwrap(), "on time");
    }

    #[tokio::test]
    async fn unforced_work_still_completes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&counter);
        let c = CallFuture::spawn(&pool(), "fire", None, async move {
            let _ = n.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        });
        // Never force `c`; give the worker a moment.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(c.done());
    }
}
