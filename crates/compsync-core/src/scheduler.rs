//! Coalescing Write Scheduler
//!
//! Single-flight with a trailing run: at most one run of a task is in
//! progress, and any number of requests that arrive during that run collapse
//! into exactly one follow-up run. Every request is eventually covered by a
//! run that started after it.
//!
//! Runs are spawned on the ambient tokio runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{trace, warn};

use crate::error::SyncError;

/// A unit of work the scheduler runs to completion.
#[async_trait]
pub trait CoalescedTask: Send + Sync + 'static {
    /// Label used in logs.
    fn label(&self) -> &str;

    /// Whether an earlier run left output that a disabled run must clean up.
    fn has_prior_output(&self) -> bool;

    /// Run once against the current state.
    async fn run(&self) -> Result<(), SyncError>;
}

#[derive(Debug, Default)]
struct State {
    in_flight: bool,
    requested: bool,
}

struct Inner<T> {
    task: T,
    state: Mutex<State>,
    busy: watch::Sender<bool>,
    runs: AtomicU64,
}

/// Single-flight scheduler for one task. Clones share the same state.
pub struct CoalescingScheduler<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for CoalescingScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CoalescedTask> std::fmt::Debug for CoalescingScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingScheduler")
            .field("task", &self.inner.task.label())
            .field("runs", &self.run_count())
            .finish()
    }
}

impl<T: CoalescedTask> CoalescingScheduler<T> {
    pub fn new(task: T) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                task,
                state: Mutex::new(State::default()),
                busy,
                runs: AtomicU64::new(0),
            }),
        }
    }

    pub fn task(&self) -> &T {
        &self.inner.task
    }

    /// Request a run.
    ///
    /// With `should_run == false` the request is dropped unless a run is
    /// already pending or earlier output exists to clean up.
    pub fn schedule(&self, should_run: bool) {
        let mut state = self.inner.state.lock();
        if !should_run && !state.requested && !self.inner.task.has_prior_output() {
            return;
        }
        state.requested = true;
        if state.in_flight {
            trace!(task = self.inner.task.label(), "run in flight, coalescing request");
            return;
        }
        state.in_flight = true;
        self.inner.busy.send_replace(true);
        drop(state);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.drain().await });
    }

    /// Whether a run is in progress or about to start.
    pub fn is_busy(&self) -> bool {
        *self.inner.busy.borrow()
    }

    /// Wait until no run is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.busy.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|busy| !*busy).await;
    }

    /// Number of runs started so far.
    pub fn run_count(&self) -> u64 {
        self.inner.runs.load(Ordering::Relaxed)
    }
}

impl<T: CoalescedTask> Inner<T> {
    async fn drain(&self) {
        loop {
            {
                let mut state = self.state.lock();
                if !state.requested {
                    state.in_flight = false;
                    self.busy.send_replace(false);
                    return;
                }
                state.requested = false;
            }

            self.runs.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = self.task.run().await {
                warn!(artifact = self.task.label(), error = %e, "artifact synchronization failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::{Notify, Semaphore};

    struct GatedTask {
        runs: AtomicU64,
        started: Notify,
        gate: Semaphore,
        output: AtomicBool,
        fail: AtomicBool,
    }

    impl GatedTask {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                runs: AtomicU64::new(0),
                started: Notify::new(),
                gate: Semaphore::new(0),
                output: AtomicBool::new(false),
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl CoalescedTask for Arc<GatedTask> {
        fn label(&self) -> &str {
            "gated"
        }

        fn has_prior_output(&self) -> bool {
            self.output.load(Ordering::SeqCst)
        }

        async fn run(&self) -> Result<(), SyncError> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                self.started.notify_one();
                let permit = self.gate.acquire().await.expect("gate open");
                permit.forget();
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(SyncError::invalid_input("/gated", "forced failure"));
            }
            self.output.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_burst_during_run_coalesces_into_one_follow_up() {
        let task = GatedTask::new();
        let scheduler = CoalescingScheduler::new(task.clone());

        scheduler.schedule(true);
        task.started.notified().await;
        for _ in 0..5 {
            scheduler.schedule(true);
        }
        assert!(scheduler.is_busy());

        task.gate.add_permits(1);
        scheduler.wait_idle().await;

        assert_eq!(task.runs.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.run_count(), 2);
        assert!(!scheduler.is_busy());
    }

    #[tokio::test]
    async fn test_should_not_run_without_prior_output_is_dropped() {
        let task = GatedTask::new();
        task.gate.add_permits(1);
        let scheduler = CoalescingScheduler::new(task.clone());

        scheduler.schedule(false);
        scheduler.wait_idle().await;
        assert_eq!(scheduler.run_count(), 0);

        scheduler.schedule(true);
        scheduler.wait_idle().await;
        scheduler.schedule(false);
        scheduler.wait_idle().await;
        assert_eq!(scheduler.run_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_does_not_block_later_runs() {
        let task = GatedTask::new();
        task.gate.add_permits(1);
        task.fail.store(true, Ordering::SeqCst);
        let scheduler = CoalescingScheduler::new(task.clone());

        scheduler.schedule(true);
        scheduler.wait_idle().await;
        assert!(!task.has_prior_output());

        task.fail.store(false, Ordering::SeqCst);
        scheduler.schedule(true);
        scheduler.wait_idle().await;
        assert_eq!(scheduler.run_count(), 2);
        assert!(task.has_prior_output());
    }
}
