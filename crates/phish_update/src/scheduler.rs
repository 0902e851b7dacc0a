//! Runs a given async action at a fixed interval. `start`/`stop` are
//! idempotent; the scheduler never overlaps invocations — each tick
//! awaits the action to completion before sleeping again.

use crate::clock::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

struct RunningTask {
    join: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

pub struct Scheduler<C: Clock> {
    clock: Arc<C>,
    task: Mutex<Option<RunningTask>>,
}

impl<C: Clock + 'static> Scheduler<C> {
    pub fn new(clock: Arc<C>) -> Self {
        Scheduler { clock, task: Mutex::new(None) }
    }

    /// Start running `action` every `interval`. If the scheduler is
    /// already running, the current task is cancelled and replaced.
    pub async fn start<F, Fut>(&self, interval: Duration, action: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.task.lock().await;
        if let Some(previous) = guard.take() {
            tracing::debug!(?interval, "scheduler already running; replacing task");
            let _ = previous.shutdown.send(true);
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let clock = self.clock.clone();
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = clock.sleep(interval) => {}
                }
                if *shutdown_rx.borrow() {
                    break;
                }
                tracing::debug!(?interval, "scheduler tick");
                action().await;
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        });

        *guard = Some(RunningTask { join, shutdown: shutdown_tx });
    }

    /// Stop the scheduler. A no-op if it isn't running.
    pub async fn stop(&self) {
        let mut guard = self.task.lock().await;
        if let Some(task) = guard.take() {
            let _ = task.shutdown.send(true);
            let _ = task.join.await;
        } else {
            tracing::debug!("stop called while scheduler was idle");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RealClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_without_overlap() {
        let scheduler = Scheduler::new(Arc::new(RealClock));
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();

        scheduler
            .start(Duration::from_millis(50), move || {
                let counted = counted.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        tokio::time::advance(Duration::from_millis(175)).await;
        // Let the spawned task actually run after each virtual tick.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn stop_is_a_no_op_when_idle() {
        let scheduler: Scheduler<RealClock> = Scheduler::new(Arc::new(RealClock));
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn start_while_running_replaces_the_task() {
        let scheduler = Scheduler::new(Arc::new(RealClock));
        let first_calls = Arc::new(AtomicUsize::new(0));
        let c1 = first_calls.clone();
        scheduler
            .start(Duration::from_millis(10_000), move || {
                let c1 = c1.clone();
                async move {
                    c1.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        let second_calls = Arc::new(AtomicUsize::new(0));
        let c2 = second_calls.clone();
        scheduler
            .start(Duration::from_millis(10_000), move || {
                let c2 = c2.clone();
                async move {
                    c2.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        assert!(scheduler.is_running().await);
        scheduler.stop().await;
    }
}
