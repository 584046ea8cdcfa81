//! Scheduler backed by a tokio runtime.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::ports::scheduler::{Scheduler, Task};

/// Spawns each task onto a tokio runtime.
///
/// A zero delay still yields once, so the task runs on a later turn than
/// the code that scheduled it.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Schedules onto the runtime behind `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedules onto the runtime the caller is running in, if any.
    #[must_use]
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn call_later(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn task_does_not_run_inline() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let (tx, rx) = tokio::sync::oneshot::channel();
        scheduler.call_later(
            Duration::ZERO,
            Box::new(move || {
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(());
            }),
        );
        assert!(!ran.load(Ordering::SeqCst));
        rx.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn no_runtime_means_no_scheduler() {
        assert!(TokioScheduler::try_current().is_none());
    }
}
