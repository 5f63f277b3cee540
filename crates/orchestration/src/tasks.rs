use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

#[derive(Default)]
struct RunnerState {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Runs fire-and-forget work on the tokio runtime.
///
/// Errors and panics of spawned tasks are logged here and never reach the
/// code that spawned them.
#[derive(Clone, Default)]
pub struct TaskRunner {
    state: Arc<RunnerState>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.state.in_flight.fetch_add(1, Ordering::SeqCst);
        let state = self.state.clone();
        let handle = tokio::spawn(task);

        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => debug!(task = name, "Background task finished"),
                Ok(Err(e)) => warn!(task = name, error = %e, "Background task failed"),
                Err(e) if e.is_panic() => error!(task = name, "Background task panicked"),
                Err(e) => warn!(task = name, error = %e, "Background task cancelled"),
            }

            if state.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
                state.idle.notify_waiters();
            }
        });
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Resolve once no spawned task is running
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_idle_sees_completed_work() {
        let runner = TaskRunner::new();
        let done = Arc::new(AtomicBool::new(false));

        let flag = done.clone();
        runner.spawn("set-flag", async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, String>(())
        });

        runner.wait_idle().await;
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failures_and_panics_are_contained() {
        let runner = TaskRunner::new();

        runner.spawn("fails", async { Err::<(), _>("boom") });
        runner.spawn::<_, String>("panics", async { panic!("task blew up") });

        tokio::time::timeout(Duration::from_secs(1), runner.wait_idle())
            .await
            .unwrap();
        assert_eq!(runner.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_with_nothing_spawned() {
        TaskRunner::new().wait_idle().await;
    }
}
