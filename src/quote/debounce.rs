use futures::future::{AbortHandle, Abortable};
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;

/// A cancellable trailing-edge timer: rapid calls coalesce so only the last
/// scheduled future runs after the interval elapses. Used to keep continuous
/// amount input from issuing a quote request per keystroke.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<AbortHandle>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `task` to run after the debounce interval, aborting any
    /// previously scheduled task whether it is still waiting or already
    /// running.
    pub fn call<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            let _ = Abortable::new(
                async move {
                    tokio::time::sleep(delay).await;
                    task.await;
                },
                registration,
            )
            .await;
        });
    }

    /// Cancels the pending task, if any. Idempotent.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }
}
