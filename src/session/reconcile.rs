// ABOUTME: Cancellable periodic task used to reconcile state with an external observer.
// ABOUTME: Ticks on a tokio interval stream until its cancellation token fires or it is dropped.

use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;

/// A background task that runs `action` once per period.
///
/// The first tick fires one full period after spawning. Dropping the task
/// cancels it; `shutdown` additionally waits for the loop to exit.
pub struct PeriodicTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn on the current tokio runtime.
    pub fn spawn<F>(name: &'static str, period: Duration, mut action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = IntervalStream::new(interval_at(Instant::now() + period, period));
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    tick = ticks.next() => {
                        if tick.is_none() {
                            break;
                        }
                        action();
                    }
                }
            }
            tracing::debug!(task = name, "periodic task stopped");
        });
        tracing::debug!(task = name, period_ms = period.as_millis() as u64, "periodic task started");
        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop future ticks without waiting for the loop to exit.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait until the loop has exited.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(task = self.name(), error = %e, "periodic task ended abnormally");
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
