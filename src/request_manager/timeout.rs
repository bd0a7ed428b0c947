// src/request_manager/timeout.rs

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::id_allocator::RequestId;

/// Ownership of one armed deadline.
///
/// Dropping the handle leaves the timer running; only `disarm` stops it.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stops the timer. A no-op if it already fired.
    pub fn disarm(self) {
        self.task.abort();
    }
}

/// Arms one-shot deadlines on the tokio timer.
///
/// Must be used from inside a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl TimeoutScheduler {
    pub fn new() -> Self {
        TimeoutScheduler
    }

    /// Calls `on_fire(id)` once after `duration` unless the returned handle is
    /// disarmed first.
    pub fn arm<F>(&self, id: RequestId, duration: Duration, on_fire: F) -> TimerHandle
    where
        F: FnOnce(RequestId) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(duration).await;
            on_fire(id);
        });
        TimerHandle { task }
    }
}
