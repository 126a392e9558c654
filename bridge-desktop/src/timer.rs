//! Tokio-backed timers.

use bridge_traits::timer::{TimerCallback, TimerId, TimerScheduler};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{trace, warn};

type TaskTable = Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>;

/// Each timer is a spawned task; cancelling aborts it.
///
/// Timers are spawned on the ambient runtime, falling back to the runtime
/// that was current when the scheduler was created.
pub struct TokioTimerScheduler {
    handle: Option<Handle>,
    next_id: AtomicU64,
    tasks: TaskTable,
}

impl TokioTimerScheduler {
    pub fn new() -> Self {
        Self {
            handle: Handle::try_current().ok(),
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn runtime(&self) -> Option<Handle> {
        Handle::try_current().ok().or_else(|| self.handle.clone())
    }

    fn spawn_timer<F>(&self, make_task: F) -> TimerId
    where
        F: FnOnce(TimerId, TaskTable) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>,
    {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        let Some(runtime) = self.runtime() else {
            warn!(timer = %id, "No tokio runtime available; timer will never fire");
            return id;
        };

        // Hold the table while spawning so a fast one-shot cannot remove
        // itself before it is inserted.
        let mut tasks = self.tasks.lock();
        let handle = runtime.spawn(make_task(id, Arc::clone(&self.tasks)));
        tasks.insert(id, handle);
        id
    }
}

impl Default for TokioTimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler for TokioTimerScheduler {
    fn start_interval(&self, period: Duration, callback: TimerCallback) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.spawn_timer(move |id, _tasks| {
            Box::pin(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    trace!(timer = %id, "Interval tick");
                    callback();
                }
            })
        })
    }

    fn start_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.spawn_timer(move |id, tasks| {
            Box::pin(async move {
                sleep(delay).await;
                tasks.lock().remove(&id);
                callback();
            })
        })
    }

    fn cancel(&self, id: TimerId) {
        if let Some(handle) = self.tasks.lock().remove(&id) {
            handle.abort();
        }
    }

    fn active_count(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.len()
    }
}

impl Drop for TokioTimerScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}
