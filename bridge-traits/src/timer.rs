//! Host timers.
//!
//! Some media SDKs never push playback position, so the player polls them on
//! an interval while playing. Timers are owned resources: every id handed out
//! by [`TimerScheduler`] must eventually be cancelled or fire (one-shot).
//!
//! [`ManualTimerScheduler`] is a deterministic implementation driven by
//! [`ManualTimerScheduler::advance`], used by tests and headless hosts.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::platform::PlatformSendSync;

/// Opaque timer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

#[cfg(target_arch = "wasm32")]
pub type TimerCallback = Arc<dyn Fn()>;

pub trait TimerScheduler: PlatformSendSync {
    /// Invoke `callback` every `period` until cancelled.
    fn start_interval(&self, period: Duration, callback: TimerCallback) -> TimerId;

    /// Invoke `callback` once after `delay` unless cancelled first.
    fn start_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a timer. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);

    /// Number of timers that can still fire.
    fn active_count(&self) -> usize;
}

struct ManualTimer {
    due: Duration,
    period: Option<Duration>,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerId, ManualTimer>,
}

/// Virtual-time scheduler. Nothing fires until [`advance`](Self::advance) is
/// called.
#[derive(Default)]
pub struct ManualTimerScheduler {
    state: Mutex<ManualState>,
}

impl ManualTimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.state.lock().timers.contains_key(&id)
    }

    /// Move virtual time forward, firing every timer that comes due in order.
    ///
    /// Callbacks run without the scheduler lock held, so they may start or
    /// cancel timers. Returns the number of callbacks invoked.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now + by;
        let mut fired = 0;

        loop {
            let callback = {
                let mut state = self.state.lock();
                let next = state
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(id, timer)| (timer.due, **id))
                    .map(|(id, _)| *id);

                let Some(id) = next else {
                    state.now = target;
                    break;
                };

                let due = state.timers[&id].due;
                state.now = due;

                let timer = state.timers.get_mut(&id).map(|timer| {
                    let callback = Arc::clone(&timer.callback);
                    match timer.period {
                        Some(period) => {
                            timer.due = due + period;
                            (callback, false)
                        }
                        None => (callback, true),
                    }
                });

                match timer {
                    Some((callback, one_shot)) => {
                        if one_shot {
                            state.timers.remove(&id);
                        }
                        callback
                    }
                    None => continue,
                }
            };

            callback();
            fired += 1;
        }

        fired
    }

    fn schedule(&self, delay: Duration, period: Option<Duration>, callback: TimerCallback) -> TimerId {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        let due = state.now + delay;
        state.timers.insert(
            id,
            ManualTimer {
                due,
                period,
                callback,
            },
        );
        id
    }
}

impl TimerScheduler for ManualTimerScheduler {
    fn start_interval(&self, period: Duration, callback: TimerCallback) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.schedule(period, Some(period), callback)
    }

    fn start_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.schedule(delay, None, callback)
    }

    fn cancel(&self, id: TimerId) {
        self.state.lock().timers.remove(&id);
    }

    fn active_count(&self) -> usize {
        self.state.lock().timers.len()
    }
}

impl fmt::Debug for ManualTimerScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimerScheduler")
            .field("now", &state.now)
            .field("active", &state.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, TimerCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: TimerCallback = Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_interval_fires_per_period() {
        let scheduler = ManualTimerScheduler::new();
        let (count, callback) = counter();

        scheduler.start_interval(Duration::from_millis(25), callback);
        assert_eq!(scheduler.advance(Duration::from_millis(100)), 4);
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_timeout_fires_once_and_is_released() {
        let scheduler = ManualTimerScheduler::new();
        let (count, callback) = counter();

        let id = scheduler.start_timeout(Duration::from_secs(1), callback);
        assert!(scheduler.is_active(id));

        scheduler.advance(Duration::from_secs(5));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_active(id));
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let scheduler = ManualTimerScheduler::new();
        let (count, callback) = counter();

        let id = scheduler.start_interval(Duration::from_millis(25), callback);
        scheduler.advance(Duration::from_millis(30));
        scheduler.cancel(id);
        scheduler.advance(Duration::from_millis(100));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_callback_may_cancel_itself() {
        let scheduler = Arc::new(ManualTimerScheduler::new());
        let slot: Arc<Mutex<Option<TimerId>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&scheduler);
        let slot_clone = Arc::clone(&slot);
        let id = scheduler.start_interval(
            Duration::from_millis(10),
            Arc::new(move || {
                if let (Some(scheduler), Some(id)) = (weak.upgrade(), *slot_clone.lock()) {
                    scheduler.cancel(id);
                }
            }),
        );
        *slot.lock() = Some(id);

        assert_eq!(scheduler.advance(Duration::from_millis(100)), 1);
        assert_eq!(scheduler.active_count(), 0);
    }
}
