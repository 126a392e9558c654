//! Notification sink that writes to `tracing` and keeps a short history.

use bridge_traits::notification::{Notification, NotificationSink};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::{info, warn};

const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug)]
pub struct TracingNotificationSink {
    recent: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl TracingNotificationSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Most recent notifications, oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.recent.lock().iter().cloned().collect()
    }
}

impl Default for TracingNotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for TracingNotificationSink {
    fn record(&self, notification: Notification) {
        if notification.is_error {
            warn!(id = %notification.id, status = ?notification.status, "{}", notification.message);
        } else {
            info!(id = %notification.id, "{}", notification.message);
        }

        let mut recent = self.recent.lock();
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(notification);
    }
}
