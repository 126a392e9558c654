//! Reactive state cells.
//!
//! A [`StateCell`] holds one shared record (navigation state, playback state)
//! and lets any number of readers observe it. Each [`StateCell::update`] is a
//! single atomic change: readers see the record before or after the closure
//! ran, never halfway through.

use std::fmt;
use tokio::sync::watch;

pub use tokio::sync::watch::Receiver as StateReceiver;

pub struct StateCell<T> {
    sender: watch::Sender<T>,
}

impl<T> StateCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Read a projection without cloning the whole record.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.sender.borrow())
    }

    /// Subscribe to changes. The receiver starts with the current value
    /// marked as seen.
    pub fn subscribe(&self) -> StateReceiver<T> {
        self.sender.subscribe()
    }

    /// Mutate in place and notify subscribers.
    pub fn update<R>(&self, modify: impl FnOnce(&mut T) -> R) -> R {
        let mut result = None;
        self.sender.send_modify(|state| {
            result = Some(modify(state));
        });
        match result {
            Some(result) => result,
            None => unreachable!("send_modify always runs its closure"),
        }
    }

    /// Replace the whole value.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }
}

impl<T> Default for StateCell<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for StateCell<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("value", &*self.sender.borrow())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pair {
        left: u32,
        right: u32,
    }

    #[test]
    fn test_update_returns_closure_result() {
        let cell = StateCell::new(Pair::default());
        let sum = cell.update(|pair| {
            pair.left = 2;
            pair.right = 3;
            pair.left + pair.right
        });

        assert_eq!(sum, 5);
        assert_eq!(cell.get(), Pair { left: 2, right: 3 });
        assert_eq!(cell.with(|pair| pair.right), 3);
    }

    #[tokio::test]
    async fn test_subscribers_see_each_update_whole() {
        let cell = StateCell::new(Pair::default());
        let mut rx = cell.subscribe();

        cell.update(|pair| {
            pair.left = 1;
            pair.right = 1;
        });

        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen, Pair { left: 1, right: 1 });
    }

    #[test]
    fn test_update_without_subscribers() {
        let cell: StateCell<Pair> = StateCell::default();
        cell.set(Pair { left: 9, right: 0 });
        assert_eq!(cell.get().left, 9);
    }
}
