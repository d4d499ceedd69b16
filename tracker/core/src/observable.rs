//! Observable State Cells
//!
//! Controllers publish their state through [`StateCell`]s. A cell has one
//! writer (the owning controller) and any number of readers. New
//! subscribers see the latest value immediately, then every later change.
//!
//! Built on `tokio::sync::watch`, which already has exactly these
//! semantics: a single slot holding the last value plus change notification.

use tokio::sync::watch;

/// Single-writer, multi-reader state slot with replay of the last value
#[derive(Debug)]
pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StateCell<T> {
    /// Create a cell holding `initial`
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify subscribers
    ///
    /// Succeeds even when nobody is subscribed.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Modify the value in place and notify subscribers
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Modify the value in place when `f` returns `true`
    ///
    /// Subscribers are notified only on `true`.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Subscribe to changes; the receiver starts at the current value
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let cell = StateCell::new(false);
        assert!(!cell.get());
        cell.set(true);
        assert!(cell.get());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_last_value() {
        let cell = StateCell::new(0u32);
        cell.set(1);
        cell.set(2);

        let rx = cell.subscribe();
        assert_eq!(*rx.borrow(), 2);
    }

    #[tokio::test]
    async fn test_subscriber_is_notified() {
        let cell = StateCell::new(Vec::<u32>::new());
        let mut rx = cell.subscribe();

        cell.update(|v| v.push(7));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), vec![7]);
    }

    #[test]
    fn test_update_if_notifies_only_on_change() {
        let cell = StateCell::new(1u32);
        let mut rx = cell.subscribe();

        assert!(!cell.update_if(|v| {
            if *v == 0 {
                *v = 5;
                return true;
            }
            false
        }));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(cell.get(), 1);

        assert!(cell.update_if(|v| {
            *v += 1;
            true
        }));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 2);
    }
}
