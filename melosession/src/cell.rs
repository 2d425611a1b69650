//! Subscribable value cell
//!
//! A `ValueCell` holds one value, lets any number of readers take a snapshot
//! or subscribe, and replays the latest value to every new subscriber before
//! delivering live updates. It is the building block for the session state and
//! for the published caches of the API accessors.

use std::sync::Arc;
use tokio::sync::watch;

/// Single-writer, multi-reader broadcast cell (last write wins)
#[derive(Debug)]
pub struct ValueCell<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ValueCell<T> {
    /// Create a cell holding `initial`
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Synchronous snapshot of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify every subscriber
    ///
    /// Works whether or not anybody is subscribed.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the value in place, notifying subscribers only if it changed
    ///
    /// Returns whether the value changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|value| {
            let before = value.clone();
            f(value);
            *value != before
        })
    }

    /// Subscribe: the first `next()` yields the current value
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.tx.subscribe(),
            primed: false,
        }
    }

    /// Wait until the value satisfies `predicate` and return that value
    ///
    /// Returns immediately when the current value already matches. There is
    /// no timeout: if the value never matches, the future never resolves.
    pub async fn wait_for(&self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let mut rx = self.tx.subscribe();
        let value = rx.wait_for(predicate).await.ok()?;
        Some(value.clone())
    }
}

/// A reader's view of a `ValueCell`
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> Subscription<T> {
    /// Next value: the current one on first call, then each update
    ///
    /// Updates made faster than the reader consumes them coalesce into the
    /// latest value. Returns `None` once the cell is gone.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// True when a value has been published that `next()` has not returned yet
    pub fn has_pending(&self) -> bool {
        !self.primed || self.rx.has_changed().unwrap_or(false)
    }
}
