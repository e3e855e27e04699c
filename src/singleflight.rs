//! Singleflight Module
//!
//! Collapses concurrent loads of the same key into one execution.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;

// == Flight ==
/// Duplicate suppression for in-flight work, keyed by string.
///
/// The first caller for a key (the leader) runs the work; callers arriving
/// while it runs wait and receive a clone of its outcome, success or error.
/// The record is dropped as soon as the leader finishes, so nothing is
/// remembered between non-overlapping calls. There is no timeout: a leader
/// that never finishes holds its followers forever.
#[derive(Debug)]
pub struct Flight<T> {
    calls: Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
}

impl<T> Default for Flight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

/// Removes the leader's record when it finishes or is dropped mid-flight.
struct CallGuard<'a, T> {
    calls: &'a Mutex<HashMap<String, watch::Receiver<Option<T>>>>,
    key: &'a str,
}

impl<T> Drop for CallGuard<'_, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(self.key);
    }
}

impl<T: Clone> Flight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Work ==
    /// Runs `func` for `key` unless a call for `key` is already in flight, in
    /// which case waits for that call and returns its outcome.
    ///
    /// If the leader is dropped before finishing, one waiter takes over and
    /// runs its own `func`.
    pub async fn work<F, Fut>(&self, key: &str, func: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let tx = loop {
            let mut rx = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(rx) => rx.clone(),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        calls.insert(key.to_string(), rx);
                        break tx;
                    }
                }
            };

            let outcome = match rx.wait_for(Option::is_some).await {
                Ok(value) => value.clone(),
                // Leader dropped without an outcome
                Err(_) => None,
            };
            if let Some(value) = outcome {
                return value;
            }
            tokio::task::yield_now().await;
        };

        let guard = CallGuard {
            calls: &self.calls,
            key,
        };
        let value = func().await;
        tx.send_replace(Some(value.clone()));
        drop(guard);
        value
    }

    /// Returns the number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
