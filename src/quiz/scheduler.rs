//! Delayed round transitions.
//!
//! After a guess the player gets a moment to read the verdict before the next flag shows
//! up. That delay is a tokio task owned by the scheduler, so it can be called off when the
//! game it belongs to goes away.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

struct Pending {
    id: u64,
    handle: JoinHandle<()>,
}

struct Inner<K> {
    next_id: u64,
    pending: HashMap<K, Pending>,
}

pub struct RoundScheduler<K> {
    delay: Duration,
    inner: Arc<Mutex<Inner<K>>>,
}

impl<K> RoundScheduler<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                pending: HashMap::new(),
            })),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` once the delay has passed. Anything still pending for `key` is aborted.
    pub fn schedule<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let inner = Arc::clone(&self.inner);
        let mut guard = lock(&self.inner);

        let id = guard.next_id;
        guard.next_id += 1;

        let own_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut guard = lock(&inner);
                if guard.pending.get(&own_key).map(|p| p.id) == Some(id) {
                    guard.pending.remove(&own_key);
                }
            }
            task.await;
        });

        if let Some(previous) = guard.pending.insert(key, Pending { id, handle }) {
            previous.handle.abort();
        }
    }

    /// Aborts the pending task for `key`. Returns whether there was one.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.inner).pending.remove(key) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.inner).pending.contains_key(key)
    }
}

impl<K> RoundScheduler<K> {
    pub fn cancel_all(&self) {
        let mut guard = lock(&self.inner);
        for (_, pending) in guard.pending.drain() {
            pending.handle.abort();
        }
    }
}

impl<K> Drop for RoundScheduler<K> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// A panicking task never holds the lock across user code, the map stays consistent
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
