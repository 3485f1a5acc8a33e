//! Per-identity async mutual exclusion.
//!
//! One FIFO `tokio::sync::Mutex` per key, created on first use and dropped
//! once the last holder or waiter releases it, so the map only ever holds
//! identities that are being merged right now.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive hold on one key. Released on drop.
///
/// The guard is `'static`, so it can move into a spawned task and keep the key
/// held for as long as that task runs.
pub struct KeyGuard {
    owner: Arc<KeyedLocks>,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Waiters are served in arrival order.
    pub async fn lock(self: &Arc<Self>, key: &str) -> KeyGuard {
        // Clone out of the shard before awaiting so the shard is never held
        // across a suspension point.
        let mutex = Arc::clone(self.locks.entry(key.to_owned()).or_default().value());
        let guard = mutex.lock_owned().await;
        KeyGuard { owner: Arc::clone(self), key: key.to_owned(), guard: Some(guard) }
    }

    /// Number of keys currently held or waited on.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or awaits this key.
        self.owner.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn released_keys_are_forgotten() {
        let locks = Arc::new(KeyedLocks::new());
        {
            let _a = locks.lock("amazon_A").await;
            let _b = locks.lock("amazon_B").await;
            assert_eq!(locks.active_keys(), 2);
        }
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let _guard = locks.lock("flipkart_X").await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let locks = Arc::new(KeyedLocks::new());
        let _held = locks.lock("amazon_A").await;
        let other = tokio::time::timeout(Duration::from_millis(100), locks.lock("amazon_B")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn guard_moved_into_a_task_holds_the_key_until_the_task_ends() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("amazon_A").await;
        let (release, released) = tokio::sync::oneshot::channel::<()>();
        let holder = tokio::spawn(async move {
            let _guard = guard;
            let _ = released.await;
        });

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.lock("amazon_A")).await;
        assert!(blocked.is_err());

        release.send(()).unwrap();
        holder.await.unwrap();
        let acquired =
            tokio::time::timeout(Duration::from_millis(100), locks.lock("amazon_A")).await;
        assert!(acquired.is_ok());
    }
}
