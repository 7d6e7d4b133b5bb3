use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Idle entries are swept once the table grows past this many keys.
const PRUNE_THRESHOLD: usize = 1024;

type SlotKey = (i64, NaiveDate);

/// One async mutex per (court, date). Every booking write for a key happens
/// while holding that key's guard, so check-then-insert is atomic per key and
/// writes to different keys never wait on each other.
#[derive(Default)]
pub struct SlotLocks {
    locks: DashMap<SlotKey, Arc<Mutex<()>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, court_id: i64, date: NaiveDate) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }

        let lock = self
            .locks
            .entry((court_id, date))
            .or_default()
            .value()
            .clone();
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on. The shard write lock taken by
    /// `retain` excludes concurrent `acquire` clones for the same shard.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(SlotLocks::new());
        let guard = locks.acquire(1, day(1)).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(1, day(1)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = SlotLocks::new();
        let _a = locks.acquire(1, day(1)).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(1, day(2)))
            .await
            .expect("different date must not wait");
        let _c = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2, day(1)))
            .await
            .expect("different court must not wait");
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = SlotLocks::new();
        let held = locks.acquire(1, day(1)).await;
        drop(locks.acquire(2, day(1)).await);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
