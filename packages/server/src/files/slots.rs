use std::sync::Arc;

use common::FileCategory;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type SlotKey = (i64, FileCategory);

/// In-process mutual exclusion per `(owner_id, category)` slot.
///
/// Entries are removed once no task holds or waits for them. A waiter
/// cancelled after the holder released can leave its entry behind; the next
/// `acquire` sweeps those.
#[derive(Default)]
pub struct SlotLocks {
    locks: Arc<DashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a slot.
    pub async fn acquire(&self, owner_id: i64, category: FileCategory) -> SlotGuard {
        let key = (owner_id, category);
        let lock = self.locks.entry(key).or_default().clone();
        self.locks.retain(|_, l| Arc::strong_count(l) > 1);
        let guard = lock.lock_owned().await;

        SlotGuard {
            key,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of slots currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive access to one slot, released on drop.
pub struct SlotGuard {
    key: SlotKey,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or awaits this slot.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
