//! Per-codename write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// One async mutex per codename, created on first use and dropped again once
/// nobody holds or waits for it.
///
/// Every read-modify-write of a title record happens while holding that
/// title's guard, so two operations never update the same codename at once
/// while different codenames proceed independently.
#[derive(Debug, Default)]
pub struct CodenameLocks {
    locks: Arc<StdMutex<LockMap>>,
}

/// Exclusive access to one codename. Released on drop.
#[derive(Debug)]
pub struct CodenameGuard {
    codename: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

fn lock_map(locks: &StdMutex<LockMap>) -> MutexGuard<'_, LockMap> {
    // The map is never left half-updated, so a poisoned lock is still usable.
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CodenameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `codename`.
    pub async fn acquire(&self, codename: &str) -> CodenameGuard {
        let lock = {
            let mut locks = lock_map(&self.locks);
            Arc::clone(locks.entry(codename.to_string()).or_default())
        };
        CodenameGuard {
            codename: codename.to_string(),
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of codenames with a live lock entry.
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for CodenameGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = lock_map(&self.locks);
        // Only the map's own reference left: no holder, no waiter.
        if locks
            .get(&self.codename)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.codename);
        }
    }
}
