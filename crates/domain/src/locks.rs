//! Per-aggregate mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::AggregateId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<AggregateId, Arc<AsyncMutex<()>>>;

/// One async mutex per aggregate id, created on demand.
///
/// Commands against different aggregates never wait on each other. An entry
/// is removed when its last holder releases it and nobody is queued.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Holds the lock for one aggregate until dropped.
pub struct KeyedGuard {
    key: AggregateId,
    locks: Arc<Mutex<LockMap>>,
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: AggregateId) -> KeyedGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key).or_default().clone()
        };

        KeyedGuard {
            key,
            locks: Arc::clone(&self.locks),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Number of ids currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // The map and this guard are the only owners when nobody is waiting.
        if let Some(mutex) = locks.get(&self.key)
            && Arc::strong_count(mutex) <= 2
        {
            locks.remove(&self.key);
        }
    }
}
