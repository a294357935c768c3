//! Per-entity critical sections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle locks are first pruned once the table grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per entity id.
///
/// Holding the guard serializes sequence allocation, dispatch, and append
/// for that entity. Different entities never contend.
#[derive(Debug, Default)]
pub struct EntityLocks {
    table: Mutex<LockTable>,
}

#[derive(Debug)]
struct LockTable {
    locks: HashMap<i64, Arc<AsyncMutex<()>>>,
    /// Size at which the next prune runs; doubles while most locks stay busy.
    prune_at: usize,
}

impl Default for LockTable {
    fn default() -> Self {
        Self {
            locks: HashMap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }
}

impl LockTable {
    fn prune_if_due(&mut self) {
        if self.locks.len() <= self.prune_at {
            return;
        }
        // Only this table holds a reference: nobody owns or awaits it.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        self.prune_at = (self.locks.len() * 2).max(PRUNE_THRESHOLD);
    }
}

impl EntityLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `entity_id`.
    pub async fn acquire(&self, entity_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.prune_if_due();
            Arc::clone(table.locks.entry(entity_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of entity locks currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .locks
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_entity_is_exclusive() {
        let locks = EntityLocks::new();
        let _guard = locks.acquire(1).await;

        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(1)).await;

        assert!(second.is_err(), "second acquire should wait for the first");
    }

    #[tokio::test]
    async fn test_different_entities_do_not_contend() {
        let locks = EntityLocks::new();
        let _guard = locks.acquire(1).await;

        let other = tokio::time::timeout(Duration::from_millis(20), locks.acquire(2)).await;

        assert!(other.is_ok());
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn test_idle_locks_are_pruned_past_threshold() {
        let locks = EntityLocks::new();
        for id in 0..=i64::try_from(PRUNE_THRESHOLD).unwrap() {
            drop(locks.acquire(id).await);
        }
        assert_eq!(locks.tracked(), PRUNE_THRESHOLD + 1);

        let _guard = locks.acquire(-1).await;

        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn test_busy_table_defers_the_next_prune() {
        let locks = EntityLocks::new();
        let mut held = Vec::new();
        for id in 0..=i64::try_from(PRUNE_THRESHOLD).unwrap() {
            held.push(locks.acquire(id).await);
        }

        // Nothing is idle, so the prune keeps every lock and backs off.
        held.push(locks.acquire(-1).await);
        held.push(locks.acquire(-2).await);

        assert_eq!(locks.tracked(), PRUNE_THRESHOLD + 3);
        assert_eq!(
            locks.table.lock().unwrap().prune_at,
            (PRUNE_THRESHOLD + 1) * 2
        );
    }
}
