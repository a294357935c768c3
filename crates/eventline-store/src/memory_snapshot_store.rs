//! In-memory implementation of the `SnapshotStore` trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use eventline_core::error::DomainError;
use eventline_core::store::{Snapshot, SnapshotStore};
use tokio::sync::RwLock;

/// Latest-snapshot store for one namespace.
#[derive(Debug)]
pub struct InMemorySnapshotStore<T> {
    snapshots: RwLock<HashMap<i64, T>>,
    last_id: AtomicI64,
}

impl<T> Default for InMemorySnapshotStore<T> {
    fn default() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            last_id: AtomicI64::new(0),
        }
    }
}

impl<T: Snapshot> InMemorySnapshotStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots currently held.
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    /// Whether the store holds no snapshots.
    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }

    /// Drops every snapshot, e.g. before rebuilding by replay.
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }
}

#[async_trait]
impl<T: Snapshot> SnapshotStore<T> for InMemorySnapshotStore<T> {
    async fn find(&self, id: i64) -> Result<Option<T>, DomainError> {
        Ok(self.snapshots.read().await.get(&id).cloned())
    }

    async fn persist(&self, mut snapshot: T) -> Result<T, DomainError> {
        let id = if let Some(id) = snapshot.id() {
            self.last_id.fetch_max(id, Ordering::SeqCst);
            id
        } else {
            let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
            snapshot.assign_id(id);
            id
        };

        self.snapshots.write().await.insert(id, snapshot.clone());
        Ok(snapshot)
    }

    async fn delete(&self, snapshot: &T) -> Result<(), DomainError> {
        let Some(id) = snapshot.id() else {
            return Err(DomainError::Validation(format!(
                "cannot delete {} without an id",
                T::KIND
            )));
        };
        self.snapshots
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::NotFound { kind: T::KIND, id })
    }
}
