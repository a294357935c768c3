//! Test command stores.

use std::sync::Mutex;

use async_trait::async_trait;
use eventline_core::error::DomainError;
use eventline_core::store::{CommandStore, StoredCommand};

/// A command store that keeps appended records in memory and counts every
/// `next_sequence_no` call.
///
/// Unlike the production in-memory store it performs no contiguity checks,
/// so tests can seed it with arbitrary histories through
/// [`RecordingCommandStore::with_history`].
#[derive(Debug, Default)]
pub struct RecordingCommandStore {
    records: Mutex<Vec<StoredCommand>>,
    sequence_requests: Mutex<Vec<i64>>,
}

impl RecordingCommandStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `history`, returned as-is by `load`.
    #[must_use]
    pub fn with_history(history: Vec<StoredCommand>) -> Self {
        Self {
            records: Mutex::new(history),
            sequence_requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns every record held by the store, seeded or appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<StoredCommand> {
        self.records.lock().unwrap().clone()
    }

    /// Returns the entity ids `next_sequence_no` was called for, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sequence_requests(&self) -> Vec<i64> {
        self.sequence_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandStore for RecordingCommandStore {
    async fn append(&self, command: StoredCommand) -> Result<(), DomainError> {
        self.records.lock().unwrap().push(command);
        Ok(())
    }

    async fn load(&self, entity_id: i64) -> Result<Vec<StoredCommand>, DomainError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn next_sequence_no(&self, entity_id: i64) -> Result<i64, DomainError> {
        self.sequence_requests.lock().unwrap().push(entity_id);
        let last = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.entity_id == entity_id)
            .map(|c| c.sequence_no)
            .max()
            .unwrap_or(0);
        Ok(last + 1)
    }
}

/// A command store that fails every call. Useful for testing error paths.
#[derive(Debug)]
pub struct FailingCommandStore;

#[async_trait]
impl CommandStore for FailingCommandStore {
    async fn append(&self, _command: StoredCommand) -> Result<(), DomainError> {
        Err(DomainError::Store("connection refused".into()))
    }

    async fn load(&self, _entity_id: i64) -> Result<Vec<StoredCommand>, DomainError> {
        Err(DomainError::Store("connection refused".into()))
    }

    async fn next_sequence_no(&self, _entity_id: i64) -> Result<i64, DomainError> {
        Err(DomainError::Store("connection refused".into()))
    }
}
