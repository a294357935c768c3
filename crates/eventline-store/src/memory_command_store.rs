//! In-memory implementation of the `CommandStore` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use eventline_core::error::DomainError;
use eventline_core::store::{CommandStore, StoredCommand};
use tokio::sync::RwLock;

/// Command log held in process memory.
///
/// Each entity stream must grow contiguously: an append is accepted only
/// when its sequence number is exactly one past the last stored record.
/// `next_sequence_no` is derived from the log, so a number handed out for a
/// command that is never appended is handed out again.
#[derive(Debug, Default)]
pub struct InMemoryCommandStore {
    streams: RwLock<HashMap<i64, Vec<StoredCommand>>>,
}

impl InMemoryCommandStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandStore for InMemoryCommandStore {
    async fn append(&self, command: StoredCommand) -> Result<(), DomainError> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(command.entity_id).or_default();
        let last = stream.last().map_or(0, |c| c.sequence_no);

        if command.sequence_no <= last {
            return Err(DomainError::Store(format!(
                "duplicate sequence number {} for entity {}",
                command.sequence_no, command.entity_id
            )));
        }
        if command.sequence_no != last + 1 {
            return Err(DomainError::Store(format!(
                "sequence gap for entity {}: expected {}, got {}",
                command.entity_id,
                last + 1,
                command.sequence_no
            )));
        }

        tracing::debug!(
            entity_id = command.entity_id,
            sequence_no = command.sequence_no,
            command_type = %command.command_type,
            "command appended"
        );
        stream.push(command);
        Ok(())
    }

    async fn load(&self, entity_id: i64) -> Result<Vec<StoredCommand>, DomainError> {
        Ok(self
            .streams
            .read()
            .await
            .get(&entity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn next_sequence_no(&self, entity_id: i64) -> Result<i64, DomainError> {
        let streams = self.streams.read().await;
        let last = streams
            .get(&entity_id)
            .and_then(|s| s.last())
            .map_or(0, |c| c.sequence_no);
        Ok(last + 1)
    }
}
