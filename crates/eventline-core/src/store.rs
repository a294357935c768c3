//! Store adapter contracts.
//!
//! The runtime consumes these traits; concrete adapters (in-memory, SQL, ...)
//! live outside this crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::Command;
use crate::error::DomainError;
use crate::metadata::Metadata;
use crate::payload::CommandKind;

/// Stored representation of a live command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCommand {
    /// Entity the command targeted.
    pub entity_id: i64,
    /// Sequence number within the entity stream (unique per entity).
    pub sequence_no: i64,
    /// Envelope name.
    pub command_name: String,
    /// Payload type name used to resolve the payload on replay.
    pub command_type: String,
    /// Serialized payload variant.
    pub payload: serde_json::Value,
    /// Metadata as it was when the command was dispatched.
    pub metadata: Metadata,
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

impl StoredCommand {
    /// Builds the record for a sequenced command.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Store` if the payload cannot be serialized.
    pub fn from_command<C: CommandKind>(
        command: &Command<C>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            entity_id: command.entity.id(),
            sequence_no: command.metadata.sequence_no,
            command_name: command.name.clone(),
            command_type: command.payload_type().to_owned(),
            payload: command.payload.to_payload()?,
            metadata: command.metadata.clone(),
            recorded_at,
        })
    }
}

/// Append-only command log keyed by entity id.
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// Appends one sequenced command.
    ///
    /// Implementations must reject a record whose `(entity_id, sequence_no)`
    /// already exists.
    async fn append(&self, command: StoredCommand) -> Result<(), DomainError>;

    /// Loads every command for an entity, ordered by sequence number.
    async fn load(&self, entity_id: i64) -> Result<Vec<StoredCommand>, DomainError>;

    /// Returns the sequence number the next appended command must carry.
    ///
    /// Strictly greater than the last appended sequence for the entity;
    /// `1` for an entity with no history.
    async fn next_sequence_no(&self, entity_id: i64) -> Result<i64, DomainError>;
}

/// A materialized snapshot: an aggregate's state or a view model.
pub trait Snapshot: Clone + Send + Sync + 'static {
    /// Human-readable kind, used in `NotFound` errors.
    const KIND: &'static str;

    /// Identifier, if one has been assigned.
    fn id(&self) -> Option<i64>;

    /// Assigns the identifier (called by stores on first persist).
    fn assign_id(&mut self, id: i64);

    /// Sequence number of the last command reflected in this snapshot.
    fn version(&self) -> i64;

    /// Records the sequence number of the last command reflected.
    fn set_version(&mut self, version: i64);
}

/// Latest-snapshot storage. One instance per namespace: aggregate
/// snapshots and view models never share a store.
#[async_trait]
pub trait SnapshotStore<T: Snapshot>: Send + Sync {
    /// Finds a snapshot by id.
    async fn find(&self, id: i64) -> Result<Option<T>, DomainError>;

    /// Gets a snapshot by id, failing when it is missing.
    async fn get(&self, id: i64) -> Result<T, DomainError> {
        self.find(id)
            .await?
            .ok_or(DomainError::NotFound { kind: T::KIND, id })
    }

    /// Persists a snapshot, assigning an id if it has none, and returns the
    /// stored value.
    async fn persist(&self, snapshot: T) -> Result<T, DomainError>;

    /// Deletes a snapshot.
    async fn delete(&self, snapshot: &T) -> Result<(), DomainError>;
}
