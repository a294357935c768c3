//! The command bus: sequencing, dispatch, persistence, and replay.
//!
//! Ordering for a live command, inside the entity's critical section:
//!
//! 1. take the next sequence number from the command store and stamp it
//! 2. dispatch to every saga and wait for all of them
//! 3. append the command to the store
//!
//! A command rejected in step 2 is never appended and consumes no sequence
//! number. A saga whose events fail in a view puts its previous snapshot
//! back before reporting the failure. A crash between 2 and 3 leaves saga and view snapshots ahead of
//! the log; replaying the entity onto emptied snapshot stores rebuilds them
//! from the durable history.

use std::sync::Arc;

use eventline_core::clock::Clock;
use eventline_core::envelope::Command;
use eventline_core::error::DomainError;
use eventline_core::payload::CommandKind;
use eventline_core::store::{CommandStore, StoredCommand};
use tracing::Instrument;
use tracing::field::Empty;

use crate::command_dispatcher::CommandDispatcher;
use crate::locks::EntityLocks;
use crate::registry::CommandRegistry;

/// Single authority turning published commands into ordered, durable facts.
pub struct CommandBus<C: CommandKind> {
    store: Arc<dyn CommandStore>,
    dispatcher: CommandDispatcher<C>,
    registry: CommandRegistry<C>,
    clock: Arc<dyn Clock>,
    locks: EntityLocks,
}

impl<C: CommandKind> CommandBus<C> {
    /// Creates a bus over an explicit dispatcher and replay registry.
    #[must_use]
    pub fn new(
        store: Arc<dyn CommandStore>,
        dispatcher: CommandDispatcher<C>,
        registry: CommandRegistry<C>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            registry,
            clock,
            locks: EntityLocks::new(),
        }
    }

    /// The clock used to stamp new commands and stored records.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Publishes a command.
    ///
    /// Live commands are sequenced, dispatched, then appended. Replay
    /// commands are dispatched only: they are never sequenced or appended.
    /// Returns the command as dispatched (with its sequence number).
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` if the command is malformed.
    /// - Any error raised by a saga during dispatch; nothing is appended.
    /// - `DomainError::Store` if sequencing or appending fails.
    pub async fn publish(&self, mut command: Command<C>) -> Result<Command<C>, DomainError> {
        command.validate()?;

        let entity_id = command.entity.id();
        let span = tracing::info_span!(
            "command_bus.publish",
            command_type = command.payload_type(),
            entity_id,
            sequence_no = Empty,
            is_replay = command.is_replay(),
        );

        async move {
            let _guard = self.locks.acquire(entity_id).await;

            if !command.is_replay() {
                command.metadata.sequence_no = self.store.next_sequence_no(entity_id).await?;
            }
            tracing::Span::current().record("sequence_no", command.metadata.sequence_no);

            if let Err(e) = self.dispatcher.dispatch(&command).await {
                tracing::warn!(error = %e, "command rejected");
                return Err(e);
            }

            if !command.is_replay() {
                let record = StoredCommand::from_command(&command, self.clock.now())?;
                self.store.append(record).await?;
            }

            tracing::info!(
                command_type = command.payload_type(),
                entity_id,
                sequence_no = command.metadata.sequence_no,
                is_replay = command.is_replay(),
                "command published"
            );
            Ok(command)
        }
        .instrument(span)
        .await
    }

    /// Replays an entity's stored history through the dispatcher.
    ///
    /// Commands are redispatched one at a time in persisted order, flagged
    /// as replay, without sequencing or appending. Live publishes for the
    /// same entity wait until the walk is over. Returns the number of
    /// commands replayed; an entity without history replays nothing.
    ///
    /// # Errors
    ///
    /// - `DomainError::Validation` if `entity_id` is not a valid id.
    /// - `DomainError::Store` if loading fails, the history is out of order,
    ///   or a stored command cannot be decoded.
    /// - Any error raised by a saga; the remaining history is not replayed.
    pub async fn replay(&self, entity_id: i64) -> Result<usize, DomainError> {
        eventline_core::entity::EntityReference::existing(entity_id).validate()?;

        let span = tracing::info_span!("command_bus.replay", entity_id, replayed = Empty);

        async move {
            let _guard = self.locks.acquire(entity_id).await;

            let history = self.store.load(entity_id).await?;
            if history.is_empty() {
                tracing::debug!("no history to replay");
                return Ok(0);
            }
            validate_history(entity_id, &history)?;

            for stored in &history {
                let command = self.registry.decode(stored)?;
                tracing::debug!(
                    sequence_no = stored.sequence_no,
                    command_type = %stored.command_type,
                    "replaying command"
                );
                if let Err(e) = self.dispatcher.dispatch(&command).await {
                    tracing::warn!(
                        sequence_no = stored.sequence_no,
                        error = %e,
                        "replay aborted"
                    );
                    return Err(e);
                }
            }

            tracing::Span::current().record("replayed", history.len());
            tracing::info!(replayed = history.len(), "entity replayed");
            Ok(history.len())
        }
        .instrument(span)
        .await
    }
}

/// Rejects histories that belong to another entity or are not strictly
/// increasing, even if a store adapter returns them.
fn validate_history(entity_id: i64, history: &[StoredCommand]) -> Result<(), DomainError> {
    let mut last = 0;
    for stored in history {
        if stored.entity_id != entity_id {
            return Err(DomainError::Store(format!(
                "history for entity {entity_id} contains a command for entity {}",
                stored.entity_id
            )));
        }
        if stored.sequence_no <= last {
            return Err(DomainError::Store(format!(
                "non-monotonic history for entity {entity_id} (last={last}, found={})",
                stored.sequence_no
            )));
        }
        last = stored.sequence_no;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eventline_core::metadata::Metadata;

    use super::*;

    fn record(entity_id: i64, sequence_no: i64) -> StoredCommand {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        StoredCommand {
            entity_id,
            sequence_no,
            command_name: "test".into(),
            command_type: "test".into(),
            payload: serde_json::Value::Null,
            metadata: Metadata::new(now),
            recorded_at: now,
        }
    }

    #[test]
    fn test_validate_history_accepts_increasing_sequence() {
        assert!(validate_history(1, &[record(1, 1), record(1, 2), record(1, 3)]).is_ok());
    }

    #[test]
    fn test_validate_history_rejects_out_of_order_sequence() {
        let result = validate_history(1, &[record(1, 2), record(1, 1)]);

        match result {
            Err(DomainError::Store(msg)) => assert!(msg.contains("non-monotonic")),
            other => panic!("expected Store error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_history_rejects_foreign_entity() {
        let result = validate_history(1, &[record(1, 1), record(2, 2)]);

        assert!(matches!(result, Err(DomainError::Store(_))));
    }
}
