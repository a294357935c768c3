//! Convenience front door for building and publishing commands.

use std::sync::Arc;

use eventline_core::entity::EntityReference;
use eventline_core::envelope::{Command, Envelope};
use eventline_core::error::DomainError;
use eventline_core::payload::{CommandKind, Variant};

use crate::command_bus::CommandBus;

/// Wraps payloads into commands and publishes them on a shared bus.
pub struct Aggregate<C: CommandKind> {
    bus: Arc<CommandBus<C>>,
}

impl<C: CommandKind> Clone for Aggregate<C> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
        }
    }
}

impl<C: CommandKind> Aggregate<C> {
    /// Creates a front door over `bus`.
    #[must_use]
    pub fn new(bus: Arc<CommandBus<C>>) -> Self {
        Self { bus }
    }

    /// Builds a live command for `entity`, stamped by the bus clock.
    #[must_use]
    pub fn command<V: Variant<C>>(&self, entity: EntityReference, payload: V) -> Command<C> {
        Envelope::from_variant(entity, payload, self.bus.clock().as_ref())
    }

    /// Publishes a command that creates `entity_id`.
    ///
    /// # Errors
    ///
    /// See [`CommandBus::publish`].
    pub async fn create<V: Variant<C>>(
        &self,
        entity_id: i64,
        payload: V,
    ) -> Result<Command<C>, DomainError> {
        self.publish(self.command(EntityReference::new_entity(entity_id), payload))
            .await
    }

    /// Publishes a command against the existing entity `entity_id`.
    ///
    /// # Errors
    ///
    /// See [`CommandBus::publish`].
    pub async fn execute<V: Variant<C>>(
        &self,
        entity_id: i64,
        payload: V,
    ) -> Result<Command<C>, DomainError> {
        self.publish(self.command(EntityReference::existing(entity_id), payload))
            .await
    }

    /// Publishes a prepared command.
    ///
    /// # Errors
    ///
    /// See [`CommandBus::publish`].
    pub async fn publish(&self, command: Command<C>) -> Result<Command<C>, DomainError> {
        self.bus.publish(command).await
    }

    /// Replays `entity_id` from stored history.
    ///
    /// # Errors
    ///
    /// See [`CommandBus::replay`].
    pub async fn replay(&self, entity_id: i64) -> Result<usize, DomainError> {
        self.bus.replay(entity_id).await
    }
}
