//! Command-type registry used to resolve stored commands on replay.

use std::collections::HashMap;

use eventline_core::entity::EntityReference;
use eventline_core::envelope::{Command, Envelope};
use eventline_core::error::DomainError;
use eventline_core::payload::{CommandKind, Variant};
use eventline_core::store::StoredCommand;

type Decoder<C> = fn(serde_json::Value) -> Result<C, serde_json::Error>;

fn decode_variant<C, V: Variant<C>>(value: serde_json::Value) -> Result<C, serde_json::Error> {
    serde_json::from_value::<V>(value).map(V::wrap)
}

/// Maps each stored `command_type` to a typed decoder for its payload.
///
/// Built once at composition time; a command type that was never
/// registered cannot be replayed.
pub struct CommandRegistry<C: CommandKind> {
    decoders: HashMap<&'static str, Decoder<C>>,
}

impl<C: CommandKind> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }
}

impl<C: CommandKind> CommandRegistry<C> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the decoder for one command variant.
    #[must_use]
    pub fn register<V: Variant<C>>(mut self) -> Self {
        self.decoders.insert(V::TYPE_NAME, decode_variant::<C, V>);
        self
    }

    /// Number of registered command types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Whether no command types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Rebuilds a replay command from its stored record.
    ///
    /// The command keeps its stored metadata and sequence number and is
    /// flagged as replay. The first command of a stream targets a new entity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Store` if the command type is unknown or the
    /// payload does not decode.
    pub fn decode(&self, stored: &StoredCommand) -> Result<Command<C>, DomainError> {
        let decoder = self
            .decoders
            .get(stored.command_type.as_str())
            .ok_or_else(|| {
                DomainError::Store(format!(
                    "no decoder registered for command type {}",
                    stored.command_type
                ))
            })?;
        let payload = decoder(stored.payload.clone()).map_err(|e| {
            DomainError::Store(format!(
                "failed to decode {} #{} for entity {}: {e}",
                stored.command_type, stored.sequence_no, stored.entity_id
            ))
        })?;

        let entity = if stored.sequence_no == 1 {
            EntityReference::new_entity(stored.entity_id)
        } else {
            EntityReference::existing(stored.entity_id)
        };
        let mut metadata = stored.metadata.clone();
        metadata.sequence_no = stored.sequence_no;
        metadata.is_replay = true;

        Ok(Envelope {
            name: stored.command_name.clone(),
            metadata,
            entity,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use eventline_core::metadata::Metadata;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Fill {
        litres: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Drain;

    #[derive(Debug, Clone, PartialEq)]
    enum TankCommand {
        Fill(Fill),
        Drain(Drain),
    }

    impl CommandKind for TankCommand {}

    eventline_core::payload_kind!(TankCommand {
        Fill(Fill) => "tank.fill",
        Drain(Drain) => "tank.drain",
    });

    fn stored(command_type: &str, sequence_no: i64, payload: serde_json::Value) -> StoredCommand {
        let occurred_on = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        StoredCommand {
            entity_id: 4,
            sequence_no,
            command_name: command_type.to_owned(),
            command_type: command_type.to_owned(),
            payload,
            metadata: Metadata::new(occurred_on),
            recorded_at: occurred_on,
        }
    }

    #[test]
    fn test_decode_restores_typed_payload_as_replay() {
        let registry = CommandRegistry::<TankCommand>::new()
            .register::<Fill>()
            .register::<Drain>();

        let command = registry
            .decode(&stored("tank.fill", 2, serde_json::json!({ "litres": 40 })))
            .unwrap();

        assert_eq!(command.payload, TankCommand::Fill(Fill { litres: 40 }));
        assert_eq!(command.metadata.sequence_no, 2);
        assert!(command.is_replay());
        assert_eq!(command.entity, EntityReference::existing(4));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_decode_marks_first_command_as_new_entity() {
        let registry = CommandRegistry::<TankCommand>::new().register::<Drain>();

        let command = registry
            .decode(&stored("tank.drain", 1, serde_json::Value::Null))
            .unwrap();

        assert!(command.entity.is_new());
    }

    #[test]
    fn test_decode_rejects_unregistered_type() {
        let registry = CommandRegistry::<TankCommand>::new().register::<Fill>();

        match registry.decode(&stored("tank.drain", 1, serde_json::Value::Null)) {
            Err(DomainError::Store(msg)) => assert!(msg.contains("tank.drain")),
            other => panic!("expected Store error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        let registry = CommandRegistry::<TankCommand>::new().register::<Fill>();

        let result = registry.decode(&stored(
            "tank.fill",
            3,
            serde_json::json!({ "litres": "many" }),
        ));

        assert!(matches!(result, Err(DomainError::Store(_))));
    }
}
