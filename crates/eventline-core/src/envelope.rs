//! Command and event envelopes.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::entity::EntityReference;
use crate::error::DomainError;
use crate::metadata::Metadata;
use crate::payload::{CommandKind, EventKind, PayloadKind, Variant};

/// Generic wrapper around a command or event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    /// Routing name; defaults to the payload's type name.
    pub name: String,
    /// Provenance.
    pub metadata: Metadata,
    /// Targeted entity.
    pub entity: EntityReference,
    /// Typed payload.
    pub payload: P,
}

/// An envelope published on the command bus.
pub type Command<C> = Envelope<C>;

/// An envelope published on the event queue.
pub type Event<E> = Envelope<E>;

impl<P: PayloadKind> Envelope<P> {
    /// Wraps a payload with fresh live metadata.
    #[must_use]
    pub fn new(entity: EntityReference, payload: P, clock: &dyn Clock) -> Self {
        Self {
            name: payload.type_name().to_owned(),
            metadata: Metadata::new(clock.now()),
            entity,
            payload,
        }
    }

    /// Builds an envelope from a single payload variant.
    #[must_use]
    pub fn from_variant<V: Variant<P>>(
        entity: EntityReference,
        variant: V,
        clock: &dyn Clock,
    ) -> Self {
        Self::new(entity, variant.wrap(), clock)
    }

    /// Attaches a metadata property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.properties.insert(key.into(), value.into());
        self
    }

    /// Marks the envelope as re-derived from stored history.
    #[must_use]
    pub fn into_replay(mut self) -> Self {
        self.metadata.is_replay = true;
        self
    }

    /// Stable type name of the payload variant.
    #[must_use]
    pub fn payload_type(&self) -> &'static str {
        self.payload.type_name()
    }

    /// Borrows the payload as a specific variant.
    #[must_use]
    pub fn payload_as<V: Variant<P>>(&self) -> Option<&V> {
        V::peek(&self.payload)
    }

    /// Whether this envelope carries replayed traffic.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        self.metadata.is_replay
    }

    /// Checks the envelope before it enters the bus.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank or the entity
    /// reference is invalid.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "{} envelope has an empty name",
                self.payload_type()
            )));
        }
        self.entity.validate()
    }
}

impl<C: CommandKind> Envelope<C> {
    /// Derives an event from this command.
    ///
    /// The event targets the same entity and inherits sequence number,
    /// replay flag, timestamp, and properties (see [`Metadata::derive`]).
    #[must_use]
    pub fn derive_event<E: EventKind>(&self, payload: E) -> Event<E> {
        Envelope {
            name: payload.type_name().to_owned(),
            metadata: self.metadata.derive(),
            entity: self.entity,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::metadata::CAUSATION_ID;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Open {
        owner: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum DoorCommand {
        Open(Open),
    }

    impl CommandKind for DoorCommand {}

    crate::payload_kind!(DoorCommand {
        Open(Open) => "door.open",
    });

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Opened {
        owner: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum DoorEvent {
        Opened(Opened),
    }

    impl EventKind for DoorEvent {}

    crate::payload_kind!(DoorEvent {
        Opened(Opened) => "door.opened",
    });

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_new_command_uses_payload_type_as_name() {
        let command: Command<DoorCommand> = Envelope::from_variant(
            EntityReference::new_entity(1),
            Open {
                owner: "Ann".into(),
            },
            &clock(),
        );

        assert_eq!(command.name, "door.open");
        assert_eq!(command.metadata.sequence_no, 0);
        assert!(!command.is_replay());
        assert_eq!(command.metadata.occurred_on, clock().0);
        assert_eq!(
            command.payload_as::<Open>().map(|o| o.owner.as_str()),
            Some("Ann")
        );
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut command: Command<DoorCommand> = Envelope::from_variant(
            EntityReference::new_entity(1),
            Open {
                owner: "Ann".into(),
            },
            &clock(),
        );
        command.name = "  ".into();

        match command.validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("door.open")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_derive_event_inherits_command_provenance() {
        // Arrange
        let mut command: Command<DoorCommand> = Envelope::from_variant(
            EntityReference::existing(5),
            Open {
                owner: "Ann".into(),
            },
            &clock(),
        )
        .with_property("correlation_id", "c-1")
        .into_replay();
        command.metadata.sequence_no = 3;

        // Act
        let event = command.derive_event(DoorEvent::Opened(Opened {
            owner: "Ann".into(),
        }));

        // Assert
        assert_eq!(event.name, "door.opened");
        assert_eq!(event.entity, command.entity);
        assert_eq!(event.metadata.sequence_no, 3);
        assert!(event.is_replay());
        assert_eq!(event.metadata.property("correlation_id"), Some("c-1"));
        assert_eq!(
            event.metadata.property(CAUSATION_ID),
            Some(command.metadata.event_id.to_string().as_str())
        );
    }
}
