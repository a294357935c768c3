//! Provenance attached to every command and event.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property key linking a derived event to the command that caused it.
pub const CAUSATION_ID: &str = "causation_id";

/// Metadata attached to every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Unique envelope identifier.
    pub event_id: Uuid,
    /// When the command was issued (events inherit their command's timestamp).
    pub occurred_on: DateTime<Utc>,
    /// Per-entity sequence number. Zero until the command bus stamps it.
    pub sequence_no: i64,
    /// Set on traffic re-derived from stored history.
    pub is_replay: bool,
    /// Free-form string properties, ordered by key.
    pub properties: BTreeMap<String, String>,
}

impl Metadata {
    /// Fresh metadata for a live envelope.
    #[must_use]
    pub fn new(occurred_on: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_on,
            sequence_no: 0,
            is_replay: false,
            properties: BTreeMap::new(),
        }
    }

    /// Metadata for an envelope derived from this one.
    ///
    /// Keeps timestamp, sequence number, replay flag, and properties; assigns
    /// a new `event_id` and records this envelope's id as the causation id.
    #[must_use]
    pub fn derive(&self) -> Self {
        let mut properties = self.properties.clone();
        properties.insert(CAUSATION_ID.to_owned(), self.event_id.to_string());
        Self {
            event_id: Uuid::new_v4(),
            occurred_on: self.occurred_on,
            sequence_no: self.sequence_no,
            is_replay: self.is_replay,
            properties,
        }
    }

    /// Returns a property value by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
