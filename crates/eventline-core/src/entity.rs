//! Entity references.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifies the aggregate instance a command or event targets.
///
/// The reference is immutable once built; routing, sequencing, and storage
/// all key on [`EntityReference::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    id: i64,
    is_new: bool,
}

impl EntityReference {
    /// Reference to an entity that the command is about to create.
    #[must_use]
    pub fn new_entity(id: i64) -> Self {
        Self { id, is_new: true }
    }

    /// Reference to an entity that already has history.
    #[must_use]
    pub fn existing(id: i64) -> Self {
        Self { id, is_new: false }
    }

    /// The entity identifier.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the reference was created for a brand-new entity.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Checks that the reference can be routed and stored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the id is not strictly positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id <= 0 {
            return Err(DomainError::Validation(format!(
                "entity id must be positive, got {}",
                self.id
            )));
        }
        Ok(())
    }
}
