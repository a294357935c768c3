//! Projections that build one read model per entity from events.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use eventline_core::envelope::Event;
use eventline_core::error::DomainError;
use eventline_core::payload::{EventKind, Variant};
use eventline_core::store::{Snapshot, SnapshotStore};

use crate::event_dispatcher::EventSubscriber;

type Transform<E, M> =
    Box<dyn Fn(Option<M>, &Event<E>) -> Result<M, DomainError> + Send + Sync>;

/// A projection keyed by event type.
///
/// Transforms are registered once at construction with [`View::on_create`]
/// and [`View::on_update`]; dispatch is a single map lookup on the event's
/// type name. Events without a registered transform are skipped.
pub struct View<E: EventKind, M: Snapshot> {
    name: String,
    models: Arc<dyn SnapshotStore<M>>,
    transforms: HashMap<&'static str, Transform<E, M>>,
}

impl<E: EventKind, M: Snapshot> View<E, M> {
    /// Creates a view with no transforms.
    #[must_use]
    pub fn new(name: impl Into<String>, models: Arc<dyn SnapshotStore<M>>) -> Self {
        Self {
            name: name.into(),
            models,
            transforms: HashMap::new(),
        }
    }

    /// Registers the transform that builds a fresh view model from event `V`.
    ///
    /// A model already stored for the entity is replaced.
    #[must_use]
    pub fn on_create<V, F>(mut self, create: F) -> Self
    where
        V: Variant<E>,
        F: Fn(&Event<E>, &V) -> Result<M, DomainError> + Send + Sync + 'static,
    {
        self.transforms.insert(
            V::TYPE_NAME,
            Box::new(move |_current, event| create(event, payload_of::<E, V>(event)?)),
        );
        self
    }

    /// Registers the transform that derives the next view model from the
    /// stored one and event `V`.
    ///
    /// The transform fails with `DomainError::NotFound` if no model is stored
    /// for the entity yet.
    #[must_use]
    pub fn on_update<V, F>(mut self, update: F) -> Self
    where
        V: Variant<E>,
        F: Fn(M, &Event<E>, &V) -> Result<M, DomainError> + Send + Sync + 'static,
    {
        self.transforms.insert(
            V::TYPE_NAME,
            Box::new(move |current, event| {
                let current = current.ok_or(DomainError::NotFound {
                    kind: M::KIND,
                    id: event.entity.id(),
                })?;
                update(current, event, payload_of::<E, V>(event)?)
            }),
        );
        self
    }

    /// Whether a transform is registered for `event_type`.
    #[must_use]
    pub fn handles(&self, event_type: &str) -> bool {
        self.transforms.contains_key(event_type)
    }
}

fn payload_of<E: EventKind, V: Variant<E>>(event: &Event<E>) -> Result<&V, DomainError> {
    V::peek(&event.payload).ok_or_else(|| {
        DomainError::Validation(format!(
            "event {} does not carry a {} payload",
            event.name,
            V::TYPE_NAME
        ))
    })
}

#[async_trait]
impl<E: EventKind, M: Snapshot> EventSubscriber<E> for View<E, M> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &Event<E>) -> Result<(), DomainError> {
        let Some(transform) = self.transforms.get(event.payload_type()) else {
            tracing::trace!(
                view = %self.name,
                event_type = event.payload_type(),
                "no transform registered; skipping"
            );
            return Ok(());
        };

        let entity_id = event.entity.id();
        let current = self.models.find(entity_id).await?;
        let mut next = transform(current, event)?;
        if next.id().is_none() {
            next.assign_id(entity_id);
        }
        next.set_version(event.metadata.sequence_no);
        self.models.persist(next).await?;

        tracing::debug!(
            view = %self.name,
            event_type = event.payload_type(),
            entity_id,
            sequence_no = event.metadata.sequence_no,
            "view model updated"
        );
        Ok(())
    }
}
