//! Fan-out of one event to every registered view.

use std::sync::Arc;

use async_trait::async_trait;
use eventline_core::envelope::Event;
use eventline_core::error::DomainError;
use eventline_core::payload::EventKind;
use futures::future::join_all;
use tracing::Instrument;

use crate::fan_out::settle;

/// Consumer of events (usually a [`View`](crate::View)).
#[async_trait]
pub trait EventSubscriber<E: EventKind>: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Handles one event. Event types the subscriber does not understand
    /// must be accepted as a no-op.
    async fn handle(&self, event: &Event<E>) -> Result<(), DomainError>;
}

/// Delivers each event to a fixed list of subscribers.
pub struct EventDispatcher<E: EventKind> {
    subscribers: Vec<Arc<dyn EventSubscriber<E>>>,
}

impl<E: EventKind> EventDispatcher<E> {
    /// Creates a dispatcher over an explicit subscriber list.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn EventSubscriber<E>>>) -> Self {
        Self { subscribers }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no subscribers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers `event` to every subscriber concurrently and waits for all
    /// of them.
    ///
    /// # Errors
    ///
    /// Returns the failing subscriber's error, or `DomainError::Dispatch`
    /// carrying every failure when more than one subscriber failed.
    pub async fn dispatch(&self, event: &Event<E>) -> Result<(), DomainError> {
        if self.subscribers.is_empty() {
            tracing::info!(
                event_type = event.payload_type(),
                entity_id = event.entity.id(),
                "no event subscribers registered"
            );
            return Ok(());
        }

        let span = tracing::debug_span!(
            "event_dispatcher.dispatch",
            event_type = event.payload_type(),
            entity_id = event.entity.id(),
            sequence_no = event.metadata.sequence_no,
            is_replay = event.is_replay(),
            subscribers = self.subscribers.len(),
        );

        let results = join_all(self.subscribers.iter().map(|subscriber| async move {
            let result = subscriber.handle(event).await;
            if let Err(e) = &result {
                tracing::debug!(subscriber = subscriber.name(), error = %e, "event subscriber failed");
            }
            result
        }))
        .instrument(span)
        .await;

        settle(results)
    }
}
