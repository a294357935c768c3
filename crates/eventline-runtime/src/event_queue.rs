//! Entry point sagas use to publish events.

use std::sync::Arc;

use eventline_core::envelope::Event;
use eventline_core::error::DomainError;
use eventline_core::payload::EventKind;

use crate::event_dispatcher::EventDispatcher;

/// Cloneable handle that forwards events straight to the event dispatcher.
pub struct EventQueue<E: EventKind> {
    dispatcher: Arc<EventDispatcher<E>>,
}

impl<E: EventKind> Clone for EventQueue<E> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<E: EventKind> EventQueue<E> {
    /// Creates a queue over a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<EventDispatcher<E>>) -> Self {
        Self { dispatcher }
    }

    /// Publishes one event and waits until every view has handled it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a malformed event, otherwise
    /// whatever the dispatcher reports.
    pub async fn publish(&self, event: Event<E>) -> Result<(), DomainError> {
        event.validate()?;
        tracing::debug!(
            event_type = event.payload_type(),
            entity_id = event.entity.id(),
            sequence_no = event.metadata.sequence_no,
            is_replay = event.is_replay(),
            "event queued"
        );
        self.dispatcher.dispatch(&event).await
    }

    /// Publishes events one after another, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failure; later events are not published.
    pub async fn publish_all(&self, events: Vec<Event<E>>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use eventline_core::entity::EntityReference;
    use eventline_core::envelope::Envelope;
    use eventline_core::metadata::Metadata;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::event_dispatcher::EventSubscriber;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Tick {
        n: u32,
    }

    #[derive(Debug, Clone)]
    enum ClockEvent {
        Tick(Tick),
    }

    impl EventKind for ClockEvent {}

    eventline_core::payload_kind!(ClockEvent {
        Tick(Tick) => "clock.tick",
    });

    #[derive(Default)]
    struct Collector {
        ticks: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl EventSubscriber<ClockEvent> for Collector {
        fn name(&self) -> &str {
            "collector"
        }

        async fn handle(&self, event: &Event<ClockEvent>) -> Result<(), DomainError> {
            let ClockEvent::Tick(tick) = &event.payload;
            self.ticks.lock().unwrap().push(tick.n);
            Ok(())
        }
    }

    fn tick(entity_id: i64, n: u32) -> Event<ClockEvent> {
        Envelope {
            name: "clock.tick".into(),
            metadata: Metadata::new(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()),
            entity: EntityReference::existing(entity_id),
            payload: ClockEvent::Tick(Tick { n }),
        }
    }

    #[tokio::test]
    async fn test_publish_all_delivers_in_order() {
        let collector = Arc::new(Collector::default());
        let queue = EventQueue::new(Arc::new(EventDispatcher::new(vec![
            collector.clone() as Arc<dyn EventSubscriber<ClockEvent>>,
        ])));

        queue
            .publish_all(vec![tick(1, 1), tick(1, 2), tick(1, 3)])
            .await
            .unwrap();

        assert_eq!(*collector.ticks.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_publish_rejects_invalid_entity() {
        let collector = Arc::new(Collector::default());
        let queue = EventQueue::new(Arc::new(EventDispatcher::new(vec![
            collector.clone() as Arc<dyn EventSubscriber<ClockEvent>>,
        ])));

        let result = queue.publish(tick(0, 1)).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(collector.ticks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_views_is_a_no_op() {
        let queue = EventQueue::<ClockEvent>::new(Arc::new(EventDispatcher::new(vec![])));

        assert!(queue.publish(tick(1, 1)).await.is_ok());
    }
}
