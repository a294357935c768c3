//! Fan-out of one command to every registered saga.

use std::sync::Arc;

use async_trait::async_trait;
use eventline_core::envelope::Command;
use eventline_core::error::DomainError;
use eventline_core::payload::CommandKind;
use futures::future::join_all;
use tracing::Instrument;

use crate::fan_out::settle;

/// Business-logic consumer of commands (usually a [`Saga`](crate::Saga)).
#[async_trait]
pub trait CommandSubscriber<C: CommandKind>: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Handles one command. Commands the subscriber does not care about
    /// must be accepted as a no-op.
    async fn handle(&self, command: &Command<C>) -> Result<(), DomainError>;
}

/// Delivers each command to a fixed list of subscribers.
pub struct CommandDispatcher<C: CommandKind> {
    subscribers: Vec<Arc<dyn CommandSubscriber<C>>>,
}

impl<C: CommandKind> CommandDispatcher<C> {
    /// Creates a dispatcher over an explicit subscriber list.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn CommandSubscriber<C>>>) -> Self {
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

    /// Delivers `command` to every subscriber concurrently and waits for all
    /// of them.
    ///
    /// Subscribers that already succeeded are not rolled back when another
    /// one fails.
    ///
    /// # Errors
    ///
    /// Returns the failing subscriber's error, or `DomainError::Dispatch`
    /// carrying every failure when more than one subscriber failed.
    pub async fn dispatch(&self, command: &Command<C>) -> Result<(), DomainError> {
        if self.subscribers.is_empty() {
            tracing::info!(
                command_type = command.payload_type(),
                entity_id = command.entity.id(),
                "no command subscribers registered"
            );
            return Ok(());
        }

        let span = tracing::debug_span!(
            "command_dispatcher.dispatch",
            command_type = command.payload_type(),
            entity_id = command.entity.id(),
            sequence_no = command.metadata.sequence_no,
            is_replay = command.is_replay(),
            subscribers = self.subscribers.len(),
        );

        let results = join_all(self.subscribers.iter().map(|subscriber| async move {
            let result = subscriber.handle(command).await;
            if let Err(e) = &result {
                tracing::debug!(subscriber = subscriber.name(), error = %e, "command subscriber failed");
            }
            result
        }))
        .instrument(span)
        .await;

        settle(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use eventline_core::entity::EntityReference;
    use eventline_core::envelope::Envelope;
    use eventline_core::metadata::Metadata;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ring;

    #[derive(Debug, Clone)]
    enum BellCommand {
        Ring(Ring),
    }

    impl CommandKind for BellCommand {}

    eventline_core::payload_kind!(BellCommand {
        Ring(Ring) => "bell.ring",
    });

    struct Recorder {
        seen: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl CommandSubscriber<BellCommand> for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, command: &Command<BellCommand>) -> Result<(), DomainError> {
            self.seen.lock().unwrap().push(command.entity.id());
            Ok(())
        }
    }

    struct Refuser(&'static str);

    #[async_trait]
    impl CommandSubscriber<BellCommand> for Refuser {
        fn name(&self) -> &str {
            self.0
        }

        async fn handle(&self, _command: &Command<BellCommand>) -> Result<(), DomainError> {
            Err(DomainError::RuleViolation(format!("{} refuses", self.0)))
        }
    }

    fn ring(entity_id: i64) -> Command<BellCommand> {
        Envelope {
            name: "bell.ring".into(),
            metadata: Metadata::new(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()),
            entity: EntityReference::existing(entity_id),
            payload: BellCommand::Ring(Ring),
        }
    }

    #[tokio::test]
    async fn test_dispatch_with_no_subscribers_succeeds() {
        let dispatcher = CommandDispatcher::<BellCommand>::new(vec![]);

        let result = dispatcher.dispatch(&ring(1)).await;

        assert!(result.is_ok());
        assert!(dispatcher.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_subscriber() {
        // Arrange
        let first = Arc::new(Recorder {
            seen: Mutex::new(vec![]),
        });
        let second = Arc::new(Recorder {
            seen: Mutex::new(vec![]),
        });
        let dispatcher = CommandDispatcher::new(vec![
            first.clone() as Arc<dyn CommandSubscriber<BellCommand>>,
            second.clone(),
        ]);

        // Act
        dispatcher.dispatch(&ring(3)).await.unwrap();

        // Assert
        assert_eq!(*first.seen.lock().unwrap(), vec![3]);
        assert_eq!(*second.seen.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_single_failure_after_all_complete() {
        // Arrange
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(vec![]),
        });
        let dispatcher = CommandDispatcher::new(vec![
            Arc::new(Refuser("strict")) as Arc<dyn CommandSubscriber<BellCommand>>,
            recorder.clone(),
        ]);

        // Act
        let result = dispatcher.dispatch(&ring(1)).await;

        // Assert
        match result {
            Err(DomainError::RuleViolation(msg)) => assert!(msg.contains("strict")),
            other => panic!("expected RuleViolation, got {other:?}"),
        }
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_aggregates_multiple_failures() {
        let dispatcher = CommandDispatcher::new(vec![
            Arc::new(Refuser("a")) as Arc<dyn CommandSubscriber<BellCommand>>,
            Arc::new(Refuser("b")),
        ]);

        let result = dispatcher.dispatch(&ring(1)).await;

        match result {
            Err(DomainError::Dispatch(failures)) => assert_eq!(failures.len(), 2),
            other => panic!("expected Dispatch, got {other:?}"),
        }
    }
}
