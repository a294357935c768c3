//! Test subscribers for both dispatchers.

use std::sync::Mutex;

use async_trait::async_trait;
use eventline_core::envelope::Envelope;
use eventline_core::error::DomainError;
use eventline_core::payload::{CommandKind, EventKind, PayloadKind};
use eventline_runtime::{CommandSubscriber, EventSubscriber};

/// Records every envelope it receives and accepts it.
#[derive(Debug)]
pub struct RecordingSubscriber<P: PayloadKind> {
    name: String,
    received: Mutex<Vec<Envelope<P>>>,
}

impl<P: PayloadKind> RecordingSubscriber<P> {
    /// Creates a recorder that has seen nothing yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Returns every envelope received so far, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn received(&self) -> Vec<Envelope<P>> {
        self.received.lock().unwrap().clone()
    }

    /// Sequence numbers of the received envelopes, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sequence_numbers(&self) -> Vec<i64> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.metadata.sequence_no)
            .collect()
    }

    fn record(&self, envelope: &Envelope<P>) {
        self.received.lock().unwrap().push(envelope.clone());
    }
}

#[async_trait]
impl<C: CommandKind> CommandSubscriber<C> for RecordingSubscriber<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, command: &Envelope<C>) -> Result<(), DomainError> {
        self.record(command);
        Ok(())
    }
}

#[async_trait]
impl<E: EventKind> EventSubscriber<E> for RecordingSubscriber<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &Envelope<E>) -> Result<(), DomainError> {
        self.record(event);
        Ok(())
    }
}

/// Rejects every envelope with a rule violation carrying `reason`.
#[derive(Debug)]
pub struct FailingSubscriber {
    reason: String,
}

impl FailingSubscriber {
    /// Creates a subscriber that refuses everything with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl<C: CommandKind> CommandSubscriber<C> for FailingSubscriber {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _command: &Envelope<C>) -> Result<(), DomainError> {
        Err(DomainError::RuleViolation(self.reason.clone()))
    }
}

#[async_trait]
impl<E: EventKind> EventSubscriber<E> for FailingSubscriber {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _event: &Envelope<E>) -> Result<(), DomainError> {
        Err(DomainError::RuleViolation(self.reason.clone()))
    }
}
