//! Saga base: validate, mutate and persist the snapshot, publish events.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use eventline_core::envelope::Command;
use eventline_core::error::DomainError;
use eventline_core::payload::{CommandKind, EventKind, Variant};
use eventline_core::store::{Snapshot, SnapshotStore};

use crate::command_dispatcher::CommandSubscriber;
use crate::event_queue::EventQueue;

/// The result of a saga accepting a command: the next snapshot and the
/// events to publish, in order.
#[derive(Debug, Clone)]
pub struct Outcome<S, E> {
    /// Snapshot to persist.
    pub snapshot: S,
    /// Event payloads to publish after the snapshot is persisted. If any of
    /// them fails, the previous snapshot is put back.
    pub events: Vec<E>,
}

impl<S, E> Outcome<S, E> {
    /// An outcome that only updates the snapshot.
    #[must_use]
    pub fn new(snapshot: S) -> Self {
        Self {
            snapshot,
            events: Vec::new(),
        }
    }

    /// Appends an event to publish.
    #[must_use]
    pub fn with_event(mut self, event: E) -> Self {
        self.events.push(event);
        self
    }
}

/// Business rules of a saga.
///
/// `decide` is pure: it sees the current snapshot (if any) and the command
/// and either rejects the command or returns the next snapshot plus events.
/// The [`Saga`] wrapper takes care of loading, persisting, and publishing.
pub trait SagaBehavior<C: CommandKind, E: EventKind>: Send + Sync + 'static {
    /// The aggregate snapshot this saga owns.
    type Snapshot: Snapshot;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Validates `command` against `current` and computes the outcome.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::RuleViolation` when a business invariant would
    /// be broken, or `DomainError::NotFound` when the command needs an
    /// existing snapshot and there is none.
    fn decide(
        &self,
        current: Option<&Self::Snapshot>,
        command: &Command<C>,
    ) -> Result<Outcome<Self::Snapshot, E>, DomainError>;
}

/// A [`SagaBehavior`] bound to its snapshot store and event queue.
///
/// Only command types registered with [`Saga::subscribe`] reach the
/// behavior; everything else is ignored.
pub struct Saga<B, C, E>
where
    B: SagaBehavior<C, E>,
    C: CommandKind,
    E: EventKind,
{
    behavior: B,
    snapshots: Arc<dyn SnapshotStore<B::Snapshot>>,
    events: EventQueue<E>,
    subscriptions: HashSet<&'static str>,
    _commands: PhantomData<fn() -> C>,
}

impl<B, C, E> Saga<B, C, E>
where
    B: SagaBehavior<C, E>,
    C: CommandKind,
    E: EventKind,
{
    /// Creates a saga with no subscriptions.
    #[must_use]
    pub fn new(
        behavior: B,
        snapshots: Arc<dyn SnapshotStore<B::Snapshot>>,
        events: EventQueue<E>,
    ) -> Self {
        Self {
            behavior,
            snapshots,
            events,
            subscriptions: HashSet::new(),
            _commands: PhantomData,
        }
    }

    /// Subscribes this saga instance to one command variant.
    #[must_use]
    pub fn subscribe<V: Variant<C>>(mut self) -> Self {
        self.subscriptions.insert(V::TYPE_NAME);
        self
    }

    /// Whether this saga handles `command_type`.
    #[must_use]
    pub fn handles(&self, command_type: &str) -> bool {
        self.subscriptions.contains(command_type)
    }

    /// Puts back the snapshot that preceded a command whose events failed.
    async fn restore(&self, previous: Option<B::Snapshot>, persisted: &B::Snapshot) {
        let restored = match previous {
            Some(previous) => self.snapshots.persist(previous).await.map(|_| ()),
            None => self.snapshots.delete(persisted).await,
        };
        if let Err(e) = restored {
            tracing::warn!(
                saga = self.behavior.name(),
                entity_id = ?persisted.id(),
                error = %e,
                "failed to restore snapshot; replay onto emptied stores to recover"
            );
        }
    }
}

#[async_trait]
impl<B, C, E> CommandSubscriber<C> for Saga<B, C, E>
where
    B: SagaBehavior<C, E>,
    C: CommandKind,
    E: EventKind,
{
    fn name(&self) -> &str {
        self.behavior.name()
    }

    async fn handle(&self, command: &Command<C>) -> Result<(), DomainError> {
        if !self.handles(command.payload_type()) {
            return Ok(());
        }

        let entity_id = command.entity.id();
        let sequence_no = command.metadata.sequence_no;
        let current = self.snapshots.find(entity_id).await?;

        if command.is_replay()
            && current
                .as_ref()
                .is_some_and(|snapshot| snapshot.version() >= sequence_no)
        {
            tracing::debug!(
                saga = self.behavior.name(),
                entity_id,
                sequence_no,
                "command already reflected in snapshot; skipping"
            );
            return Ok(());
        }

        let outcome = match self.behavior.decide(current.as_ref(), command) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::info!(
                    saga = self.behavior.name(),
                    command_type = command.payload_type(),
                    entity_id,
                    error = %e,
                    "command refused"
                );
                return Err(e);
            }
        };

        let mut snapshot = outcome.snapshot;
        if snapshot.id().is_none() {
            snapshot.assign_id(entity_id);
        }
        snapshot.set_version(sequence_no);
        let persisted = self.snapshots.persist(snapshot).await?;

        let events: Vec<_> = outcome
            .events
            .into_iter()
            .map(|payload| command.derive_event(payload))
            .collect();
        let event_count = events.len();
        if let Err(e) = self.events.publish_all(events).await {
            self.restore(current, &persisted).await;
            return Err(e);
        }

        tracing::debug!(
            saga = self.behavior.name(),
            command_type = command.payload_type(),
            entity_id,
            sequence_no,
            events = event_count,
            "command applied"
        );
        Ok(())
    }
}
