//! Composition root for a runtime instance.

use std::sync::Arc;

use eventline_core::clock::{Clock, SystemClock};
use eventline_core::payload::{CommandKind, EventKind, Variant};
use eventline_core::store::CommandStore;

use crate::aggregate::Aggregate;
use crate::command_bus::CommandBus;
use crate::command_dispatcher::{CommandDispatcher, CommandSubscriber};
use crate::event_dispatcher::{EventDispatcher, EventSubscriber};
use crate::event_queue::EventQueue;
use crate::registry::CommandRegistry;

type SagaFactory<C, E> = Box<dyn FnOnce(EventQueue<E>) -> Arc<dyn CommandSubscriber<C>>>;

/// Collects sagas, views, and command types, then wires them into a
/// [`Runtime`].
///
/// Sagas are registered as factories because they need the event queue,
/// which only exists once every view is known.
pub struct RuntimeBuilder<C: CommandKind, E: EventKind> {
    store: Arc<dyn CommandStore>,
    clock: Arc<dyn Clock>,
    registry: CommandRegistry<C>,
    views: Vec<Arc<dyn EventSubscriber<E>>>,
    sagas: Vec<SagaFactory<C, E>>,
    command_subscribers: Vec<Arc<dyn CommandSubscriber<C>>>,
}

impl<C: CommandKind, E: EventKind> RuntimeBuilder<C, E> {
    /// Starts a builder over `store`, using the system clock.
    #[must_use]
    pub fn new(store: Arc<dyn CommandStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            registry: CommandRegistry::new(),
            views: Vec::new(),
            sagas: Vec::new(),
            command_subscribers: Vec::new(),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Makes command variant `V` decodable on replay.
    #[must_use]
    pub fn register<V: Variant<C>>(mut self) -> Self {
        self.registry = self.registry.register::<V>();
        self
    }

    /// Adds an event subscriber.
    #[must_use]
    pub fn view(mut self, view: Arc<dyn EventSubscriber<E>>) -> Self {
        self.views.push(view);
        self
    }

    /// Adds a saga built from the runtime's event queue.
    #[must_use]
    pub fn saga<F, S>(mut self, factory: F) -> Self
    where
        F: FnOnce(EventQueue<E>) -> S + 'static,
        S: CommandSubscriber<C> + 'static,
    {
        self.sagas.push(Box::new(move |queue| {
            Arc::new(factory(queue)) as Arc<dyn CommandSubscriber<C>>
        }));
        self
    }

    /// Adds a command subscriber that does not publish events.
    #[must_use]
    pub fn command_subscriber(mut self, subscriber: Arc<dyn CommandSubscriber<C>>) -> Self {
        self.command_subscribers.push(subscriber);
        self
    }

    /// Wires everything together.
    #[must_use]
    pub fn build(self) -> Runtime<C, E> {
        let events = EventQueue::new(Arc::new(EventDispatcher::new(self.views)));

        let mut subscribers: Vec<Arc<dyn CommandSubscriber<C>>> = self
            .sagas
            .into_iter()
            .map(|factory| factory(events.clone()))
            .collect();
        subscribers.extend(self.command_subscribers);

        tracing::debug!(
            command_subscribers = subscribers.len(),
            replayable_types = self.registry.len(),
            "runtime wired"
        );

        let bus = CommandBus::new(
            self.store,
            CommandDispatcher::new(subscribers),
            self.registry,
            self.clock,
        );

        Runtime {
            bus: Arc::new(bus),
            events,
        }
    }
}

/// A wired runtime: one command bus and the event queue its sagas use.
pub struct Runtime<C: CommandKind, E: EventKind> {
    bus: Arc<CommandBus<C>>,
    events: EventQueue<E>,
}

impl<C: CommandKind, E: EventKind> Clone for Runtime<C, E> {
    fn clone(&self) -> Self {
        Self {
            bus: Arc::clone(&self.bus),
            events: self.events.clone(),
        }
    }
}

impl<C: CommandKind, E: EventKind> Runtime<C, E> {
    /// The command bus every aggregate of this runtime publishes to.
    #[must_use]
    pub fn bus(&self) -> &Arc<CommandBus<C>> {
        &self.bus
    }

    /// A command front door sharing this runtime's bus.
    #[must_use]
    pub fn aggregate(&self) -> Aggregate<C> {
        Aggregate::new(Arc::clone(&self.bus))
    }

    /// The queue sagas of this runtime publish events to.
    #[must_use]
    pub fn events(&self) -> &EventQueue<E> {
        &self.events
    }
}
