//! Eventline Runtime: ordering, dispatch, and replay.
//!
//! Commands enter through the [`CommandBus`], which sequences them per
//! entity, fans them out to every saga through the [`CommandDispatcher`], and
//! appends them to the command store once every saga has accepted them.
//! Sagas publish the resulting events on the [`EventQueue`], which fans them
//! out to every [`View`] through the [`EventDispatcher`]. Replay walks an
//! entity's stored commands back through the same dispatcher path.
//!
//! [`RuntimeBuilder`] is the single place where sagas and views are wired.

pub mod aggregate;
pub mod builder;
pub mod command_bus;
pub mod command_dispatcher;
pub mod event_dispatcher;
pub mod event_queue;
mod fan_out;
pub mod locks;
pub mod registry;
pub mod saga;
pub mod telemetry;
pub mod view;

pub use aggregate::Aggregate;
pub use builder::{Runtime, RuntimeBuilder};
pub use command_bus::CommandBus;
pub use command_dispatcher::{CommandDispatcher, CommandSubscriber};
pub use event_dispatcher::{EventDispatcher, EventSubscriber};
pub use event_queue::EventQueue;
pub use locks::EntityLocks;
pub use registry::CommandRegistry;
pub use saga::{Outcome, Saga, SagaBehavior};
pub use telemetry::{LogFormat, TelemetryConfig, TelemetryError, init_tracing};
pub use view::View;
