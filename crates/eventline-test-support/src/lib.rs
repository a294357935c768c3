//! Shared test doubles for the Eventline runtime.

mod clock;
mod store;
mod subscriber;

pub use clock::FixedClock;
pub use store::{FailingCommandStore, RecordingCommandStore};
pub use subscriber::{FailingSubscriber, RecordingSubscriber};
