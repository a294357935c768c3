//! Eventline Store: in-memory implementations of the store contracts.
//!
//! Suitable for tests, demos, and single-process deployments that rebuild
//! their state by replay on start-up.

pub mod memory_command_store;
pub mod memory_snapshot_store;

pub use memory_command_store::InMemoryCommandStore;
pub use memory_snapshot_store::InMemorySnapshotStore;
