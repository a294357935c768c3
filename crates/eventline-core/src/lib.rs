//! Eventline Core: shared event-sourcing abstractions.
//!
//! This crate defines the envelope model, the error taxonomy, and the store
//! contracts that the runtime and every domain crate depend on. It contains
//! no dispatch or infrastructure code.

pub mod clock;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod metadata;
pub mod payload;
pub mod store;

#[doc(hidden)]
pub use serde_json as __serde_json;
