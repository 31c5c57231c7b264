//! Position state machine and its durable store.

pub mod machine;
pub mod store;

pub use machine::{Phase, PositionState};
pub use store::{FileStateStore, MemoryStateStore, StateError, StateStore};
