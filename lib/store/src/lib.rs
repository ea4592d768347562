//! Occurrence store adapter for chime.
//!
//! This crate defines the narrow persistence interface the dispatch
//! engine depends on:
//!
//! - **`OccurrenceStore`**: opens a fresh [`StoreScope`] per poll
//! - **`StoreScope`**: the per-tick unit of work: fetch due occurrences,
//!   stage state transitions, commit the whole batch with one save
//! - **`MemoryStore`**: an in-memory implementation for tests and local
//!   runs
//!
//! Staged completions and appends become visible only after a successful
//! [`StoreScope::save`]; a failed save loses the whole batch, which the
//! engine corrects by natural retry on the next poll.

pub mod error;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::{DueOccurrence, OccurrenceStore, StoreScope};
