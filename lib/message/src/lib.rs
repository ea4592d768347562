//! Domain entities for scheduled messages.
//!
//! A [`ScheduledMessage`] is the static description of a recurring
//! message: what to send, to whom, and on what schedule. Each concrete
//! future firing of a message is a [`MessageOccurrence`] with its own due
//! timestamp and completion state. A message owns a growing sequence of
//! occurrences; the dispatch engine only ever appends to it.

pub mod message;
pub mod occurrence;

pub use message::{MessageDetails, MessageState, ScheduledMessage};
pub use occurrence::{MessageOccurrence, OccurrenceState};
