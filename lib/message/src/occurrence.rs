//! One concrete firing of a scheduled message.

use chime_core::OccurrenceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of an occurrence.
///
/// Transitions Pending → Completed exactly once, performed by the
/// dispatch engine, and is never reverted. A failed dispatch leaves the
/// occurrence Pending so it is retried on a later poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceState {
    /// Waiting to become due and be dispatched.
    Pending,
    /// Dispatched successfully.
    Completed,
}

impl OccurrenceState {
    /// Returns the canonical string form used in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Parses the database string form.
    ///
    /// Unknown values map to `Completed` so that a corrupted row is never
    /// dispatched twice.
    #[must_use]
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            _ => Self::Completed,
        }
    }
}

/// One concrete future firing of a [`ScheduledMessage`].
///
/// [`ScheduledMessage`]: crate::ScheduledMessage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOccurrence {
    /// Unique identifier.
    pub id: OccurrenceId,
    /// The absolute instant (UTC) at which this occurrence is due.
    pub next_occurrence: DateTime<Utc>,
    /// Completion state.
    pub state: OccurrenceState,
}

impl MessageOccurrence {
    /// Creates a new pending occurrence due at the given instant.
    #[must_use]
    pub fn pending(next_occurrence: DateTime<Utc>) -> Self {
        Self {
            id: OccurrenceId::new(),
            next_occurrence,
            state: OccurrenceState::Pending,
        }
    }

    /// Returns true if this occurrence is pending and due at `as_of`.
    #[must_use]
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.state == OccurrenceState::Pending && self.next_occurrence <= as_of
    }

    /// Marks the occurrence as completed.
    pub fn complete(&mut self) {
        self.state = OccurrenceState::Completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn pending_occurrence_becomes_due() {
        let now = Utc::now();
        let occurrence = MessageOccurrence::pending(now - Duration::seconds(1));
        assert!(occurrence.is_due(now));
    }

    #[test]
    fn future_occurrence_is_not_due() {
        let now = Utc::now();
        let occurrence = MessageOccurrence::pending(now + Duration::minutes(5));
        assert!(!occurrence.is_due(now));
    }

    #[test]
    fn completed_occurrence_is_never_due() {
        let now = Utc::now();
        let mut occurrence = MessageOccurrence::pending(now - Duration::minutes(5));
        occurrence.complete();
        assert_eq!(occurrence.state, OccurrenceState::Completed);
        assert!(!occurrence.is_due(now));
    }

    #[test]
    fn state_round_trips_through_db_form() {
        assert_eq!(
            OccurrenceState::from_str_value(OccurrenceState::Pending.as_str()),
            OccurrenceState::Pending
        );
        assert_eq!(
            OccurrenceState::from_str_value(OccurrenceState::Completed.as_str()),
            OccurrenceState::Completed
        );
    }

    #[test]
    fn unknown_state_defaults_to_completed() {
        assert_eq!(
            OccurrenceState::from_str_value("failed"),
            OccurrenceState::Completed
        );
    }
}
