//! The scheduled message definition.

use chime_core::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a message definition.
///
/// Only `Active` messages have their occurrences picked up by the
/// dispatch engine; `Paused` messages keep their pending occurrences but
/// are skipped by the due query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    /// Eligible for dispatch.
    Active,
    /// Temporarily suspended by its owner.
    Paused,
}

impl MessageState {
    /// Returns the canonical string form used in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }

    /// Parses the database string form, defaulting unknown values to `Paused`.
    ///
    /// Unknown values default to `Paused` so that a corrupted row is never
    /// dispatched.
    #[must_use]
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            _ => Self::Paused,
        }
    }
}

/// Recipient and timezone metadata for a scheduled message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetails {
    /// Recipient addresses, interpreted by the transport.
    pub recipients: Vec<String>,
    /// Delivery channel identifier (e.g. "telegram", "webhook").
    pub channel: String,
    /// Timezone offset in minutes east of UTC, used when evaluating the
    /// schedule expression.
    pub time_zone_offset: i32,
}

/// A recurring message's static description.
///
/// Created by an external authoring flow; the dispatch engine mutates a
/// message only by appending new occurrences, and never deletes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledMessage {
    /// Unique identifier.
    pub id: MessageId,
    /// Schedule expression understood by the schedule evaluator.
    pub schedule: String,
    /// Message body sent to recipients.
    pub text: String,
    /// Lifecycle state of the definition itself.
    pub state: MessageState,
    /// Recipient and timezone metadata.
    pub details: MessageDetails,
    /// When the definition was created.
    pub created_at: DateTime<Utc>,
}

impl ScheduledMessage {
    /// Creates a new active message definition.
    #[must_use]
    pub fn new(
        schedule: impl Into<String>,
        text: impl Into<String>,
        details: MessageDetails,
    ) -> Self {
        Self {
            id: MessageId::new(),
            schedule: schedule.into(),
            text: text.into(),
            state: MessageState::Active,
            details,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the message is eligible for dispatch.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == MessageState::Active
    }
}
