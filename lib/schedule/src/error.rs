//! Error types for schedule parsing.

use std::fmt;

/// Errors from parsing a schedule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleParseError {
    /// The expression was empty or whitespace-only.
    Empty,
    /// The expression did not have exactly five fields.
    WrongFieldCount {
        /// The offending expression.
        expression: String,
        /// Number of fields found.
        count: usize,
    },
    /// A field could not be parsed or was out of range.
    InvalidField {
        /// Field name (minute, hour, day-of-month, month, day-of-week).
        field: &'static str,
        /// The offending field text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The timezone offset was outside the representable range.
    InvalidOffset {
        /// The offending offset, in minutes east of UTC.
        minutes: i32,
    },
    /// The day-of-month/month combination can never fire.
    Unsatisfiable {
        /// The offending expression.
        expression: String,
    },
}

impl fmt::Display for ScheduleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "schedule expression is empty"),
            Self::WrongFieldCount { expression, count } => {
                write!(
                    f,
                    "schedule '{expression}' has {count} fields, expected 5 \
                     (minute hour day-of-month month day-of-week)"
                )
            }
            Self::InvalidField {
                field,
                value,
                reason,
            } => {
                write!(f, "invalid {field} field '{value}': {reason}")
            }
            Self::InvalidOffset { minutes } => {
                write!(f, "timezone offset {minutes} minutes is out of range")
            }
            Self::Unsatisfiable { expression } => {
                write!(f, "schedule '{expression}' can never fire")
            }
        }
    }
}

impl std::error::Error for ScheduleParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_field_count_display() {
        let err = ScheduleParseError::WrongFieldCount {
            expression: "0 9 *".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains("3 fields"));
        assert!(err.to_string().contains("expected 5"));
    }

    #[test]
    fn invalid_field_display() {
        let err = ScheduleParseError::InvalidField {
            field: "minute",
            value: "61".to_string(),
            reason: "61 is above the maximum 59".to_string(),
        };
        assert!(err.to_string().contains("minute"));
        assert!(err.to_string().contains("61"));
    }
}
