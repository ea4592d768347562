//! Parsing of individual cron fields.
//!
//! A field is a comma list of terms; each term is `*`, a single value, a
//! range `A-B`, or either of those with a `/STEP` suffix. Parsed values
//! are stored as a bitmask, which is plenty for the 0-59 minute range.

use crate::error::ScheduleParseError;

/// One parsed cron field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CronField {
    mask: u64,
    wildcard: bool,
    min: u32,
    max: u32,
}

impl CronField {
    /// Parses a field specification against its allowed value range.
    pub(crate) fn parse(
        spec: &str,
        min: u32,
        max: u32,
        name: &'static str,
    ) -> Result<Self, ScheduleParseError> {
        let invalid = |reason: String| ScheduleParseError::InvalidField {
            field: name,
            value: spec.to_string(),
            reason,
        };

        if spec.is_empty() {
            return Err(invalid("field is empty".to_string()));
        }

        let mut mask = 0u64;
        for term in spec.split(',') {
            let (range, step) = match term.split_once('/') {
                Some((range, step_text)) => {
                    let step: u32 = step_text
                        .parse()
                        .map_err(|_| invalid(format!("step '{step_text}' is not a number")))?;
                    if step == 0 {
                        return Err(invalid("step must be at least 1".to_string()));
                    }
                    (range, step)
                }
                None => (term, 1),
            };

            let (lo, hi) = if range == "*" {
                (min, max)
            } else if let Some((lo_text, hi_text)) = range.split_once('-') {
                let lo: u32 = lo_text
                    .parse()
                    .map_err(|_| invalid(format!("'{lo_text}' is not a number")))?;
                let hi: u32 = hi_text
                    .parse()
                    .map_err(|_| invalid(format!("'{hi_text}' is not a number")))?;
                if lo > hi {
                    return Err(invalid(format!("range {lo}-{hi} is reversed")));
                }
                (lo, hi)
            } else {
                let value: u32 = range
                    .parse()
                    .map_err(|_| invalid(format!("'{range}' is not a number")))?;
                (value, value)
            };

            if lo < min {
                return Err(invalid(format!("{lo} is below the minimum {min}")));
            }
            if hi > max {
                return Err(invalid(format!("{hi} is above the maximum {max}")));
            }

            let mut value = lo;
            while value <= hi {
                mask |= 1u64 << value;
                // A step wider than the remaining range ends the term.
                value = match value.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
        }

        Ok(Self {
            mask,
            wildcard: spec == "*",
            min,
            max,
        })
    }

    /// Returns true if the field matches the given value.
    pub(crate) fn contains(&self, value: u32) -> bool {
        value <= self.max && self.mask & (1u64 << value) != 0
    }

    /// Returns true if the field was written as a bare `*`.
    ///
    /// Needed for the standard cron day-matching rule: a restricted
    /// day-of-month and a restricted day-of-week combine with OR, while a
    /// wildcard in either position combines with AND.
    pub(crate) fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Iterates the matching values in ascending order.
    pub(crate) fn values(&self) -> impl Iterator<Item = u32> + '_ {
        (self.min..=self.max).filter(|v| self.contains(*v))
    }
}
