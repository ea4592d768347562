//! The parsed, computable schedule.

use crate::error::ScheduleParseError;
use crate::field::CronField;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

/// Widest UTC offset accepted, in minutes (UTC+14 / UTC-14).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Search horizon in days. Wide enough to reach the next leap day from any
/// starting point, including across the year-2100 non-leap century.
const MAX_SEARCH_DAYS: u32 = 3000;

/// Maximum day count per month, counting leap-year February.
const DAYS_IN_MONTH: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A parsed schedule, evaluated in a fixed UTC offset.
///
/// Obtained from [`Schedule::parse`]; evaluation via
/// [`Schedule::next_occurrence`] is deterministic and performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    expression: String,
    minute: CronField,
    hour: CronField,
    day_of_month: CronField,
    month: CronField,
    day_of_week: CronField,
    offset: FixedOffset,
}

impl Schedule {
    /// Parses a five-field cron expression with a timezone offset in
    /// minutes east of UTC.
    ///
    /// # Errors
    ///
    /// Returns a [`ScheduleParseError`] when the expression is malformed,
    /// the offset is out of range, or the day-of-month/month combination
    /// can never fire (e.g. February 30th).
    pub fn parse(
        expression: &str,
        time_zone_offset_minutes: i32,
    ) -> Result<Self, ScheduleParseError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ScheduleParseError::Empty);
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ScheduleParseError::WrongFieldCount {
                expression: trimmed.to_string(),
                count: fields.len(),
            });
        }

        if time_zone_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ScheduleParseError::InvalidOffset {
                minutes: time_zone_offset_minutes,
            });
        }
        let offset = FixedOffset::east_opt(time_zone_offset_minutes * 60).ok_or(
            ScheduleParseError::InvalidOffset {
                minutes: time_zone_offset_minutes,
            },
        )?;

        let schedule = Self {
            expression: trimmed.to_string(),
            minute: CronField::parse(fields[0], 0, 59, "minute")?,
            hour: CronField::parse(fields[1], 0, 23, "hour")?,
            day_of_month: CronField::parse(fields[2], 1, 31, "day-of-month")?,
            month: CronField::parse(fields[3], 1, 12, "month")?,
            day_of_week: CronField::parse(fields[4], 0, 6, "day-of-week")?,
            offset,
        };
        schedule.check_satisfiable()?;

        Ok(schedule)
    }

    /// Returns the original expression text.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Computes the next occurrence strictly after the given instant.
    ///
    /// Evaluation happens in the schedule's fixed offset; the result is
    /// converted back to UTC. Returns `None` only if no occurrence exists
    /// within the search horizon, which parsing already rules out for
    /// satisfiable expressions.
    #[must_use]
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = after.with_timezone(&self.offset);
        let mut day = local.date_naive();
        // Strictly after: start the scan at the following minute.
        let mut minute_of_day = local.hour() * 60 + local.minute() + 1;

        for _ in 0..MAX_SEARCH_DAYS {
            if self.month.contains(day.month()) && self.day_matches(day) {
                if let Some(found) = self.first_time_at_or_after(minute_of_day) {
                    let time = NaiveTime::from_hms_opt(found / 60, found % 60, 0)?;
                    let fixed = self.offset.from_local_datetime(&day.and_time(time)).single()?;
                    return Some(fixed.with_timezone(&Utc));
                }
            }
            day = day.succ_opt()?;
            minute_of_day = 0;
        }

        None
    }

    /// Standard cron day matching: when both day fields are restricted,
    /// either one matching fires the schedule; otherwise both must match.
    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom_ok = self.day_of_month.contains(date.day());
        let dow_ok = self
            .day_of_week
            .contains(date.weekday().num_days_from_sunday());

        if self.day_of_month.is_wildcard() || self.day_of_week.is_wildcard() {
            dom_ok && dow_ok
        } else {
            dom_ok || dow_ok
        }
    }

    /// Finds the first matching minute-of-day at or after the given one.
    fn first_time_at_or_after(&self, minute_of_day: u32) -> Option<u32> {
        for hour in self.hour.values() {
            for minute in self.minute.values() {
                let candidate = hour * 60 + minute;
                if candidate >= minute_of_day {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Rejects day-of-month/month combinations that can never fire.
    fn check_satisfiable(&self) -> Result<(), ScheduleParseError> {
        // With both day fields restricted the OR rule applies, and any
        // weekday occurs in every month.
        if !self.day_of_month.is_wildcard() && !self.day_of_week.is_wildcard() {
            return Ok(());
        }
        if self.day_of_month.is_wildcard() {
            return Ok(());
        }

        for month in self.month.values() {
            let max_day = DAYS_IN_MONTH[(month - 1) as usize];
            if self.day_of_month.values().any(|day| day <= max_day) {
                return Ok(());
            }
        }

        Err(ScheduleParseError::Unsatisfiable {
            expression: self.expression.clone(),
        })
    }
}
