//! Weekly recurrence rules.

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Fires on every listed weekday at every listed time of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRule {
    weekdays: Vec<Weekday>,
    times: Vec<NaiveTime>,
}

impl WeeklyRule {
    /// Build a rule from a set of weekdays and a set of times.
    ///
    /// Duplicates are removed. Either set being empty is an error.
    pub fn new(
        weekdays: impl IntoIterator<Item = Weekday>,
        times: impl IntoIterator<Item = NaiveTime>,
    ) -> Result<Self> {
        let mut weekdays: Vec<Weekday> = weekdays.into_iter().collect();
        weekdays.sort_by_key(Weekday::num_days_from_monday);
        weekdays.dedup();

        let mut times: Vec<NaiveTime> = times.into_iter().collect();
        times.sort();
        times.dedup();

        if weekdays.is_empty() {
            return Err(SchedulerError::InvalidSchedule(
                "weekly rule needs at least one weekday".to_string(),
            ));
        }
        if times.is_empty() {
            return Err(SchedulerError::InvalidSchedule(
                "weekly rule needs at least one time of day".to_string(),
            ));
        }

        Ok(Self { weekdays, times })
    }

    /// A rule with exactly one weekday and one time.
    pub fn at(weekday: Weekday, time: NaiveTime) -> Self {
        Self {
            weekdays: vec![weekday],
            times: vec![time],
        }
    }

    /// Weekdays this rule fires on, Monday first.
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    /// Times of day this rule fires at, earliest first.
    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// The earliest matching instant strictly after `from`.
    ///
    /// A time on `from`'s own weekday that is not later than `from` resolves
    /// to the same weekday next week. Returns `None` only if the calendar
    /// overflows.
    pub fn next_after(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        (0..=7u64).find_map(|offset| {
            let date = from.date().checked_add_days(Days::new(offset))?;
            if !self.weekdays.contains(&date.weekday()) {
                return None;
            }
            self.times
                .iter()
                .map(|time| date.and_time(*time))
                .find(|candidate| *candidate > from)
        })
    }
}
