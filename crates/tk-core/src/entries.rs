//! Time entry history and weekly summaries.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::access;
use crate::error::Result;
use crate::model::TimeEntry;
use crate::repository::Store;
use crate::types::{TaskId, UserId, ValidationError};

const DAYS_PER_WEEK: u64 = 7;

const WEEK_OUT_OF_RANGE: ValidationError = ValidationError::InvalidDate {
    field: "week_start",
};

/// Completed time booked on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_minutes: i64,
    pub entries: Vec<TimeEntry>,
}

/// Completed time over seven consecutive days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    /// Last day of the week, inclusive.
    pub week_end: NaiveDate,
    pub total_minutes: i64,
    /// One element per day, including days with nothing booked.
    pub days: Vec<DaySummary>,
}

/// The Monday on or before `date`.
pub fn week_containing(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Entries on the user's tasks, most recent start first.
///
/// With `task` set, only that task's entries are returned, after checking
/// that `user` owns it.
pub fn list_entries<S: Store>(
    store: &S,
    user: &UserId,
    task: Option<&TaskId>,
) -> Result<Vec<TimeEntry>> {
    access::require_user(store, user)?;
    if let Some(task) = task {
        access::owned_task(store, user, task, "You don't have access to this task")?;
    }
    Ok(store.entries_for_owner(user, task)?)
}

/// Groups the completed entries in `entries` by the UTC day they started on.
///
/// Entries outside the week are ignored. Fails when the week runs past the
/// last representable day.
pub fn summarize_week(
    week_start: NaiveDate,
    entries: Vec<TimeEntry>,
) -> Result<WeeklySummary, ValidationError> {
    let week_end = week_start
        .checked_add_days(Days::new(DAYS_PER_WEEK - 1))
        .ok_or(WEEK_OUT_OF_RANGE)?;
    let mut days: BTreeMap<NaiveDate, DaySummary> = week_start
        .iter_days()
        .take_while(|date| *date <= week_end)
        .map(|date| {
            let day = DaySummary {
                date,
                total_minutes: 0,
                entries: Vec::new(),
            };
            (date, day)
        })
        .collect();

    for entry in entries {
        let Some(minutes) = entry.duration else {
            continue;
        };
        if let Some(day) = days.get_mut(&entry.start_time.date_naive()) {
            day.total_minutes += minutes;
            day.entries.push(entry);
        }
    }

    let days: Vec<DaySummary> = days.into_values().collect();
    Ok(WeeklySummary {
        week_start,
        week_end,
        total_minutes: days.iter().map(|day| day.total_minutes).sum(),
        days,
    })
}

/// Completed time the user booked in the week starting on `week_start`.
pub fn weekly_summary<S: Store>(
    store: &S,
    user: &UserId,
    week_start: NaiveDate,
) -> Result<WeeklySummary> {
    access::require_user(store, user)?;
    let next_week = week_start
        .checked_add_days(Days::new(DAYS_PER_WEEK))
        .ok_or(WEEK_OUT_OF_RANGE)?;
    let start = week_start.and_time(NaiveTime::MIN).and_utc();
    let end = next_week.and_time(NaiveTime::MIN).and_utc();
    let entries = store.completed_entries_between(user, start, end)?;
    tracing::debug!(%user, %week_start, entries = entries.len(), "summarizing week");
    Ok(summarize_week(week_start, entries)?)
}
