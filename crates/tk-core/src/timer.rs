//! Timer engine: the start/stop lifecycle of task timers.
//!
//! Per (user, task) a timer is either idle or running. A running timer is an
//! active [`TimeEntry`]; stopping it closes the entry once and for all and
//! adds its whole-minute duration to the task's `spent_time`.
//!
//! Two invariants hold at every instant:
//! - a task has at most one active entry, whoever owns it;
//! - a user has at most one active entry, across all tasks.
//!
//! Starting a timer while another of the same user is running stops the
//! running one first rather than rejecting the start.
//!
//! The `*_at` functions are the engine proper: they take `now` explicitly,
//! never log, and must run inside one [`Store::atomically`] unit of work.
//! [`start_timer`] and [`stop_timer`] are the use-case wrappers that supply
//! the clock and the transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::access;
use crate::error::{Error, Result, StoreError};
use crate::model::TimeEntry;
use crate::repository::{Repositories, Store};
use crate::types::{self, TaskId, TimeEntryId, UserId};

const SECONDS_PER_MINUTE: i64 = 60;
const ACCESS_DENIED: &str = "You don't have access to this task";

/// Illegal timer state transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Closed entries are immutable.
    #[error("time entry {id} is already stopped")]
    AlreadyStopped { id: TimeEntryId },
}

/// Whole minutes between `start` and `now`, truncated.
///
/// Sub-minute intervals yield 0. A `start` after `now` also yields 0 so that
/// clock skew can never shrink a task's spent time.
pub fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = now.signed_duration_since(start).num_seconds();
    seconds.max(0) / SECONDS_PER_MINUTE
}

impl TimeEntry {
    /// A fresh running entry.
    pub fn start(user_id: UserId, task_id: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            id: TimeEntryId::generate(),
            user_id,
            task_id,
            start_time: now,
            end_time: None,
            duration: None,
            is_active: true,
        }
    }

    /// Closes the entry at `now` and returns its duration in minutes.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<i64, TimerError> {
        if !self.is_active {
            return Err(TimerError::AlreadyStopped {
                id: self.id.clone(),
            });
        }
        let duration = elapsed_minutes(self.start_time, now);
        self.end_time = Some(now);
        self.duration = Some(duration);
        self.is_active = false;
        Ok(duration)
    }

    /// Minutes on the clock: the final duration, or the running total so far.
    pub fn minutes_at(&self, now: DateTime<Utc>) -> i64 {
        self.duration
            .unwrap_or_else(|| elapsed_minutes(self.start_time, now))
    }
}

/// A timer that was stopped, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoppedTimer {
    #[serde(skip)]
    pub task_id: TaskId,
    /// Title of the task the time was booked on.
    pub task: String,
    /// Minutes added to the task's spent time.
    pub duration: i64,
}

/// Result of starting a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedTimer {
    /// The new running entry.
    pub entry: TimeEntry,
    /// The user's previously running timers that were stopped to make room.
    pub stopped: Vec<StoppedTimer>,
}

/// The user's running timer with its elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningTimer {
    pub entry: TimeEntry,
    pub task: String,
    pub elapsed_minutes: i64,
}

fn finish_entry<R: Repositories>(
    repos: &R,
    mut entry: TimeEntry,
    now: DateTime<Utc>,
) -> Result<TimeEntry> {
    let duration = entry.stop(now)?;
    repos.close_entry(&entry)?;
    repos.add_spent_time(&entry.task_id, duration)?;
    Ok(entry)
}

/// Starts a timer for `user` on `task` at `now`.
pub fn start_timer_at<R: Repositories>(
    repos: &R,
    user: &UserId,
    task: &TaskId,
    now: DateTime<Utc>,
) -> Result<StartedTimer> {
    let task = access::owned_task(repos, user, task, ACCESS_DENIED)?;
    if repos.active_entry_for_task(&task.id)?.is_some() {
        return Err(Error::ActiveTimerExists);
    }

    let mut stopped = Vec::new();
    for running in repos.active_entries_for_user(user)? {
        let closed = finish_entry(repos, running, now)?;
        let title = repos
            .task_by_id(&closed.task_id)?
            .map(|t| t.title)
            .unwrap_or_default();
        stopped.push(StoppedTimer {
            task_id: closed.task_id,
            task: title,
            duration: closed.duration.unwrap_or_default(),
        });
    }

    let entry = TimeEntry::start(user.clone(), task.id, now);
    repos.insert_entry(&entry).map_err(|err| match err {
        StoreError::Conflict(_) => Error::ActiveTimerExists,
        backend @ StoreError::Backend(_) => Error::Store(backend),
    })?;
    Ok(StartedTimer { entry, stopped })
}

/// Stops `user`'s running timer on `task` at `now`.
pub fn stop_timer_at<R: Repositories>(
    repos: &R,
    user: &UserId,
    task: &TaskId,
    now: DateTime<Utc>,
) -> Result<StoppedTimer> {
    let task = access::owned_task(repos, user, task, ACCESS_DENIED)?;
    let running = repos
        .active_entry_for_task_and_user(&task.id, user)?
        .ok_or(Error::NoActiveTimer)?;
    let closed = finish_entry(repos, running, now)?;
    Ok(StoppedTimer {
        task_id: task.id,
        task: task.title,
        duration: closed.duration.unwrap_or_default(),
    })
}

/// The user's running timer, if any, as seen at `now`.
pub fn running_timer_at<R: Repositories>(
    repos: &R,
    user: &UserId,
    now: DateTime<Utc>,
) -> Result<Option<RunningTimer>> {
    access::require_user(repos, user)?;
    let Some(entry) = repos.active_entries_for_user(user)?.into_iter().next() else {
        return Ok(None);
    };
    let task = repos
        .task_by_id(&entry.task_id)?
        .map(|t| t.title)
        .unwrap_or_default();
    let elapsed_minutes = entry.minutes_at(now);
    Ok(Some(RunningTimer {
        entry,
        task,
        elapsed_minutes,
    }))
}

/// Starts a timer now, atomically.
pub fn start_timer<S: Store>(store: &mut S, user: &UserId, task: &TaskId) -> Result<StartedTimer> {
    let started = store.atomically(|repos| start_timer_at(repos, user, task, types::now()))?;
    for previous in &started.stopped {
        tracing::info!(
            task_id = %previous.task_id,
            duration = previous.duration,
            "stopped running timer"
        );
    }
    tracing::info!(%task, entry_id = %started.entry.id, "timer started");
    Ok(started)
}

/// Stops the running timer now, atomically.
pub fn stop_timer<S: Store>(store: &mut S, user: &UserId, task: &TaskId) -> Result<StoppedTimer> {
    let stopped = store.atomically(|repos| stop_timer_at(repos, user, task, types::now()))?;
    tracing::info!(%task, duration = stopped.duration, "timer stopped");
    Ok(stopped)
}

/// The user's running timer as of now.
pub fn running_timer<S: Store>(store: &S, user: &UserId) -> Result<Option<RunningTimer>> {
    running_timer_at(store, user, types::now())
}
