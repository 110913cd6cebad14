//! Repository traits: the seam between the use cases and the entity store.
//!
//! One trait per entity. A storage backend implements all four on a single
//! handle type and [`Store`] on top, which adds the atomic unit of work the
//! timer operations need.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{
    Project, ProjectFilter, ProjectTime, ProjectWithStats, Task, TaskFilter, TimeEntry, TimeTotals,
    User,
};
use crate::types::{ProjectId, TaskId, TaskStatus, UserId};

/// Result type returned by repository methods.
pub type StoreResult<T> = Result<T, StoreError>;

/// User lookups and registration.
pub trait UserRepository {
    fn user_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    fn username_exists(&self, username: &str) -> StoreResult<bool>;

    fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Inserts a user. Duplicate usernames or emails yield [`StoreError::Conflict`]
    /// whose message names the column, `users.username` or `users.email`.
    fn insert_user(&self, user: &User) -> StoreResult<()>;
}

/// Project persistence and per-owner queries.
pub trait ProjectRepository {
    fn project_by_id(&self, id: &ProjectId) -> StoreResult<Option<Project>>;

    /// Projects owned by `owner`, newest first, with task statistics.
    fn projects_by_owner(
        &self,
        owner: &UserId,
        filter: &ProjectFilter,
    ) -> StoreResult<Vec<ProjectWithStats>>;

    fn count_projects(&self, owner: &UserId) -> StoreResult<u64>;

    /// Spent minutes per project owned by `owner`, including projects with no tasks.
    fn project_time_spent(&self, owner: &UserId) -> StoreResult<Vec<ProjectTime>>;

    fn insert_project(&self, project: &Project) -> StoreResult<()>;

    /// Writes title, description and `updated_at`. The owner never changes.
    fn update_project(&self, project: &Project) -> StoreResult<()>;

    /// Deletes the project together with its tasks and their time entries.
    fn delete_project(&self, id: &ProjectId) -> StoreResult<()>;
}

/// Task persistence and per-owner aggregates.
pub trait TaskRepository {
    fn task_by_id(&self, id: &TaskId) -> StoreResult<Option<Task>>;

    /// Tasks across every project owned by `owner`, newest first.
    fn tasks_by_owner(&self, owner: &UserId, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    /// `(status, count)` pairs for statuses that have at least one task.
    fn task_status_counts(&self, owner: &UserId) -> StoreResult<Vec<(TaskStatus, u64)>>;

    fn task_time_totals(&self, owner: &UserId) -> StoreResult<TimeTotals>;

    fn count_tasks(&self, owner: &UserId) -> StoreResult<u64>;

    fn insert_task(&self, task: &Task) -> StoreResult<()>;

    /// Writes the editable fields (title, description, status, estimate).
    ///
    /// `spent_time` and `project_id` are never written by this method.
    fn update_task(&self, task: &Task) -> StoreResult<()>;

    /// Adds `minutes` to the task's spent time.
    fn add_spent_time(&self, id: &TaskId, minutes: i64) -> StoreResult<()>;

    /// Deletes the task together with its time entries.
    fn delete_task(&self, id: &TaskId) -> StoreResult<()>;
}

/// Time entry persistence.
pub trait TimeEntryRepository {
    /// The running entry on `task`, whoever owns it.
    fn active_entry_for_task(&self, task: &TaskId) -> StoreResult<Option<TimeEntry>>;

    /// The running entry on `task` owned by `user`.
    fn active_entry_for_task_and_user(
        &self,
        task: &TaskId,
        user: &UserId,
    ) -> StoreResult<Option<TimeEntry>>;

    /// Every running entry owned by `user`, across all tasks.
    fn active_entries_for_user(&self, user: &UserId) -> StoreResult<Vec<TimeEntry>>;

    /// Inserts an entry. A second active entry for the same user or task
    /// yields [`StoreError::Conflict`].
    fn insert_entry(&self, entry: &TimeEntry) -> StoreResult<()>;

    /// Persists the closing of a previously active entry.
    fn close_entry(&self, entry: &TimeEntry) -> StoreResult<()>;

    /// Entries on tasks owned by `user`, most recent start first.
    fn entries_for_owner(
        &self,
        user: &UserId,
        task: Option<&TaskId>,
    ) -> StoreResult<Vec<TimeEntry>>;

    /// Completed entries on tasks owned by `user` whose start lies in `[start, end)`.
    fn completed_entries_between(
        &self,
        user: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<TimeEntry>>;
}

/// Everything a use case may query or write.
pub trait Repositories:
    UserRepository + ProjectRepository + TaskRepository + TimeEntryRepository
{
}

impl<T> Repositories for T where
    T: UserRepository + ProjectRepository + TaskRepository + TimeEntryRepository
{
}

/// An entity store: the repositories plus an atomic unit of work.
pub trait Store: Repositories {
    /// Runs `f` as one atomic unit of work against this store.
    ///
    /// Writes made by `f` are committed only if it returns `Ok`; otherwise
    /// they are rolled back. Implementations must serialize concurrent units
    /// of work against the same store, including across processes.
    fn atomically<T, F>(&mut self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Self) -> crate::Result<T>;
}
