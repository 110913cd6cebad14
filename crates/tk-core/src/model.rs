//! Domain records for users, projects, tasks and time entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, TaskId, TaskStatus, TimeEntryId, UserId};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// A project owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with aggregate statistics over its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithStats {
    #[serde(flatten)]
    pub project: Project,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Sum of the tasks' estimates in minutes (missing estimates count as 0).
    pub total_estimated_time: i64,
    /// Sum of the tasks' spent time in minutes.
    pub total_spent_time: i64,
}

/// A unit of work inside a project.
///
/// `spent_time` only ever grows, and only when a timer on the task stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Estimate in minutes.
    pub estimated_time: Option<i64>,
    /// Accumulated minutes across completed time entries.
    pub spent_time: i64,
    pub project_id: ProjectId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One continuous interval a user spent on a task.
///
/// Created active (`end_time` and `duration` unset) and closed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes, set when the entry is closed.
    pub duration: Option<i64>,
    pub is_active: bool,
}

/// Filters for listing a user's projects. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    /// Only projects with at least one task in this status.
    pub task_status: Option<TaskStatus>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_until: Option<DateTime<Utc>>,
}

/// Filters for listing a user's tasks. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<ProjectId>,
}

/// Estimated and spent minute totals over a set of tasks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeTotals {
    pub estimated_minutes: i64,
    pub spent_minutes: i64,
}

/// Spent minutes summed over one project's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTime {
    pub project_id: ProjectId,
    pub title: String,
    pub spent_minutes: i64,
}
