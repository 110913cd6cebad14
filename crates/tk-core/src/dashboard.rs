//! Dashboard aggregation over a user's projects and tasks.
//!
//! [`aggregate`] is a pure function over repository query results; [`overview`]
//! gathers those results for one user in a single unit of work, so every figure
//! comes from the same state of the store.

use serde::Serialize;

use crate::access;
use crate::error::Result;
use crate::model::{ProjectTime, TimeTotals};
use crate::repository::{Repositories, Store};
use crate::types::{ProjectId, TaskStatus, UserId};

/// Raw query results the dashboard is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardInputs {
    /// `(status, count)` pairs; statuses may be missing or repeated.
    pub status_counts: Vec<(TaskStatus, u64)>,
    pub totals: TimeTotals,
    pub projects: Vec<ProjectTime>,
    pub total_projects: u64,
    pub total_tasks: u64,
}

/// Task counts per status. Every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub todo: u64,
    pub in_progress: u64,
    pub done: u64,
}

impl StatusCounts {
    const fn add(&mut self, status: TaskStatus, count: u64) {
        match status {
            TaskStatus::Todo => self.todo += count,
            TaskStatus::InProgress => self.in_progress += count,
            TaskStatus::Done => self.done += count,
        }
    }
}

/// Estimated versus spent time across all of a user's tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimeSummary {
    pub total_estimated_hours: f64,
    pub total_spent_hours: f64,
    /// Spent as a percentage of estimated, one decimal.
    pub estimated_vs_spent_ratio: f64,
}

/// Time spent on one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectTimeSummary {
    pub project_id: ProjectId,
    pub project_title: String,
    pub time_spent_hours: f64,
}

/// The dashboard view for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub tasks_by_status: StatusCounts,
    pub time_summary: TimeSummary,
    pub projects_time: Vec<ProjectTimeSummary>,
    pub total_projects: u64,
    pub total_tasks: u64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Minutes to hours, two decimals.
#[expect(
    clippy::cast_precision_loss,
    reason = "minute totals are far below 2^52"
)]
pub fn minutes_to_hours(minutes: i64) -> f64 {
    if minutes == 0 {
        return 0.0;
    }
    round_to(minutes as f64 / 60.0, 2)
}

/// Spent time as a percentage of the estimate, one decimal.
///
/// Defined as 0.0 when nothing was estimated or nothing was spent.
#[expect(
    clippy::cast_precision_loss,
    reason = "minute totals are far below 2^52"
)]
pub fn spent_ratio(spent_minutes: i64, estimated_minutes: i64) -> f64 {
    if estimated_minutes == 0 || spent_minutes == 0 {
        return 0.0;
    }
    round_to(spent_minutes as f64 / estimated_minutes as f64 * 100.0, 1)
}

/// Builds the dashboard from raw query results.
pub fn aggregate(inputs: DashboardInputs) -> DashboardOverview {
    let mut tasks_by_status = StatusCounts::default();
    for (status, count) in inputs.status_counts {
        tasks_by_status.add(status, count);
    }

    let TimeTotals {
        estimated_minutes,
        spent_minutes,
    } = inputs.totals;

    DashboardOverview {
        tasks_by_status,
        time_summary: TimeSummary {
            total_estimated_hours: minutes_to_hours(estimated_minutes),
            total_spent_hours: minutes_to_hours(spent_minutes),
            estimated_vs_spent_ratio: spent_ratio(spent_minutes, estimated_minutes),
        },
        projects_time: inputs
            .projects
            .into_iter()
            .map(|project| ProjectTimeSummary {
                project_id: project.project_id,
                project_title: project.title,
                time_spent_hours: minutes_to_hours(project.spent_minutes),
            })
            .collect(),
        total_projects: inputs.total_projects,
        total_tasks: inputs.total_tasks,
    }
}

/// Queries the repositories for everything the dashboard needs.
pub fn gather<R: Repositories>(repos: &R, user: &UserId) -> Result<DashboardInputs> {
    access::require_user(repos, user)?;
    Ok(DashboardInputs {
        status_counts: repos.task_status_counts(user)?,
        totals: repos.task_time_totals(user)?,
        projects: repos.project_time_spent(user)?,
        total_projects: repos.count_projects(user)?,
        total_tasks: repos.count_tasks(user)?,
    })
}

/// The dashboard overview for `user`.
pub fn overview<S: Store>(store: &mut S, user: &UserId) -> Result<DashboardOverview> {
    let inputs = store.atomically(|repos| gather(repos, user))?;
    tracing::debug!(%user, tasks = inputs.total_tasks, "computed dashboard");
    Ok(aggregate(inputs))
}
