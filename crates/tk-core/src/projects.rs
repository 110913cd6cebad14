//! Project management for the acting user.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::access;
use crate::error::Result;
use crate::model::{Project, ProjectFilter, ProjectWithStats};
use crate::repository::{Repositories, Store};
use crate::types::{self, ProjectId, TaskStatus, UserId, ValidationError, require_text};

const EDIT_DENIED: &str = "You are not authorized to edit this project";
const DELETE_DENIED: &str = "You are not authorized to delete this project";

/// Input for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
}

/// Fields to change on a project. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Listing filters as the user supplies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectQuery {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    /// First creation day to include.
    pub start_date: Option<NaiveDate>,
    /// Last creation day to include.
    pub end_date: Option<NaiveDate>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>, ValidationError> {
    let next = date
        .succ_opt()
        .ok_or(ValidationError::InvalidDate { field: "end_date" })?;
    Ok(start_of_day(next) - Duration::milliseconds(1))
}

impl ProjectQuery {
    /// Resolves the day bounds into an inclusive creation-time range.
    pub fn into_filter(self) -> Result<ProjectFilter, ValidationError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ValidationError::InvertedDateRange);
            }
        }
        Ok(ProjectFilter {
            search: self
                .search
                .map(|term| term.trim().to_string())
                .filter(|term| !term.is_empty()),
            task_status: self.status,
            created_from: self.start_date.map(start_of_day),
            created_until: self.end_date.map(end_of_day).transpose()?,
        })
    }
}

/// Creates a project owned by `owner` at `now`.
pub fn create_project_at<R: Repositories>(
    repos: &R,
    owner: &UserId,
    input: &NewProject,
    now: DateTime<Utc>,
) -> Result<Project> {
    access::require_user(repos, owner)?;
    let project = Project {
        id: ProjectId::generate(),
        title: require_text(&input.title, "title")?,
        description: input.description.clone().unwrap_or_default(),
        owner_id: owner.clone(),
        created_at: now,
        updated_at: now,
    };
    repos.insert_project(&project)?;
    Ok(project)
}

/// Applies `changes` to an owned project at `now`.
///
/// Returns the project untouched when nothing actually changes.
pub fn edit_project_at<R: Repositories>(
    repos: &R,
    owner: &UserId,
    id: &ProjectId,
    changes: &ProjectChanges,
    now: DateTime<Utc>,
) -> Result<Project> {
    let mut project = access::owned_project(repos, owner, id, EDIT_DENIED)?;
    let mut changed = false;

    if let Some(title) = &changes.title {
        let title = require_text(title, "title")?;
        if title != project.title {
            project.title = title;
            changed = true;
        }
    }
    if let Some(description) = &changes.description {
        if *description != project.description {
            project.description.clone_from(description);
            changed = true;
        }
    }

    if changed {
        project.updated_at = now;
        repos.update_project(&project)?;
    }
    Ok(project)
}

/// Creates a project.
pub fn create_project<S: Store>(
    store: &mut S,
    owner: &UserId,
    input: &NewProject,
) -> Result<Project> {
    let project = store.atomically(|repos| create_project_at(repos, owner, input, types::now()))?;
    tracing::info!(project_id = %project.id, %owner, "project created");
    Ok(project)
}

/// Edits a project.
pub fn edit_project<S: Store>(
    store: &mut S,
    owner: &UserId,
    id: &ProjectId,
    changes: &ProjectChanges,
) -> Result<Project> {
    let project =
        store.atomically(|repos| edit_project_at(repos, owner, id, changes, types::now()))?;
    tracing::info!(project_id = %project.id, "project updated");
    Ok(project)
}

/// Deletes a project with its tasks and their time entries.
pub fn delete_project<S: Store>(store: &mut S, owner: &UserId, id: &ProjectId) -> Result<Project> {
    let project = store.atomically(|repos| {
        let project = access::owned_project(repos, owner, id, DELETE_DENIED)?;
        repos.delete_project(&project.id)?;
        Ok(project)
    })?;
    tracing::info!(project_id = %project.id, "project deleted");
    Ok(project)
}

/// The owner's projects, newest first, with task statistics.
pub fn list_projects<S: Store>(
    store: &S,
    owner: &UserId,
    query: ProjectQuery,
) -> Result<Vec<ProjectWithStats>> {
    let filter = query.into_filter()?;
    access::require_user(store, owner)?;
    let projects = store.projects_by_owner(owner, &filter)?;
    tracing::debug!(%owner, count = projects.len(), "listed projects");
    Ok(projects)
}
