//! Existence and ownership checks shared by the use cases.

use crate::error::{Error, Result};
use crate::model::{Project, Task, User};
use crate::repository::{ProjectRepository, TaskRepository, UserRepository};
use crate::types::{ProjectId, TaskId, UserId};

pub fn require_user<R>(repos: &R, id: &UserId) -> Result<User>
where
    R: UserRepository,
{
    repos
        .user_by_id(id)?
        .ok_or_else(|| Error::not_found("User", id))
}

/// Loads a project and checks that `user` owns it.
pub fn owned_project<R>(
    repos: &R,
    user: &UserId,
    id: &ProjectId,
    denied: &str,
) -> Result<Project>
where
    R: UserRepository + ProjectRepository,
{
    let project = repos
        .project_by_id(id)?
        .ok_or_else(|| Error::not_found("Project", id))?;
    require_user(repos, user)?;
    if project.owner_id != *user {
        return Err(Error::Unauthorized(denied.to_string()));
    }
    Ok(project)
}

/// Loads a task and checks that `user` owns the task's project.
pub fn owned_task<R>(repos: &R, user: &UserId, id: &TaskId, denied: &str) -> Result<Task>
where
    R: UserRepository + ProjectRepository + TaskRepository,
{
    let task = repos
        .task_by_id(id)?
        .ok_or_else(|| Error::not_found("Task", id))?;
    require_user(repos, user)?;
    let project = repos
        .project_by_id(&task.project_id)?
        .ok_or_else(|| Error::not_found("Project", &task.project_id))?;
    if project.owner_id != *user {
        return Err(Error::Unauthorized(denied.to_string()));
    }
    Ok(task)
}
