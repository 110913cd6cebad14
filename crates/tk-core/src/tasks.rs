//! Task management inside the acting user's projects.

use chrono::{DateTime, Utc};

use crate::access;
use crate::error::Result;
use crate::model::{Task, TaskFilter};
use crate::repository::{Repositories, Store};
use crate::types::{self, ProjectId, TaskId, TaskStatus, UserId, require_text, validate_estimate};

const CREATE_DENIED: &str = "You are not authorized to create a task on this project";
const EDIT_DENIED: &str = "You are not authorized to edit this task";
const DELETE_DENIED: &str = "You are not authorized to delete this task";
const LIST_DENIED: &str = "You are not authorized to view this project";

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub estimated_time: Option<i64>,
}

/// Editable task fields. `None` leaves the field as it is.
///
/// `spent_time` and the project are not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub estimated_time: Option<i64>,
}

impl TaskChanges {
    const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.estimated_time.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub project_id: Option<ProjectId>,
}

/// Creates a task on an owned project at `now`.
pub fn create_task_at<R: Repositories>(
    repos: &R,
    user: &UserId,
    project: &ProjectId,
    input: &NewTask,
    now: DateTime<Utc>,
) -> Result<Task> {
    let project = access::owned_project(repos, user, project, CREATE_DENIED)?;
    let task = Task {
        id: TaskId::generate(),
        title: require_text(&input.title, "title")?,
        description: input.description.clone().unwrap_or_default(),
        status: input.status.unwrap_or_default(),
        estimated_time: validate_estimate(input.estimated_time)?,
        spent_time: 0,
        project_id: project.id,
        created_at: now,
        updated_at: now,
    };
    repos.insert_task(&task)?;
    Ok(task)
}

/// Applies `changes` to an owned task at `now`.
pub fn edit_task_at<R: Repositories>(
    repos: &R,
    user: &UserId,
    id: &TaskId,
    changes: &TaskChanges,
    now: DateTime<Utc>,
) -> Result<Task> {
    let mut task = access::owned_task(repos, user, id, EDIT_DENIED)?;
    if changes.is_empty() {
        return Ok(task);
    }

    if let Some(title) = &changes.title {
        task.title = require_text(title, "title")?;
    }
    if let Some(description) = &changes.description {
        task.description.clone_from(description);
    }
    if let Some(status) = changes.status {
        task.status = status;
    }
    if changes.estimated_time.is_some() {
        task.estimated_time = validate_estimate(changes.estimated_time)?;
    }
    task.updated_at = now;
    repos.update_task(&task)?;
    Ok(task)
}

pub fn create_task<S: Store>(
    store: &mut S,
    user: &UserId,
    project: &ProjectId,
    input: &NewTask,
) -> Result<Task> {
    let task = store.atomically(|repos| create_task_at(repos, user, project, input, types::now()))?;
    tracing::info!(task_id = %task.id, project_id = %task.project_id, "task created");
    Ok(task)
}

pub fn edit_task<S: Store>(
    store: &mut S,
    user: &UserId,
    id: &TaskId,
    changes: &TaskChanges,
) -> Result<Task> {
    let task = store.atomically(|repos| edit_task_at(repos, user, id, changes, types::now()))?;
    tracing::info!(task_id = %task.id, status = %task.status, "task updated");
    Ok(task)
}

/// Deletes a task together with its time entries.
pub fn delete_task<S: Store>(store: &mut S, user: &UserId, id: &TaskId) -> Result<Task> {
    let task = store.atomically(|repos| {
        let task = access::owned_task(repos, user, id, DELETE_DENIED)?;
        repos.delete_task(&task.id)?;
        Ok(task)
    })?;
    tracing::info!(task_id = %task.id, "task deleted");
    Ok(task)
}

/// Tasks across the user's projects, newest first.
///
/// Restricting to a project checks that the project exists and is owned by
/// `user`.
pub fn list_tasks<S: Store>(store: &S, user: &UserId, query: TaskQuery) -> Result<Vec<Task>> {
    access::require_user(store, user)?;
    if let Some(project) = &query.project_id {
        access::owned_project(store, user, project, LIST_DENIED)?;
    }
    let filter = TaskFilter {
        search: query
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty()),
        status: query.status,
        project_id: query.project_id,
    };
    let tasks = store.tasks_by_owner(user, &filter)?;
    tracing::debug!(%user, count = tasks.len(), "listed tasks");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::error::Error;
    use crate::repository::TaskRepository;
    use crate::testing::{MemoryStore, t0};
    use crate::types::ValidationError;

    #[test]
    fn create_task_applies_defaults() {
        let store = MemoryStore::default();
        let alice = store.seed_user("alice");
        let project = store.seed_project(&alice, "Website", t0());
        let input = NewTask {
            title: " Landing page ".to_string(),
            estimated_time: Some(480),
            ..NewTask::default()
        };

        let task = create_task_at(&store, &alice.id, &project.id, &input, t0()).unwrap();
        assert_eq!(task.title, "Landing page");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.estimated_time, Some(480));
        assert_eq!(task.spent_time, 0);
        assert_eq!(task.project_id, project.id);
    }

    #[test]
    fn create_task_validates_input_and_ownership() {
        let store = MemoryStore::default();
        let alice = store.seed_user("alice");
        let mallory = store.seed_user("mallory");
        let project = store.seed_project(&alice, "Website", t0());

        let negative = NewTask {
            title: "Copy".to_string(),
            estimated_time: Some(-5),
            ..NewTask::default()
        };
        let err = create_task_at(&store, &alice.id, &project.id, &negative, t0()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NegativeEstimate { value: -5 })
        ));

        let input = NewTask {
            title: "Copy".to_string(),
            ..NewTask::default()
        };
        let err = create_task_at(&store, &mallory.id, &project.id, &input, t0()).unwrap_err();
        assert_eq!(err.to_string(), CREATE_DENIED);

        let missing = ProjectId::new("missing").unwrap();
        let err = create_task_at(&store, &alice.id, &missing, &input, t0()).unwrap_err();
        assert_eq!(err.to_string(), "Project not found: missing");
    }

    #[test]
    fn edit_never_touches_spent_time() {
        let mut store = MemoryStore::default();
        let alice = store.seed_user("alice");
        let project = store.seed_project(&alice, "Website", t0());
        let task = store.seed_task(&project, "Copy", TaskStatus::Todo, Some(60));
        store.atomically(|repos| {
            repos.add_spent_time(&task.id, 25)?;
            Ok(())
        })
        .unwrap();

        let changes = TaskChanges {
            status: Some(TaskStatus::Done),
            estimated_time: Some(90),
            ..TaskChanges::default()
        };
        let later = t0() + Duration::hours(2);
        let edited = edit_task_at(&store, &alice.id, &task.id, &changes, later).unwrap();
        assert_eq!(edited.status, TaskStatus::Done);
        assert_eq!(edited.estimated_time, Some(90));
        assert_eq!(edited.title, "Copy");
        assert_eq!(edited.spent_time, 25);
        assert_eq!(edited.updated_at, later);
        assert_eq!(store.task(&task.id), edited);
    }

    #[test]
    fn empty_edit_returns_the_task_unchanged() {
        let store = MemoryStore::default();
        let alice = store.seed_user("alice");
        let project = store.seed_project(&alice, "Website", t0());
        let task = store.seed_task(&project, "Copy", TaskStatus::Todo, None);

        let later = t0() + Duration::hours(1);
        let edited =
            edit_task_at(&store, &alice.id, &task.id, &TaskChanges::default(), later).unwrap();
        assert_eq!(edited, task);
    }

    #[test]
    fn only_the_owner_may_edit_or_delete() {
        let mut store = MemoryStore::default();
        let alice = store.seed_user("alice");
        let mallory = store.seed_user("mallory");
        let project = store.seed_project(&alice, "Website", t0());
        let task = store.seed_task(&project, "Copy", TaskStatus::Todo, None);

        let changes = TaskChanges {
            title: Some("Mine now".to_string()),
            ..TaskChanges::default()
        };
        let err = edit_task(&mut store, &mallory.id, &task.id, &changes).unwrap_err();
        assert_eq!(err.to_string(), EDIT_DENIED);
        let err = delete_task(&mut store, &mallory.id, &task.id).unwrap_err();
        assert_eq!(err.to_string(), DELETE_DENIED);

        delete_task(&mut store, &alice.id, &task.id).unwrap();
        assert_eq!(store.task_by_id(&task.id).unwrap(), None);
    }

    #[test]
    fn list_filters_and_checks_project_ownership() {
        let store = MemoryStore::default();
        let alice = store.seed_user("alice");
        let bob = store.seed_user("bob");
        let website = store.seed_project(&alice, "Website", t0());
        let api = store.seed_project(&alice, "API", t0());
        let foreign = store.seed_project(&bob, "Other", t0());
        store.seed_task(&website, "Copy", TaskStatus::Todo, None);
        store.seed_task(&website, "Images", TaskStatus::Done, None);
        store.seed_task(&api, "Auth", TaskStatus::Todo, None);
        store.seed_task(&foreign, "Unrelated", TaskStatus::Todo, None);

        let all = list_tasks(&store, &alice.id, TaskQuery::default()).unwrap();
        let titles: Vec<&str> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Auth", "Images", "Copy"]);

        let todo_on_website = TaskQuery {
            status: Some(TaskStatus::Todo),
            project_id: Some(website.id),
            ..TaskQuery::default()
        };
        let found = list_tasks(&store, &alice.id, todo_on_website).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Copy");

        let by_text = TaskQuery {
            search: Some("AUTH".to_string()),
            ..TaskQuery::default()
        };
        assert_eq!(list_tasks(&store, &alice.id, by_text).unwrap().len(), 1);

        let foreign_project = TaskQuery {
            project_id: Some(foreign.id),
            ..TaskQuery::default()
        };
        let err = list_tasks(&store, &alice.id, foreign_project).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
