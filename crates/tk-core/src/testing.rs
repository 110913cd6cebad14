//! In-memory store used by the unit tests in this crate.

use std::cell::RefCell;
use std::cmp::Reverse;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::StoreError;
use crate::model::{
    Project, ProjectFilter, ProjectTime, ProjectWithStats, Task, TaskFilter, TimeEntry, TimeTotals,
    User,
};
use crate::repository::{
    ProjectRepository, Store, StoreResult, TaskRepository, TimeEntryRepository, UserRepository,
};
use crate::types::{ProjectId, TaskId, TaskStatus, UserId};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

#[derive(Debug, Default, Clone)]
struct State {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    entries: Vec<TimeEntry>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<State>,
}

impl Store for MemoryStore {
    fn atomically<T, F>(&mut self, f: F) -> crate::Result<T>
    where
        F: FnOnce(&Self) -> crate::Result<T>,
    {
        let snapshot = self.state.borrow().clone();
        let result = f(self);
        if result.is_err() {
            *self.state.borrow_mut() = snapshot;
        }
        result
    }
}

impl MemoryStore {
    pub fn seed_user(&self, username: &str) -> User {
        let user = User {
            id: UserId::new(format!("user-{username}")).unwrap(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
            created_at: t0(),
        };
        self.state.borrow_mut().users.push(user.clone());
        user
    }

    pub fn seed_project(&self, owner: &User, title: &str, created_at: DateTime<Utc>) -> Project {
        let project = Project {
            id: ProjectId::generate(),
            title: title.to_string(),
            description: String::new(),
            owner_id: owner.id.clone(),
            created_at,
            updated_at: created_at,
        };
        self.state.borrow_mut().projects.push(project.clone());
        project
    }

    pub fn seed_task(
        &self,
        project: &Project,
        title: &str,
        status: TaskStatus,
        estimated_time: Option<i64>,
    ) -> Task {
        let offset = i64::try_from(self.state.borrow().tasks.len()).unwrap();
        let created_at = t0() + Duration::seconds(offset);
        let task = Task {
            id: TaskId::generate(),
            title: title.to_string(),
            description: String::new(),
            status,
            estimated_time,
            spent_time: 0,
            project_id: project.id.clone(),
            created_at,
            updated_at: created_at,
        };
        self.state.borrow_mut().tasks.push(task.clone());
        task
    }

    pub fn task(&self, id: &TaskId) -> Task {
        self.task_by_id(id).unwrap().expect("task exists")
    }

    pub fn entries(&self) -> Vec<TimeEntry> {
        self.state.borrow().entries.clone()
    }
}

fn owner_of_task(state: &State, task: &Task) -> Option<UserId> {
    state
        .projects
        .iter()
        .find(|p| p.id == task.project_id)
        .map(|p| p.owner_id.clone())
}

fn owned_tasks(state: &State, owner: &UserId) -> Vec<Task> {
    state
        .tasks
        .iter()
        .filter(|t| owner_of_task(state, t).as_ref() == Some(owner))
        .cloned()
        .collect()
}

fn matches_search(title: &str, description: &str, search: Option<&String>) -> bool {
    search.is_none_or(|term| {
        let term = term.to_lowercase();
        title.to_lowercase().contains(&term) || description.to_lowercase().contains(&term)
    })
}

impl UserRepository for MemoryStore {
    fn user_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.state.borrow().users.iter().find(|u| u.id == *id).cloned())
    }

    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .borrow()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.user_by_username(username)?.is_some())
    }

    fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.state.borrow().users.iter().any(|u| u.email == email))
    }

    fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        let constraint = if state.users.iter().any(|u| u.username == user.username) {
            "users.username"
        } else if state.users.iter().any(|u| u.email == user.email) {
            "users.email"
        } else {
            state.users.push(user.clone());
            return Ok(());
        };
        Err(StoreError::Conflict(constraint.to_string()))
    }
}

impl ProjectRepository for MemoryStore {
    fn project_by_id(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        Ok(self
            .state
            .borrow()
            .projects
            .iter()
            .find(|p| p.id == *id)
            .cloned())
    }

    fn projects_by_owner(
        &self,
        owner: &UserId,
        filter: &ProjectFilter,
    ) -> StoreResult<Vec<ProjectWithStats>> {
        let state = self.state.borrow();
        let mut projects: Vec<ProjectWithStats> = state
            .projects
            .iter()
            .filter(|p| p.owner_id == *owner)
            .filter(|p| matches_search(&p.title, &p.description, filter.search.as_ref()))
            .filter(|p| filter.created_from.is_none_or(|from| p.created_at >= from))
            .filter(|p| filter.created_until.is_none_or(|until| p.created_at <= until))
            .filter(|p| {
                filter.task_status.is_none_or(|status| {
                    state
                        .tasks
                        .iter()
                        .any(|t| t.project_id == p.id && t.status == status)
                })
            })
            .map(|p| {
                let tasks: Vec<&Task> = state
                    .tasks
                    .iter()
                    .filter(|t| t.project_id == p.id)
                    .collect();
                ProjectWithStats {
                    project: p.clone(),
                    total_tasks: tasks.len() as u64,
                    completed_tasks: tasks
                        .iter()
                        .filter(|t| t.status == TaskStatus::Done)
                        .count() as u64,
                    total_estimated_time: tasks.iter().filter_map(|t| t.estimated_time).sum(),
                    total_spent_time: tasks.iter().map(|t| t.spent_time).sum(),
                }
            })
            .collect();
        projects.sort_by_key(|p| Reverse(p.project.created_at));
        Ok(projects)
    }

    fn count_projects(&self, owner: &UserId) -> StoreResult<u64> {
        Ok(self
            .state
            .borrow()
            .projects
            .iter()
            .filter(|p| p.owner_id == *owner)
            .count() as u64)
    }

    fn project_time_spent(&self, owner: &UserId) -> StoreResult<Vec<ProjectTime>> {
        let state = self.state.borrow();
        Ok(state
            .projects
            .iter()
            .filter(|p| p.owner_id == *owner)
            .map(|p| ProjectTime {
                project_id: p.id.clone(),
                title: p.title.clone(),
                spent_minutes: state
                    .tasks
                    .iter()
                    .filter(|t| t.project_id == p.id)
                    .map(|t| t.spent_time)
                    .sum(),
            })
            .collect())
    }

    fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.state.borrow_mut().projects.push(project.clone());
        Ok(())
    }

    fn update_project(&self, project: &Project) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.projects.iter_mut().find(|p| p.id == project.id) {
            existing.title.clone_from(&project.title);
            existing.description.clone_from(&project.description);
            existing.updated_at = project.updated_at;
        }
        Ok(())
    }

    fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        let task_ids: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|t| t.project_id == *id)
            .map(|t| t.id.clone())
            .collect();
        state.entries.retain(|e| !task_ids.contains(&e.task_id));
        state.tasks.retain(|t| t.project_id != *id);
        state.projects.retain(|p| p.id != *id);
        Ok(())
    }
}

impl TaskRepository for MemoryStore {
    fn task_by_id(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        Ok(self.state.borrow().tasks.iter().find(|t| t.id == *id).cloned())
    }

    fn tasks_by_owner(&self, owner: &UserId, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let state = self.state.borrow();
        let project = filter.project_id.as_ref();
        let mut tasks: Vec<Task> = owned_tasks(&state, owner)
            .into_iter()
            .filter(|t| matches_search(&t.title, &t.description, filter.search.as_ref()))
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| project.is_none_or(|p| t.project_id == *p))
            .collect();
        tasks.sort_by_key(|t| Reverse(t.created_at));
        Ok(tasks)
    }

    fn task_status_counts(&self, owner: &UserId) -> StoreResult<Vec<(TaskStatus, u64)>> {
        let state = self.state.borrow();
        let tasks = owned_tasks(&state, owner);
        Ok(TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let count = tasks.iter().filter(|t| t.status == status).count() as u64;
                (status, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect())
    }

    fn task_time_totals(&self, owner: &UserId) -> StoreResult<TimeTotals> {
        let state = self.state.borrow();
        let tasks = owned_tasks(&state, owner);
        Ok(TimeTotals {
            estimated_minutes: tasks.iter().filter_map(|t| t.estimated_time).sum(),
            spent_minutes: tasks.iter().map(|t| t.spent_time).sum(),
        })
    }

    fn count_tasks(&self, owner: &UserId) -> StoreResult<u64> {
        let state = self.state.borrow();
        Ok(owned_tasks(&state, owner).len() as u64)
    }

    fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.state.borrow_mut().tasks.push(task.clone());
        Ok(())
    }

    fn update_task(&self, task: &Task) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.tasks.iter_mut().find(|t| t.id == task.id) {
            existing.title.clone_from(&task.title);
            existing.description.clone_from(&task.description);
            existing.status = task.status;
            existing.estimated_time = task.estimated_time;
            existing.updated_at = task.updated_at;
        }
        Ok(())
    }

    fn add_spent_time(&self, id: &TaskId, minutes: i64) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.tasks.iter_mut().find(|t| t.id == *id) {
            existing.spent_time += minutes;
        }
        Ok(())
    }

    fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.entries.retain(|e| e.task_id != *id);
        state.tasks.retain(|t| t.id != *id);
        Ok(())
    }
}

impl TimeEntryRepository for MemoryStore {
    fn active_entry_for_task(&self, task: &TaskId) -> StoreResult<Option<TimeEntry>> {
        Ok(self
            .state
            .borrow()
            .entries
            .iter()
            .find(|e| e.is_active && e.task_id == *task)
            .cloned())
    }

    fn active_entry_for_task_and_user(
        &self,
        task: &TaskId,
        user: &UserId,
    ) -> StoreResult<Option<TimeEntry>> {
        Ok(self
            .state
            .borrow()
            .entries
            .iter()
            .find(|e| e.is_active && e.task_id == *task && e.user_id == *user)
            .cloned())
    }

    fn active_entries_for_user(&self, user: &UserId) -> StoreResult<Vec<TimeEntry>> {
        Ok(self
            .state
            .borrow()
            .entries
            .iter()
            .filter(|e| e.is_active && e.user_id == *user)
            .cloned()
            .collect())
    }

    fn insert_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if entry.is_active
            && state.entries.iter().any(|e| {
                e.is_active && (e.user_id == entry.user_id || e.task_id == entry.task_id)
            })
        {
            return Err(StoreError::Conflict("time_entries".to_string()));
        }
        state.entries.push(entry.clone());
        Ok(())
    }

    fn close_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id && e.is_active)
        {
            existing.end_time = entry.end_time;
            existing.duration = entry.duration;
            existing.is_active = false;
        }
        Ok(())
    }

    fn entries_for_owner(
        &self,
        user: &UserId,
        task: Option<&TaskId>,
    ) -> StoreResult<Vec<TimeEntry>> {
        let state = self.state.borrow();
        let owned: Vec<TaskId> = owned_tasks(&state, user)
            .into_iter()
            .map(|t| t.id)
            .collect();
        let mut entries: Vec<TimeEntry> = state
            .entries
            .iter()
            .filter(|e| owned.contains(&e.task_id))
            .filter(|e| task.is_none_or(|t| e.task_id == *t))
            .cloned()
            .collect();
        entries.sort_by_key(|e| Reverse(e.start_time));
        Ok(entries)
    }

    fn completed_entries_between(
        &self,
        user: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<TimeEntry>> {
        let mut entries: Vec<TimeEntry> = self
            .entries_for_owner(user, None)?
            .into_iter()
            .filter(|e| e.duration.is_some() && e.start_time >= start && e.start_time < end)
            .collect();
        entries.sort_by_key(|e| e.start_time);
        Ok(entries)
    }
}
