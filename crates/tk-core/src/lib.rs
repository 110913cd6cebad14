//! Domain logic for the task clock.
//!
//! This crate contains the types and use cases for:
//! - Timers: starting and stopping task timers under the one-active-timer rules
//! - Dashboard: per-user task and time statistics
//! - Users, projects and tasks: creation, editing and filtered listing
//! - Time entries: history and weekly summaries
//!
//! Storage is abstracted behind the traits in [`repository`]; the `tk-db`
//! crate provides the `SQLite` implementation.

mod access;
pub mod dashboard;
pub mod entries;
pub mod error;
pub mod model;
pub mod projects;
pub mod repository;
pub mod tasks;
pub mod timer;
pub mod types;
pub mod users;

#[cfg(test)]
mod testing;

pub use dashboard::{DashboardOverview, overview};
pub use error::{Error, Result, StoreError};
pub use model::{Project, ProjectWithStats, Task, TimeEntry, User};
pub use repository::{Repositories, Store};
pub use timer::{RunningTimer, StartedTimer, StoppedTimer, TimerError};
pub use types::{ProjectId, TaskId, TaskStatus, TimeEntryId, UserId, ValidationError};
