//! Storage layer for the task clock.
//!
//! Provides persistence for users, projects, tasks and time entries using
//! `rusqlite`, and implements the `tk-core` repository traits on [`Database`].
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared across
//! threads without external synchronization. Separate processes may open the same
//! file: [`Store::atomically`] takes the write lock up front (`BEGIN IMMEDIATE`), and
//! concurrent writers wait up to [`BUSY_TIMEOUT`] for it.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2025-03-10T09:00:00.000Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Active Timers
//!
//! Two partial unique indexes on `time_entries` allow at most one active entry
//! per user and at most one per task. A second active insert fails with a
//! constraint violation, reported as [`StoreError::Conflict`].

mod queries;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;

use tk_core::model::{
    Project, ProjectFilter, ProjectTime, ProjectWithStats, Task, TaskFilter, TimeEntry,
    TimeTotals, User,
};
use tk_core::repository::{
    ProjectRepository, Store, StoreResult, TaskRepository, TimeEntryRepository, UserRepository,
};
use tk_core::{ProjectId, StoreError, TaskId, TaskStatus, UserId};

/// How long a writer waits for another connection's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for {id}: {timestamp}")]
    TimestampParse {
        id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored value does not decode into its domain type.
    #[error("invalid value in column {column}: {value:?}")]
    InvalidColumn { column: &'static str, value: String },
}

impl DbError {
    const fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation() {
            return Self::Conflict(err.to_string());
        }
        Self::backend(err)
    }
}

fn store_error(err: rusqlite::Error) -> tk_core::Error {
    StoreError::from(DbError::from(err)).into()
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                owner_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id);
            CREATE INDEX IF NOT EXISTS idx_projects_created ON projects(created_at);

            -- status: one of 'todo', 'in_progress', 'done'
            -- estimated_time, spent_time: minutes
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'todo'
                    CHECK (status IN ('todo', 'in_progress', 'done')),
                estimated_time INTEGER CHECK (estimated_time >= 0),
                spent_time INTEGER NOT NULL DEFAULT 0,
                project_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

            -- duration: whole minutes, set when the entry is closed
            CREATE TABLE IF NOT EXISTS time_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                task_id TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration INTEGER,
                is_active INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_task ON time_entries(task_id);
            CREATE INDEX IF NOT EXISTS idx_time_entries_start ON time_entries(start_time);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_active_user
                ON time_entries(user_id) WHERE is_active = 1;
            CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_active_task
                ON time_entries(task_id) WHERE is_active = 1;
            ",
        )?;
        Ok(())
    }
}

fn parse_timestamp(timestamp: &str, id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Store for Database {
    fn atomically<T, F>(&mut self, f: F) -> tk_core::Result<T>
    where
        F: FnOnce(&Self) -> tk_core::Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(store_error)?;
        let value = f(&*self)?;
        tx.commit().map_err(store_error)?;
        Ok(value)
    }
}

impl UserRepository for Database {
    fn user_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(queries::user_by_id(&self.conn, id)?)
    }

    fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(queries::user_by_username(&self.conn, username)?)
    }

    fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(queries::username_exists(&self.conn, username)?)
    }

    fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(queries::email_exists(&self.conn, email)?)
    }

    fn insert_user(&self, user: &User) -> StoreResult<()> {
        Ok(queries::insert_user(&self.conn, user)?)
    }
}

impl ProjectRepository for Database {
    fn project_by_id(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        Ok(queries::project_by_id(&self.conn, id)?)
    }

    fn projects_by_owner(
        &self,
        owner: &UserId,
        filter: &ProjectFilter,
    ) -> StoreResult<Vec<ProjectWithStats>> {
        Ok(queries::projects_by_owner(&self.conn, owner, filter)?)
    }

    fn count_projects(&self, owner: &UserId) -> StoreResult<u64> {
        Ok(queries::count_projects(&self.conn, owner)?)
    }

    fn project_time_spent(&self, owner: &UserId) -> StoreResult<Vec<ProjectTime>> {
        Ok(queries::project_time_spent(&self.conn, owner)?)
    }

    fn insert_project(&self, project: &Project) -> StoreResult<()> {
        Ok(queries::insert_project(&self.conn, project)?)
    }

    fn update_project(&self, project: &Project) -> StoreResult<()> {
        Ok(queries::update_project(&self.conn, project)?)
    }

    fn delete_project(&self, id: &ProjectId) -> StoreResult<()> {
        Ok(queries::delete_project(&self.conn, id)?)
    }
}

impl TaskRepository for Database {
    fn task_by_id(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        Ok(queries::task_by_id(&self.conn, id)?)
    }

    fn tasks_by_owner(&self, owner: &UserId, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(queries::tasks_by_owner(&self.conn, owner, filter)?)
    }

    fn task_status_counts(&self, owner: &UserId) -> StoreResult<Vec<(TaskStatus, u64)>> {
        Ok(queries::task_status_counts(&self.conn, owner)?)
    }

    fn task_time_totals(&self, owner: &UserId) -> StoreResult<TimeTotals> {
        Ok(queries::task_time_totals(&self.conn, owner)?)
    }

    fn count_tasks(&self, owner: &UserId) -> StoreResult<u64> {
        Ok(queries::count_tasks(&self.conn, owner)?)
    }

    fn insert_task(&self, task: &Task) -> StoreResult<()> {
        Ok(queries::insert_task(&self.conn, task)?)
    }

    fn update_task(&self, task: &Task) -> StoreResult<()> {
        Ok(queries::update_task(&self.conn, task)?)
    }

    fn add_spent_time(&self, id: &TaskId, minutes: i64) -> StoreResult<()> {
        Ok(queries::add_spent_time(&self.conn, id, minutes)?)
    }

    fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        Ok(queries::delete_task(&self.conn, id)?)
    }
}

impl TimeEntryRepository for Database {
    fn active_entry_for_task(&self, task: &TaskId) -> StoreResult<Option<TimeEntry>> {
        Ok(queries::active_entry_for_task(&self.conn, task)?)
    }

    fn active_entry_for_task_and_user(
        &self,
        task: &TaskId,
        user: &UserId,
    ) -> StoreResult<Option<TimeEntry>> {
        Ok(queries::active_entry_for_task_and_user(&self.conn, task, user)?)
    }

    fn active_entries_for_user(&self, user: &UserId) -> StoreResult<Vec<TimeEntry>> {
        Ok(queries::active_entries_for_user(&self.conn, user)?)
    }

    fn insert_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        Ok(queries::insert_entry(&self.conn, entry)?)
    }

    fn close_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        Ok(queries::close_entry(&self.conn, entry)?)
    }

    fn entries_for_owner(
        &self,
        user: &UserId,
        task: Option<&TaskId>,
    ) -> StoreResult<Vec<TimeEntry>> {
        Ok(queries::entries_for_owner(&self.conn, user, task)?)
    }

    fn completed_entries_between(
        &self,
        user: &UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<TimeEntry>> {
        Ok(queries::completed_entries_between(&self.conn, user, start, end)?)
    }
}
