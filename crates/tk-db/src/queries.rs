//! SQL statements and row decoding for every table.
//!
//! Rows are read into plain string records first and decoded afterwards, so
//! that a malformed value is reported as a [`DbError`] naming the column
//! instead of a generic conversion failure.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use tk_core::model::{
    Project, ProjectFilter, ProjectTime, ProjectWithStats, Task, TaskFilter, TimeEntry,
    TimeTotals, User,
};
use tk_core::{ProjectId, TaskId, TaskStatus, UserId, ValidationError};

use crate::{DbError, format_timestamp, parse_timestamp};

fn decode_id<T>(value: String, column: &'static str) -> Result<T, DbError>
where
    T: TryFrom<String, Error = ValidationError>,
{
    T::try_from(value.clone()).map_err(|_| DbError::InvalidColumn { column, value })
}

fn decode_status(value: &str) -> Result<TaskStatus, DbError> {
    value.parse().map_err(|_| DbError::InvalidColumn {
        column: "status",
        value: value.to_string(),
    })
}

// Users

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, created_at";

struct UserRow {
    id: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<User, DbError> {
        let created_at = parse_timestamp(&self.created_at, &self.id)?;
        Ok(User {
            id: decode_id(self.id, "users.id")?,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at,
        })
    }
}

fn find_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    conn.query_row(&sql, [value], UserRow::from_row)
        .optional()?
        .map(UserRow::decode)
        .transpose()
}

pub fn user_by_id(conn: &Connection, id: &UserId) -> Result<Option<User>, DbError> {
    find_user(conn, "id", id.as_str())
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DbError> {
    find_user(conn, "username", username)
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool, DbError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [username],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DbError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO users (id, username, email, first_name, last_name, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            user.id.as_str(),
            user.username,
            user.email,
            user.first_name,
            user.last_name,
            format_timestamp(user.created_at),
        ],
    )?;
    Ok(())
}

// Projects

const PROJECT_COLUMNS: &str =
    "p.id, p.title, p.description, p.owner_id, p.created_at, p.updated_at";

struct ProjectRow {
    id: String,
    title: String,
    description: String,
    owner_id: String,
    created_at: String,
    updated_at: String,
}

impl ProjectRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            owner_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<Project, DbError> {
        let created_at = parse_timestamp(&self.created_at, &self.id)?;
        let updated_at = parse_timestamp(&self.updated_at, &self.id)?;
        Ok(Project {
            id: decode_id(self.id, "projects.id")?,
            title: self.title,
            description: self.description,
            owner_id: decode_id(self.owner_id, "projects.owner_id")?,
            created_at,
            updated_at,
        })
    }
}

pub fn project_by_id(conn: &Connection, id: &ProjectId) -> Result<Option<Project>, DbError> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?1");
    conn.query_row(&sql, [id.as_str()], ProjectRow::from_row)
        .optional()?
        .map(ProjectRow::decode)
        .transpose()
}

pub fn projects_by_owner(
    conn: &Connection,
    owner: &UserId,
    filter: &ProjectFilter,
) -> Result<Vec<ProjectWithStats>, DbError> {
    let sql = format!(
        "
        SELECT {PROJECT_COLUMNS},
            COUNT(t.id),
            COALESCE(SUM(CASE WHEN t.status = 'done' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(t.estimated_time), 0),
            COALESCE(SUM(t.spent_time), 0)
        FROM projects p
        LEFT JOIN tasks t ON t.project_id = p.id
        WHERE p.owner_id = ?1
            AND (?2 IS NULL
                OR instr(lower(p.title), lower(?2)) > 0
                OR instr(lower(p.description), lower(?2)) > 0)
            AND (?3 IS NULL OR EXISTS (
                SELECT 1 FROM tasks s WHERE s.project_id = p.id AND s.status = ?3))
            AND (?4 IS NULL OR p.created_at >= ?4)
            AND (?5 IS NULL OR p.created_at <= ?5)
        GROUP BY p.id
        ORDER BY p.created_at DESC, p.id DESC
        "
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            owner.as_str(),
            filter.search,
            filter.task_status.as_ref().map(TaskStatus::as_str),
            filter.created_from.map(format_timestamp),
            filter.created_until.map(format_timestamp),
        ],
        |row| {
            Ok((
                ProjectRow::from_row(row)?,
                row.get::<_, u64>(6)?,
                row.get::<_, u64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, i64>(9)?,
            ))
        },
    )?;
    let mut projects = Vec::new();
    for row in rows {
        let (project, total_tasks, completed_tasks, total_estimated_time, total_spent_time) = row?;
        projects.push(ProjectWithStats {
            project: project.decode()?,
            total_tasks,
            completed_tasks,
            total_estimated_time,
            total_spent_time,
        });
    }
    Ok(projects)
}

pub fn count_projects(conn: &Connection, owner: &UserId) -> Result<u64, DbError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM projects WHERE owner_id = ?1",
        [owner.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn project_time_spent(conn: &Connection, owner: &UserId) -> Result<Vec<ProjectTime>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT p.id, p.title, COALESCE(SUM(t.spent_time), 0)
        FROM projects p
        LEFT JOIN tasks t ON t.project_id = p.id
        WHERE p.owner_id = ?1
        GROUP BY p.id
        ORDER BY p.created_at DESC, p.id DESC
        ",
    )?;
    let rows = stmt.query_map([owner.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;
    let mut projects = Vec::new();
    for row in rows {
        let (id, title, spent_minutes) = row?;
        projects.push(ProjectTime {
            project_id: decode_id(id, "projects.id")?,
            title,
            spent_minutes,
        });
    }
    Ok(projects)
}

pub fn insert_project(conn: &Connection, project: &Project) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO projects (id, title, description, owner_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            project.id.as_str(),
            project.title,
            project.description,
            project.owner_id.as_str(),
            format_timestamp(project.created_at),
            format_timestamp(project.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_project(conn: &Connection, project: &Project) -> Result<(), DbError> {
    conn.execute(
        "UPDATE projects SET title = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            project.id.as_str(),
            project.title,
            project.description,
            format_timestamp(project.updated_at),
        ],
    )?;
    Ok(())
}

pub fn delete_project(conn: &Connection, id: &ProjectId) -> Result<(), DbError> {
    conn.execute("DELETE FROM projects WHERE id = ?1", [id.as_str()])?;
    Ok(())
}

// Tasks

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, t.estimated_time, \
    t.spent_time, t.project_id, t.created_at, t.updated_at";

struct TaskRow {
    id: String,
    title: String,
    description: String,
    status: String,
    estimated_time: Option<i64>,
    spent_time: i64,
    project_id: String,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            estimated_time: row.get(4)?,
            spent_time: row.get(5)?,
            project_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<Task, DbError> {
        let created_at = parse_timestamp(&self.created_at, &self.id)?;
        let updated_at = parse_timestamp(&self.updated_at, &self.id)?;
        Ok(Task {
            status: decode_status(&self.status)?,
            id: decode_id(self.id, "tasks.id")?,
            title: self.title,
            description: self.description,
            estimated_time: self.estimated_time,
            spent_time: self.spent_time,
            project_id: decode_id(self.project_id, "tasks.project_id")?,
            created_at,
            updated_at,
        })
    }
}

pub fn task_by_id(conn: &Connection, id: &TaskId) -> Result<Option<Task>, DbError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1");
    conn.query_row(&sql, [id.as_str()], TaskRow::from_row)
        .optional()?
        .map(TaskRow::decode)
        .transpose()
}

pub fn tasks_by_owner(
    conn: &Connection,
    owner: &UserId,
    filter: &TaskFilter,
) -> Result<Vec<Task>, DbError> {
    let sql = format!(
        "
        SELECT {TASK_COLUMNS}
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE p.owner_id = ?1
            AND (?2 IS NULL
                OR instr(lower(t.title), lower(?2)) > 0
                OR instr(lower(t.description), lower(?2)) > 0)
            AND (?3 IS NULL OR t.status = ?3)
            AND (?4 IS NULL OR t.project_id = ?4)
        ORDER BY t.created_at DESC, t.id DESC
        "
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            owner.as_str(),
            filter.search,
            filter.status.as_ref().map(TaskStatus::as_str),
            filter.project_id.as_ref().map(ProjectId::as_str),
        ],
        TaskRow::from_row,
    )?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?.decode()?);
    }
    Ok(tasks)
}

pub fn task_status_counts(
    conn: &Connection,
    owner: &UserId,
) -> Result<Vec<(TaskStatus, u64)>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT t.status, COUNT(*)
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE p.owner_id = ?1
        GROUP BY t.status
        ",
    )?;
    let rows = stmt.query_map([owner.as_str()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
    })?;
    let mut counts = Vec::new();
    for row in rows {
        let (status, count) = row?;
        counts.push((decode_status(&status)?, count));
    }
    Ok(counts)
}

pub fn task_time_totals(conn: &Connection, owner: &UserId) -> Result<TimeTotals, DbError> {
    let totals = conn.query_row(
        "
        SELECT COALESCE(SUM(t.estimated_time), 0), COALESCE(SUM(t.spent_time), 0)
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE p.owner_id = ?1
        ",
        [owner.as_str()],
        |row| {
            Ok(TimeTotals {
                estimated_minutes: row.get(0)?,
                spent_minutes: row.get(1)?,
            })
        },
    )?;
    Ok(totals)
}

pub fn count_tasks(conn: &Connection, owner: &UserId) -> Result<u64, DbError> {
    let count = conn.query_row(
        "
        SELECT COUNT(*)
        FROM tasks t
        JOIN projects p ON p.id = t.project_id
        WHERE p.owner_id = ?1
        ",
        [owner.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn insert_task(conn: &Connection, task: &Task) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO tasks
        (id, title, description, status, estimated_time, spent_time, project_id,
         created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
        params![
            task.id.as_str(),
            task.title,
            task.description,
            task.status.as_str(),
            task.estimated_time,
            task.spent_time,
            task.project_id.as_str(),
            format_timestamp(task.created_at),
            format_timestamp(task.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_task(conn: &Connection, task: &Task) -> Result<(), DbError> {
    conn.execute(
        "
        UPDATE tasks
        SET title = ?2, description = ?3, status = ?4, estimated_time = ?5, updated_at = ?6
        WHERE id = ?1
        ",
        params![
            task.id.as_str(),
            task.title,
            task.description,
            task.status.as_str(),
            task.estimated_time,
            format_timestamp(task.updated_at),
        ],
    )?;
    Ok(())
}

pub fn add_spent_time(conn: &Connection, id: &TaskId, minutes: i64) -> Result<(), DbError> {
    conn.execute(
        "UPDATE tasks SET spent_time = spent_time + ?2 WHERE id = ?1",
        params![id.as_str(), minutes],
    )?;
    Ok(())
}

pub fn delete_task(conn: &Connection, id: &TaskId) -> Result<(), DbError> {
    conn.execute("DELETE FROM tasks WHERE id = ?1", [id.as_str()])?;
    Ok(())
}

// Time entries

const ENTRY_COLUMNS: &str =
    "e.id, e.user_id, e.task_id, e.start_time, e.end_time, e.duration, e.is_active";

struct EntryRow {
    id: String,
    user_id: String,
    task_id: String,
    start_time: String,
    end_time: Option<String>,
    duration: Option<i64>,
    is_active: bool,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            task_id: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            duration: row.get(5)?,
            is_active: row.get(6)?,
        })
    }

    fn decode(self) -> Result<TimeEntry, DbError> {
        let start_time = parse_timestamp(&self.start_time, &self.id)?;
        let end_time = self
            .end_time
            .as_deref()
            .map(|value| parse_timestamp(value, &self.id))
            .transpose()?;
        Ok(TimeEntry {
            id: decode_id(self.id, "time_entries.id")?,
            user_id: decode_id(self.user_id, "time_entries.user_id")?,
            task_id: decode_id(self.task_id, "time_entries.task_id")?,
            start_time,
            end_time,
            duration: self.duration,
            is_active: self.is_active,
        })
    }
}

fn query_entries(
    conn: &Connection,
    condition: &str,
    order: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<TimeEntry>, DbError> {
    let sql = format!(
        "
        SELECT {ENTRY_COLUMNS}
        FROM time_entries e
        JOIN tasks t ON t.id = e.task_id
        JOIN projects p ON p.id = t.project_id
        WHERE {condition}
        ORDER BY {order}
        "
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, EntryRow::from_row)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?.decode()?);
    }
    Ok(entries)
}

pub fn active_entry_for_task(
    conn: &Connection,
    task: &TaskId,
) -> Result<Option<TimeEntry>, DbError> {
    let entries = query_entries(
        conn,
        "e.task_id = ?1 AND e.is_active = 1",
        "e.start_time DESC",
        [task.as_str()],
    )?;
    Ok(entries.into_iter().next())
}

pub fn active_entry_for_task_and_user(
    conn: &Connection,
    task: &TaskId,
    user: &UserId,
) -> Result<Option<TimeEntry>, DbError> {
    let entries = query_entries(
        conn,
        "e.task_id = ?1 AND e.user_id = ?2 AND e.is_active = 1",
        "e.start_time DESC",
        [task.as_str(), user.as_str()],
    )?;
    Ok(entries.into_iter().next())
}

pub fn active_entries_for_user(
    conn: &Connection,
    user: &UserId,
) -> Result<Vec<TimeEntry>, DbError> {
    query_entries(
        conn,
        "e.user_id = ?1 AND e.is_active = 1",
        "e.start_time ASC",
        [user.as_str()],
    )
}

pub fn insert_entry(conn: &Connection, entry: &TimeEntry) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO time_entries (id, user_id, task_id, start_time, end_time, duration, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ",
        params![
            entry.id.as_str(),
            entry.user_id.as_str(),
            entry.task_id.as_str(),
            format_timestamp(entry.start_time),
            entry.end_time.map(format_timestamp),
            entry.duration,
            entry.is_active,
        ],
    )?;
    Ok(())
}

pub fn close_entry(conn: &Connection, entry: &TimeEntry) -> Result<(), DbError> {
    conn.execute(
        "
        UPDATE time_entries
        SET end_time = ?2, duration = ?3, is_active = 0
        WHERE id = ?1 AND is_active = 1
        ",
        params![
            entry.id.as_str(),
            entry.end_time.map(format_timestamp),
            entry.duration,
        ],
    )?;
    Ok(())
}

pub fn entries_for_owner(
    conn: &Connection,
    user: &UserId,
    task: Option<&TaskId>,
) -> Result<Vec<TimeEntry>, DbError> {
    query_entries(
        conn,
        "p.owner_id = ?1 AND (?2 IS NULL OR e.task_id = ?2)",
        "e.start_time DESC, e.id DESC",
        params![user.as_str(), task.map(TaskId::as_str)],
    )
}

pub fn completed_entries_between(
    conn: &Connection,
    user: &UserId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TimeEntry>, DbError> {
    query_entries(
        conn,
        "p.owner_id = ?1 AND e.is_active = 0 AND e.start_time >= ?2 AND e.start_time < ?3",
        "e.start_time ASC, e.id ASC",
        params![
            user.as_str(),
            format_timestamp(start),
            format_timestamp(end),
        ],
    )
}
