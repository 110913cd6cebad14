//! `tk task` subcommands: create, edit, delete and list.

use std::fmt::Write;

use anyhow::Result;
use tk_core::tasks::{
    NewTask, TaskChanges, TaskQuery, create_task, delete_task, edit_task, list_tasks,
};
use tk_core::{ProjectId, Task, TaskId, TaskStatus, User, ValidationError};
use tk_db::Database;

use super::util::{Deleted, format_estimate, format_minutes, to_json, truncate};

const TITLE_WIDTH: usize = 24;

pub fn build_query(
    search: Option<String>,
    status: Option<TaskStatus>,
    project: Option<&str>,
) -> Result<TaskQuery, ValidationError> {
    Ok(TaskQuery {
        search,
        status,
        project_id: project.map(ProjectId::new).transpose()?,
    })
}

/// One-line confirmation for a created, updated or deleted task.
pub fn format_saved(verb: &str, task: &Task) -> String {
    format!("{verb} task {} ({})\n", task.title, task.id)
}

/// Format tasks as a table.
pub fn format_task_table(tasks: &[Task]) -> String {
    let mut output = String::new();

    if tasks.is_empty() {
        writeln!(output, "No tasks found.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<TITLE_WIDTH$}  {:<11}  {:>9}  {:>8}  ID",
        "TITLE", "STATUS", "ESTIMATED", "SPENT"
    )
    .unwrap();
    for task in tasks {
        writeln!(
            output,
            "{:<TITLE_WIDTH$}  {:<11}  {:>9}  {:>8}  {}",
            truncate(&task.title, TITLE_WIDTH),
            task.status.as_str(),
            format_estimate(task.estimated_time),
            format_minutes(task.spent_time),
            task.id
        )
        .unwrap();
    }

    output
}

fn print_saved(verb: &str, task: &Task, json: bool) -> Result<()> {
    if json {
        println!("{}", to_json(task)?);
    } else {
        print!("{}", format_saved(verb, task));
    }
    Ok(())
}

pub fn create(
    db: &mut Database,
    me: &User,
    project_id: &str,
    input: &NewTask,
    json: bool,
) -> Result<()> {
    let project_id = ProjectId::new(project_id)?;
    let task = create_task(db, &me.id, &project_id, input)?;
    print_saved("Created", &task, json)
}

pub fn edit(
    db: &mut Database,
    me: &User,
    id: &str,
    changes: &TaskChanges,
    json: bool,
) -> Result<()> {
    let id = TaskId::new(id)?;
    let task = edit_task(db, &me.id, &id, changes)?;
    print_saved("Updated", &task, json)
}

pub fn delete(db: &mut Database, me: &User, id: &str, json: bool) -> Result<()> {
    let id = TaskId::new(id)?;
    let task = delete_task(db, &me.id, &id)?;
    if json {
        println!(
            "{}",
            to_json(&Deleted {
                deleted: task.id.as_str()
            })?
        );
    } else {
        print!("{}", format_saved("Deleted", &task));
    }
    Ok(())
}

pub fn list(db: &Database, me: &User, query: TaskQuery, json: bool) -> Result<()> {
    let tasks = list_tasks(db, &me.id, query)?;
    if json {
        println!("{}", to_json(&tasks)?);
    } else {
        print!("{}", format_task_table(&tasks));
    }
    Ok(())
}
