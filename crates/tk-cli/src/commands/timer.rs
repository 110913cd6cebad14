//! `tk timer` subcommands: start, stop and status.

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tk_core::repository::TaskRepository;
use tk_core::timer::{running_timer, start_timer, stop_timer};
use tk_core::{RunningTimer, StartedTimer, StoppedTimer, TaskId, User};
use tk_db::Database;

use super::util::{format_minutes, to_json};

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn format_stopped(stopped: &StoppedTimer) -> String {
    format!(
        "Stopped {} after {}\n",
        stopped.task,
        format_minutes(stopped.duration)
    )
}

/// Reports the timers that were stopped, then the new one.
pub fn format_started(started: &StartedTimer, task_title: &str) -> String {
    let mut output = String::new();
    for previous in &started.stopped {
        output.push_str(&format_stopped(previous));
    }
    writeln!(
        output,
        "Started timer on {task_title} at {}",
        format_time(started.entry.start_time)
    )
    .unwrap();
    output
}

pub fn format_status(running: Option<&RunningTimer>) -> String {
    running.map_or_else(
        || "No timer running.\n".to_string(),
        |running| {
            format!(
                "{} running for {} (since {})\n",
                running.task,
                format_minutes(running.elapsed_minutes),
                format_time(running.entry.start_time)
            )
        },
    )
}

pub fn start(db: &mut Database, me: &User, task_id: &str, json: bool) -> Result<()> {
    let task_id = TaskId::new(task_id)?;
    let started = start_timer(db, &me.id, &task_id)?;
    if json {
        println!("{}", to_json(&started.entry)?);
        return Ok(());
    }

    let title = db
        .task_by_id(&task_id)?
        .map(|task| task.title)
        .unwrap_or_default();
    print!("{}", format_started(&started, &title));
    Ok(())
}

pub fn stop(db: &mut Database, me: &User, task_id: &str, json: bool) -> Result<()> {
    let task_id = TaskId::new(task_id)?;
    let stopped = stop_timer(db, &me.id, &task_id)?;
    if json {
        println!("{}", to_json(&stopped)?);
    } else {
        print!("{}", format_stopped(&stopped));
    }
    Ok(())
}

pub fn status(db: &Database, me: &User, json: bool) -> Result<()> {
    let running = running_timer(db, &me.id)?;
    if json {
        println!("{}", to_json(&running)?);
    } else {
        print!("{}", format_status(running.as_ref()));
    }
    Ok(())
}
