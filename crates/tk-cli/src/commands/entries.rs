//! Entries command listing time entries, most recent first.

use std::collections::HashMap;
use std::fmt::Write;

use anyhow::Result;
use tk_core::entries::list_entries;
use tk_core::repository::TaskRepository;
use tk_core::{TaskId, TimeEntry, User};
use tk_db::Database;

use super::util::{format_minutes, to_json, truncate};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format entries as a table, naming tasks from `titles`.
pub fn format_entries(entries: &[TimeEntry], titles: &HashMap<TaskId, String>) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No time entries.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<16}  {:<16}  {:>8}  TASK",
        "START", "END", "DURATION"
    )
    .unwrap();
    for entry in entries {
        let start = entry.start_time.format(TIME_FORMAT).to_string();
        let end = entry.end_time.map_or_else(
            || "running".to_string(),
            |end| end.format(TIME_FORMAT).to_string(),
        );
        let duration = entry
            .duration
            .map_or_else(|| "-".to_string(), format_minutes);
        let task = titles
            .get(&entry.task_id)
            .map_or(entry.task_id.as_str(), String::as_str);
        writeln!(
            output,
            "{:<16}  {:<16}  {:>8}  {}",
            start,
            end,
            duration,
            truncate(task, 40)
        )
        .unwrap();
    }

    output
}

fn task_titles(db: &Database, entries: &[TimeEntry]) -> Result<HashMap<TaskId, String>> {
    let mut titles = HashMap::new();
    for entry in entries {
        if titles.contains_key(&entry.task_id) {
            continue;
        }
        if let Some(task) = db.task_by_id(&entry.task_id)? {
            titles.insert(task.id, task.title);
        }
    }
    Ok(titles)
}

/// Runs the entries command.
pub fn run(db: &Database, me: &User, task: Option<&str>, json: bool) -> Result<()> {
    let task = task.map(TaskId::new).transpose()?;
    let entries = list_entries(db, &me.id, task.as_ref())?;

    if json {
        println!("{}", to_json(&entries)?);
    } else {
        let titles = task_titles(db, &entries)?;
        print!("{}", format_entries(&entries, &titles));
    }
    Ok(())
}
