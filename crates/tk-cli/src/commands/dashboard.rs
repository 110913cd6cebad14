//! Dashboard command showing task and time statistics.

use std::fmt::Write;

use anyhow::Result;
use tk_core::{DashboardOverview, User, overview};
use tk_db::Database;

use super::util::{to_json, truncate};

const TITLE_WIDTH: usize = 24;

/// Format the overview for human-readable output.
pub fn format_dashboard(view: &DashboardOverview) -> String {
    let mut output = String::new();
    let counts = &view.tasks_by_status;
    let time = &view.time_summary;

    writeln!(output, "Projects: {}", view.total_projects).unwrap();
    writeln!(
        output,
        "Tasks: {} (todo {}, in progress {}, done {})",
        view.total_tasks, counts.todo, counts.in_progress, counts.done
    )
    .unwrap();
    writeln!(output, "Estimated: {:.2} h", time.total_estimated_hours).unwrap();
    writeln!(
        output,
        "Spent: {:.2} h ({:.1}% of estimate)",
        time.total_spent_hours, time.estimated_vs_spent_ratio
    )
    .unwrap();

    writeln!(output).unwrap();
    writeln!(output, "TIME BY PROJECT").unwrap();
    if view.projects_time.is_empty() {
        writeln!(output, "No projects yet.").unwrap();
    }
    for project in &view.projects_time {
        writeln!(
            output,
            "{:<TITLE_WIDTH$}  {:>8.2} h",
            truncate(&project.project_title, TITLE_WIDTH),
            project.time_spent_hours
        )
        .unwrap();
    }

    output
}

/// Runs the dashboard command.
pub fn run(db: &mut Database, me: &User, json: bool) -> Result<()> {
    let view = overview(db, &me.id)?;
    if json {
        println!("{}", to_json(&view)?);
    } else {
        print!("{}", format_dashboard(&view));
    }
    Ok(())
}
