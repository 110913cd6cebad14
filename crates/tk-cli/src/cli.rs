//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tk_core::TaskStatus;

/// Task clock.
///
/// Organizes work into projects and tasks and tracks the time spent on each
/// task with start/stop timers.
#[derive(Debug, Parser)]
#[command(name = "tk", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Username to act as. Overrides the `user` config key.
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage users.
    #[command(subcommand)]
    User(UserAction),

    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectAction),

    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskAction),

    /// Start and stop task timers.
    #[command(subcommand)]
    Timer(TimerAction),

    /// Show task and time statistics across your projects.
    Dashboard,

    /// List time entries, most recent first.
    Entries {
        /// Only show entries for this task.
        #[arg(long)]
        task: Option<String>,
    },

    /// Summarize completed time for one week.
    Report {
        /// First day of the week (defaults to this week's Monday).
        #[arg(long)]
        week_start: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Register a new user.
    Create {
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Create {
        title: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Change a project's title or description.
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project with all of its tasks.
    Delete { id: String },

    /// List your projects, newest first.
    List(ProjectListArgs),
}

#[derive(Debug, Args)]
pub struct ProjectListArgs {
    /// Match against title or description.
    #[arg(long)]
    pub query: Option<String>,

    /// Only projects with at least one task in this status.
    #[arg(long)]
    pub status: Option<TaskStatus>,

    /// Created on or after this day (YYYY-MM-DD or "N days ago").
    #[arg(long)]
    pub start_date: Option<String>,

    /// Created on or before this day (YYYY-MM-DD or "N days ago").
    #[arg(long)]
    pub end_date: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Create a task in a project.
    Create {
        project_id: String,

        title: String,

        #[arg(long)]
        description: Option<String>,

        /// One of todo, in_progress, done.
        #[arg(long)]
        status: Option<TaskStatus>,

        /// Estimated time in minutes.
        #[arg(long, allow_negative_numbers = true)]
        estimate: Option<i64>,
    },

    /// Change a task's fields.
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<TaskStatus>,

        /// Estimated time in minutes.
        #[arg(long, allow_negative_numbers = true)]
        estimate: Option<i64>,
    },

    /// Delete a task and its time entries.
    Delete { id: String },

    /// List tasks across your projects, newest first.
    List {
        /// Match against title or description.
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        status: Option<TaskStatus>,

        /// Only tasks in this project.
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TimerAction {
    /// Start a timer on a task, stopping any timer you have running.
    Start { task_id: String },

    /// Stop your running timer on a task.
    Stop { task_id: String },

    /// Show your running timer.
    Status,
}
