use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tk_cli::commands::{dashboard, entries, project, report, task, timer, user};
use tk_cli::{Cli, Commands, Config, ProjectAction, TaskAction, TimerAction, UserAction};
use tk_core::projects::{NewProject, ProjectChanges};
use tk_core::tasks::{NewTask, TaskChanges};
use tk_core::users::{NewUser, acting_user};
use tk_core::{User, ValidationError};
use tk_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

/// The user a command runs as: `--user`, else the `user` config key.
fn acting(db: &Database, cli: &Cli, config: &Config) -> Result<User> {
    let username = cli.user.as_deref().or(config.user.as_deref());
    Ok(acting_user(db, username)?)
}

/// HTTP-style status for `--json` error output.
fn status_code(err: &anyhow::Error) -> u16 {
    if let Some(err) = err.downcast_ref::<tk_core::Error>() {
        err.status_code()
    } else if err.is::<ValidationError>() {
        400
    } else {
        500
    }
}

fn report_error(err: &anyhow::Error, json: bool) {
    let message = format!("{err:#}");
    if json {
        let body = serde_json::json!({ "error": message, "status": status_code(err) });
        eprintln!("{body}");
    } else {
        eprintln!("error: {message}");
    }
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn run(cli: &Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let json = cli.json;

    match command {
        Commands::User(UserAction::Create {
            username,
            email,
            first_name,
            last_name,
        }) => {
            let input = NewUser {
                username: username.clone(),
                email: email.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
            };
            user::create(&mut db, &input, json)?;
        }
        Commands::Project(action) => {
            let me = acting(&db, cli, &config)?;
            match action {
                ProjectAction::Create { title, description } => {
                    let input = NewProject {
                        title: title.clone(),
                        description: description.clone(),
                    };
                    project::create(&mut db, &me, &input, json)?;
                }
                ProjectAction::Edit {
                    id,
                    title,
                    description,
                } => {
                    let changes = ProjectChanges {
                        title: title.clone(),
                        description: description.clone(),
                    };
                    project::edit(&mut db, &me, id, &changes, json)?;
                }
                ProjectAction::Delete { id } => project::delete(&mut db, &me, id, json)?,
                ProjectAction::List(args) => {
                    let query = project::build_query(
                        args.query.clone(),
                        args.status,
                        args.start_date.as_deref(),
                        args.end_date.as_deref(),
                    )?;
                    project::list(&db, &me, query, json)?;
                }
            }
        }
        Commands::Task(action) => {
            let me = acting(&db, cli, &config)?;
            match action {
                TaskAction::Create {
                    project_id,
                    title,
                    description,
                    status,
                    estimate,
                } => {
                    let input = NewTask {
                        title: title.clone(),
                        description: description.clone(),
                        status: *status,
                        estimated_time: *estimate,
                    };
                    task::create(&mut db, &me, project_id, &input, json)?;
                }
                TaskAction::Edit {
                    id,
                    title,
                    description,
                    status,
                    estimate,
                } => {
                    let changes = TaskChanges {
                        title: title.clone(),
                        description: description.clone(),
                        status: *status,
                        estimated_time: *estimate,
                    };
                    task::edit(&mut db, &me, id, &changes, json)?;
                }
                TaskAction::Delete { id } => task::delete(&mut db, &me, id, json)?,
                TaskAction::List {
                    query,
                    status,
                    project,
                } => {
                    let query = task::build_query(query.clone(), *status, project.as_deref())?;
                    task::list(&db, &me, query, json)?;
                }
            }
        }
        Commands::Timer(action) => {
            let me = acting(&db, cli, &config)?;
            match action {
                TimerAction::Start { task_id } => timer::start(&mut db, &me, task_id, json)?,
                TimerAction::Stop { task_id } => timer::stop(&mut db, &me, task_id, json)?,
                TimerAction::Status => timer::status(&db, &me, json)?,
            }
        }
        Commands::Dashboard => {
            let me = acting(&db, cli, &config)?;
            dashboard::run(&mut db, &me, json)?;
        }
        Commands::Entries { task } => {
            let me = acting(&db, cli, &config)?;
            entries::run(&db, &me, task.as_deref(), json)?;
        }
        Commands::Report { week_start } => {
            let me = acting(&db, cli, &config)?;
            report::run(&db, &me, week_start.as_deref(), json)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support; logs go to stderr so
    // `--json` output stays parseable.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}
