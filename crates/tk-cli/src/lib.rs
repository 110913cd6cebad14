//! Task clock CLI library.
//!
//! This crate provides the `tk` command-line interface over `tk-core` and
//! `tk-db`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ProjectAction, ProjectListArgs, TaskAction, TimerAction, UserAction};
pub use config::Config;
