//! CLI subcommand implementations.

pub mod dashboard;
pub mod entries;
pub mod project;
pub mod report;
pub mod task;
pub mod timer;
pub mod user;
pub mod util;

#[cfg(test)]
mod testing;
