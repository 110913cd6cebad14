//! Weekly report command.

use std::fmt::Write;

use anyhow::Result;
use chrono::Utc;
use tk_core::User;
use tk_core::entries::{WeeklySummary, week_containing, weekly_summary};
use tk_db::Database;

use super::util::{format_minutes, parse_day, to_json};

/// Format a weekly summary, one line per day.
pub fn format_report(summary: &WeeklySummary) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "Week {} to {}",
        summary.week_start, summary.week_end
    )
    .unwrap();
    writeln!(output).unwrap();

    for day in &summary.days {
        writeln!(
            output,
            "{} {}  {:>8}",
            day.date.format("%a"),
            day.date,
            format_minutes(day.total_minutes)
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "Total: {}", format_minutes(summary.total_minutes)).unwrap();

    output
}

/// Runs the report command. Defaults to the current week, starting Monday.
pub fn run(db: &Database, me: &User, week_start: Option<&str>, json: bool) -> Result<()> {
    let week_start = match week_start {
        Some(value) => parse_day(value, "week_start")?,
        None => week_containing(Utc::now().date_naive()),
    };
    let summary = weekly_summary(db, &me.id, week_start)?;

    if json {
        println!("{}", to_json(&summary)?);
    } else {
        print!("{}", format_report(&summary));
    }
    Ok(())
}
