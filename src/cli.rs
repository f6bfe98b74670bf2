//! Command-line surface of clarity, built on clap.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

use clarity::{DueChange, TaskDraft, TaskPatch};

/// Clarity: a clean and intuitive to-do list.
#[derive(Debug, Parser)]
#[command(name = "clarity", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the task list (overrides `data_dir` in clarity.toml).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Skip the model and use the built-in estimator.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Log progress to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Adds a task and estimates how long it will take.
    Add {
        description: String,

        /// Due date, YYYY-MM-DD.
        #[arg(long, value_parser = parse_date)]
        due: Option<NaiveDate>,

        /// Due time, HH:MM. Requires --due.
        #[arg(long, value_parser = parse_time)]
        at: Option<NaiveTime>,
    },

    /// Lists tasks, pending first.
    List,

    /// Marks a task complete, or pending again if it already is.
    Done {
        /// Task id or a unique prefix of it.
        id: String,
    },

    /// Changes a task's description or due date.
    Edit {
        /// Task id or a unique prefix of it.
        id: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_parser = parse_date, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,

        /// Keeps the current date when --due is not given.
        #[arg(long, value_parser = parse_time, conflicts_with = "clear_due")]
        at: Option<NaiveTime>,

        /// Removes the due date.
        #[arg(long, default_value_t = false)]
        clear_due: bool,
    },

    /// Deletes a task for good.
    Delete {
        /// Task id or a unique prefix of it.
        id: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

/// Form input for `add`.
pub fn draft(description: String, due: Option<NaiveDate>, at: Option<NaiveTime>) -> TaskDraft {
    TaskDraft {
        description,
        due_date: due,
        due_time: at,
    }
}

/// Edit flags folded into a patch. `--clear-due` wins; clap already
/// rejects it alongside `--due`/`--at`.
pub fn patch(
    description: Option<String>,
    due: Option<NaiveDate>,
    at: Option<NaiveTime>,
    clear_due: bool,
) -> TaskPatch {
    let due = if clear_due {
        DueChange::Clear
    } else if due.is_some() || at.is_some() {
        DueChange::Set { date: due, time: at }
    } else {
        DueChange::Keep
    };
    TaskPatch { description, due }
}
