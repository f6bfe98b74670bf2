//! Terminal output: the task list, notices, and a spinner while an estimate
//! is pending.

use std::fmt::Display;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use clarity::{Notice, NoticeLevel, Task};

/// Spinner shown while the add form is "disabled" waiting on the estimator.
pub struct Pending {
    pb: ProgressBar,
}

impl Pending {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

/// One notice per line, marked and coloured by level.
pub fn print_notice(notice: &Notice) {
    let (style, mark) = match notice.level {
        NoticeLevel::Info => (Style::new().green().bold(), "✓"),
        NoticeLevel::Warning => (Style::new().yellow().bold(), "!"),
        NoticeLevel::Error => (Style::new().red().bold(), "✗"),
    };
    println!(
        "  {} {} {}",
        style.apply_to(mark),
        style.apply_to(&notice.title),
        notice.message
    );
}

/// Writes to stderr.
pub fn print_error(err: &dyn Display) {
    eprintln!("  {} {err}", Style::new().red().bold().apply_to("✗"));
}

/// One line per task, already in display order.
pub fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("  {}", Style::new().bold().apply_to("All clear!"));
        println!("  You have no pending tasks. Add one to get started.");
        return;
    }

    let dim = Style::new().dim();
    let done = Style::new().dim();
    let id_style = Style::new().cyan();

    for task in tasks {
        let short_id: String = task.id.chars().take(8).collect();
        let (check, description) = if task.completed {
            ("[x]", done.apply_to(task.description.as_str()).to_string())
        } else {
            ("[ ]", task.description.clone())
        };

        let mut details = Vec::new();
        if let Some(due) = task.due_date {
            details.push(format!("due {due}"));
        }
        if let Some(minutes) = task.estimated_time {
            details.push(format!("~{minutes} min"));
        }
        if let Some(minutes) = task.completion_time_minutes {
            details.push(format!("took {minutes} min"));
        }

        let details = if details.is_empty() {
            String::new()
        } else {
            format!("  {}", dim.apply_to(details.join(" · ")))
        };
        println!("  {check} {} {description}{details}", id_style.apply_to(short_id));
    }
}
