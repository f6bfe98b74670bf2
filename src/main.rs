mod cli;
mod ui;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use clarity::anthropic::AnthropicClient;
use clarity::estimate::{AnyEstimator, HeuristicEstimator, LlmEstimator};
use clarity::{ClarityConfig, FileSlot, Planner, TaskStore};
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

// Quiet by default; RUST_LOG or --verbose for more.
fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn build_estimator(config: &ClarityConfig, offline: bool) -> Result<AnyEstimator> {
    let policy = config.overload_policy();
    if offline || !config.has_api_key() {
        if !offline {
            warn!("no API key configured, using the offline estimator");
        }
        return Ok(AnyEstimator::Heuristic(HeuristicEstimator::new(policy)));
    }
    let client = AnthropicClient::new(config.api_key.clone(), config.request_timeout())?;
    Ok(AnyEstimator::Llm(LlmEstimator::new(
        client,
        config.model.clone(),
        config.max_tokens,
        policy,
    )))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClarityConfig::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    info!(data_dir = %config.data_dir.display(), "using task storage");

    let store = TaskStore::open(FileSlot::new(&config.data_dir));
    let estimator = build_estimator(&config, cli.offline)?;
    let planner = Planner::new(store, estimator);

    match cli.command {
        Command::Add { description, due, at } => {
            let draft = cli::draft(description, due, at);
            let spinner_text = if planner.estimator().is_offline() {
                "Estimating…"
            } else {
                "Asking the model for an estimate…"
            };
            let pending = ui::Pending::start(spinner_text);
            let result = planner.add_task(&draft).await;
            pending.finish();

            let report = result?;
            for notice in &report.notices {
                ui::print_notice(notice);
            }
            ui::print_tasks(std::slice::from_ref(&report.task));
        }
        Command::List => {
            ui::print_tasks(&planner.sorted_tasks());
        }
        Command::Done { id } => {
            let id = planner.resolve_id(&id)?;
            let task = planner.toggle_complete(&id)?;
            ui::print_tasks(std::slice::from_ref(&task));
        }
        Command::Edit {
            id,
            description,
            due,
            at,
            clear_due,
        } => {
            let patch = cli::patch(description, due, at, clear_due);
            if patch.is_empty() {
                anyhow::bail!("Nothing to change. Pass --description, --due, --at or --clear-due.");
            }
            let id = planner.resolve_id(&id)?;
            let (task, notice) = planner.update_task(&id, &patch)?;
            ui::print_notice(&notice);
            ui::print_tasks(std::slice::from_ref(&task));
        }
        Command::Delete { id } => {
            let id = planner.resolve_id(&id)?;
            let (_, notice) = planner.delete_task(&id)?;
            ui::print_notice(&notice);
        }
    }

    Ok(())
}
