// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! partcraft - build parts-based projects from the command line

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use partcraft_core::{Action, ActionType, Step};
use partcraft_engine::{LifecycleManager, ManagerConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "partcraft",
    version,
    about = "Process parts-based projects through their build lifecycle"
)]
struct Cli {
    /// The parts specification file
    #[arg(
        short = 'f',
        long = "file",
        global = true,
        value_name = "filename",
        default_value = "parts.yaml"
    )]
    file: PathBuf,

    /// Refresh the stage packages list before proceeding
    #[arg(long, global = true)]
    update: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull the specified parts
    Pull(StepArgs),
    /// Build the specified parts
    Build(StepArgs),
    /// Stage the specified parts
    Stage(StepArgs),
    /// Prime the specified parts
    Prime(StepArgs),
    /// Clean the specified parts
    Clean {
        /// The list of parts to clean (all parts when omitted)
        parts: Vec<String>,
    },
}

#[derive(Args, Default)]
struct StepArgs {
    /// The list of parts to process (all parts when omitted)
    parts: Vec<String>,

    /// Show planned actions to be executed and exit
    #[arg(long)]
    plan_only: bool,

    /// Also display skipped actions
    #[arg(long)]
    show_skipped: bool,
}

fn target_step(command: &Commands) -> Step {
    match command {
        Commands::Pull(_) => Step::Pull,
        Commands::Build(_) => Step::Build,
        Commands::Stage(_) => Step::Stage,
        // clean is handled separately; default is prime
        _ => Step::Prime,
    }
}

/// The plan lines to display, honoring `--show-skipped`.
fn plan_lines(actions: &[Action], show_skipped: bool) -> Vec<String> {
    actions
        .iter()
        .filter(|a| show_skipped || a.action_type != ActionType::Skip)
        .map(Action::message)
        .collect()
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let document = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("cannot read {:?}", cli.file))?;
    let mut manager = LifecycleManager::new(&document, ManagerConfig::default())?;

    if cli.update {
        manager.update(false).await?;
    }

    let command = cli.command.unwrap_or(Commands::Prime(StepArgs::default()));

    if let Commands::Clean { parts } = &command {
        if parts.is_empty() {
            println!("Clean all parts.");
        }
        manager.clean(None, parts)?;
        return Ok(());
    }

    let step = target_step(&command);
    let (Commands::Pull(args) | Commands::Build(args) | Commands::Stage(args)
    | Commands::Prime(args)) = command
    else {
        unreachable!("clean returns above");
    };

    let actions = manager.plan(step, &args.parts)?;

    if args.plan_only {
        let lines = plan_lines(&actions, args.show_skipped);
        if lines.is_empty() {
            println!("No actions to execute.");
        }
        for line in lines {
            println!("{line}");
        }
        return Ok(());
    }

    let mut context = manager.execution_context().await?;
    for action in &actions {
        if args.show_skipped || action.action_type != ActionType::Skip {
            println!("Execute: {}", action.message());
        }
        context.execute(std::slice::from_ref(action)).await?;
    }
    context.finish().await?;

    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
