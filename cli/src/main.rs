// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Autopilot CLI
//!
//! The `autopilot` binary replaces and rolls back Cloud Foundry apps without
//! downtime by driving the local `cf` CLI.
//!
//! ## Commands
//!
//! - `autopilot deploy-replace APP -f MANIFEST [-p PATH] [--keep-existing-app] [--unmap-routes]`
//! - `autopilot deploy-rollback APP`
//! - `autopilot config show|validate` - Configuration management
//!
//! Ctrl-C stops the workflow before its next step and undoes the steps
//! already taken. A second Ctrl-C exits at once.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use autopilot_cli::commands;
use autopilot_cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), report(&err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(&cli.log_level)?;

    let cancellation = CancellationToken::new();
    spawn_interrupt_handler(cancellation.clone());

    match cli.command {
        Commands::DeployReplace(args) => {
            commands::deploy::replace(args, cli.config, cancellation).await
        }
        Commands::DeployRollback(args) => {
            commands::deploy::rollback(args, cli.config, cancellation).await
        }
        Commands::Config { command } => {
            commands::config::handle_command(command, cli.config).await
        }
    }
}

/// What a Ctrl-C does, given whether one was already received.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Cancel,
    Exit,
}

fn on_interrupt(cancellation: &CancellationToken) -> Interrupt {
    if cancellation.is_cancelled() {
        return Interrupt::Exit;
    }
    cancellation.cancel();
    Interrupt::Cancel
}

fn spawn_interrupt_handler(cancellation: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&cancellation) {
                Interrupt::Cancel => {
                    warn!("Interrupted, stopping after the current step (Ctrl-C again to exit)")
                }
                Interrupt::Exit => {
                    eprintln!("{} interrupted, apps may be left renamed", "error:".red().bold());
                    std::process::exit(130);
                }
            }
        }
    });
}

/// Error chain on one line, skipping causes already spelled out by the
/// message that wraps them.
fn report(err: &anyhow::Error) -> String {
    let mut out = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if out.contains(&text) {
            continue;
        }
        if !out.is_empty() {
            out.push_str(": ");
        }
        out.push_str(&text);
    }
    out
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
