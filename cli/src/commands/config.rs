// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use humantime_serde::re::humantime::format_duration;
use std::path::PathBuf;

use autopilot_core::domain::config::CONFIG_PATH_ENV;
use autopilot_core::domain::AutopilotConfig;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = AutopilotConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./autopilot.yaml");
        println!("  4. ~/.autopilot/config.yaml");
        println!("  5. /etc/autopilot/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "CF CLI:".bold());
    println!("  Binary: {}", config.cf.binary);
    match &config.cf.home {
        Some(home) => println!("  CF_HOME: {}", home.display()),
        None => println!("  CF_HOME: {}", "(default)".dimmed()),
    }
    match config.cf_config_file() {
        Some(path) => println!("  Target file: {}", path.display()),
        None => println!("  Target file: {}", "(no home directory)".dimmed()),
    }
    println!(
        "  Command timeout: {}",
        format_duration(config.cf.command_timeout)
    );
    println!();

    println!("{}", "Routes:".bold());
    println!("  Default domain: {}", config.routes.default_domain);
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        AutopilotConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}
