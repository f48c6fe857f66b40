// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Autopilot CLI library - exposes testable components
//!
//! The argument model lives here so parsing can be tested without spawning
//! the binary; `main.rs` only wires logging, Ctrl-C and the exit code.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use commands::{ConfigCommand, ReplaceArgs, RollbackArgs};

/// Zero-downtime replace and rollback of Cloud Foundry applications
#[derive(Debug, Parser)]
#[command(name = "autopilot")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AUTOPILOT_CONFIG_PATH",
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AUTOPILOT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Push a new version of an app without downtime
    #[command(name = "deploy-replace", visible_alias = "zero-downtime-push")]
    DeployReplace(ReplaceArgs),

    /// Revert an app to the version kept by --keep-existing-app
    #[command(name = "deploy-rollback", visible_alias = "zero-downtime-rollback")]
    DeployRollback(RollbackArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy_replace() {
        let cli = Cli::try_parse_from([
            "autopilot",
            "deploy-replace",
            "myapp",
            "-f",
            "manifest.yml",
            "-p",
            "target/app.jar",
            "--keep-existing-app",
        ])
        .unwrap();

        let Commands::DeployReplace(args) = cli.command else {
            panic!("expected deploy-replace");
        };
        assert_eq!(args.app_name, "myapp");
        assert_eq!(args.manifest, Some(PathBuf::from("manifest.yml")));
        assert_eq!(args.path, Some(PathBuf::from("target/app.jar")));
        assert!(args.keep_existing_app);
        assert!(!args.unmap_routes);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_manifest_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["autopilot", "zero-downtime-push", "myapp"]).unwrap();

        let Commands::DeployReplace(args) = cli.command else {
            panic!("expected deploy-replace");
        };
        assert!(args.manifest.is_none());
        let request = args.into_request();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_parse_rollback_alias_with_globals() {
        let cli = Cli::try_parse_from([
            "autopilot",
            "zero-downtime-rollback",
            "myapp",
            "--config",
            "/tmp/autopilot.yaml",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let Commands::DeployRollback(args) = cli.command else {
            panic!("expected deploy-rollback");
        };
        assert_eq!(args.app_name, "myapp");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/autopilot.yaml")));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_app_name_is_required() {
        assert!(Cli::try_parse_from(["autopilot", "deploy-rollback"]).is_err());
        assert!(Cli::try_parse_from(["autopilot", "deploy-replace", "-f", "m.yml"]).is_err());
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["autopilot", "config", "validate", "custom.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommand::Validate { file: Some(_) }
            }
        ));
    }
}
