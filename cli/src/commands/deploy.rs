// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! deploy-replace and deploy-rollback
//!
//! Both commands build the same service stack over the local `cf` binary,
//! run one workflow, and list the space's apps on success.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use autopilot_core::application::deployment::{DeployOutcome, DeploymentService};
use autopilot_core::domain::{AutopilotConfig, DeploymentOptions, ReplaceRequest};
use autopilot_core::infrastructure::{CfApplicationRepository, CfCliConnection};

#[derive(Debug, Args)]
pub struct ReplaceArgs {
    /// Name of the app to replace
    #[arg(value_name = "APP_NAME")]
    pub app_name: String,

    /// Manifest describing the new version
    #[arg(short = 'f', value_name = "MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Path to the app directory or archive
    #[arg(short = 'p', value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Stop the previous version instead of deleting it
    #[arg(long)]
    pub keep_existing_app: bool,

    /// Unmap the previous version's routes instead of deleting it
    #[arg(long)]
    pub unmap_routes: bool,
}

impl ReplaceArgs {
    pub fn into_request(self) -> ReplaceRequest {
        ReplaceRequest {
            app_name: self.app_name,
            manifest_path: self.manifest,
            app_path: self.path,
            options: DeploymentOptions {
                keep_existing: self.keep_existing_app,
                unmap_routes: self.unmap_routes,
            },
        }
    }
}

#[derive(Debug, Args)]
pub struct RollbackArgs {
    /// Name of the app to roll back
    #[arg(value_name = "APP_NAME")]
    pub app_name: String,
}

pub async fn replace(
    args: ReplaceArgs,
    config_path: Option<PathBuf>,
    cancellation: CancellationToken,
) -> Result<()> {
    let service = build_service(config_path, cancellation)?;
    let outcome = service.replace(args.into_request()).await?;
    finish(&service, outcome).await
}

pub async fn rollback(
    args: RollbackArgs,
    config_path: Option<PathBuf>,
    cancellation: CancellationToken,
) -> Result<()> {
    let service = build_service(config_path, cancellation)?;
    let outcome = service.rollback(&args.app_name).await?;
    finish(&service, outcome).await
}

fn build_service(
    config_path: Option<PathBuf>,
    cancellation: CancellationToken,
) -> Result<DeploymentService> {
    let config =
        AutopilotConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    info!(cf = %config.cf.binary, timeout = ?config.cf.command_timeout, "Using cf CLI");

    let connection = Arc::new(CfCliConnection::new(&config));
    let repository = Arc::new(CfApplicationRepository::new(
        connection,
        config.routes.default_domain.clone(),
    ));

    Ok(DeploymentService::new(repository).with_cancellation(cancellation))
}

async fn finish(service: &DeploymentService, outcome: DeployOutcome) -> Result<()> {
    println!();
    println!("{}", outcome.message.green());
    println!();

    service
        .list_apps()
        .await
        .context("Failed to list apps")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_core::domain::FinalizeStrategy;

    fn args(keep: bool, unmap: bool) -> ReplaceArgs {
        ReplaceArgs {
            app_name: "myapp".to_string(),
            manifest: Some(PathBuf::from("manifest.yml")),
            path: None,
            keep_existing_app: keep,
            unmap_routes: unmap,
        }
    }

    #[test]
    fn test_flags_map_to_finalize_strategy() {
        assert_eq!(
            args(false, false).into_request().options.finalize_strategy(),
            FinalizeStrategy::Delete
        );
        assert_eq!(
            args(false, true).into_request().options.finalize_strategy(),
            FinalizeStrategy::UnmapRoutes
        );
        assert_eq!(
            args(true, true).into_request().options.finalize_strategy(),
            FinalizeStrategy::Stop
        );
    }

    #[test]
    fn test_invalid_config_file_fails_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autopilot.yaml");
        std::fs::write(&path, "cf:\n  binary: \"\"\n").unwrap();

        let result = build_service(Some(path), CancellationToken::new());

        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("Configuration validation failed"));
    }
}
