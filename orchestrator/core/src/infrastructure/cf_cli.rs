// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cloud Foundry CLI connection
//!
//! Thin process wrapper around the `cf` binary. Commands either stream their
//! output to the user's terminal or run quietly and hand their stdout back
//! for decoding. Every invocation is bounded by the configured timeout.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::domain::config::AutopilotConfig;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("`{command}` exited with {status}: {output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no target space is set")]
    NoTargetSpace,

    #[error("cannot read CF CLI config {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

#[async_trait]
pub trait CliConnection: Send + Sync {
    /// Run a command with its output shown on the terminal
    async fn cli_command(&self, args: &[String]) -> Result<(), CliError>;

    /// Run a command quietly and return its stdout lines
    async fn cli_command_without_terminal_output(
        &self,
        args: &[String],
    ) -> Result<Vec<String>, CliError>;

    /// GUID of the space the CLI is currently targeting
    async fn current_space_guid(&self) -> Result<String, CliError>;
}

/// Connection backed by a local `cf` executable.
#[derive(Debug, Clone)]
pub struct CfCliConnection {
    binary: String,
    cf_home: Option<PathBuf>,
    config_file: Option<PathBuf>,
    timeout: Duration,
}

impl CfCliConnection {
    pub fn new(config: &AutopilotConfig) -> Self {
        Self {
            binary: config.cf.binary.clone(),
            cf_home: config.cf.home.clone(),
            config_file: config.cf_config_file(),
            timeout: config.cf.command_timeout,
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if let Some(home) = &self.cf_home {
            cmd.env("CF_HOME", home);
        }
        cmd
    }

    fn display(&self, args: &[String]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn spawn_error(&self, source: std::io::Error) -> CliError {
        CliError::Spawn {
            program: self.binary.clone(),
            source,
        }
    }
}

#[async_trait]
impl CliConnection for CfCliConnection {
    async fn cli_command(&self, args: &[String]) -> Result<(), CliError> {
        let command = self.display(args);
        debug!(%command, "Running cf command");

        let mut cmd = self.command(args);
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());

        match tokio::time::timeout(self.timeout, cmd.status()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(CliError::Failed {
                command,
                status: status.to_string(),
                output: "see output above".to_string(),
            }),
            Ok(Err(e)) => Err(self.spawn_error(e)),
            Err(_) => Err(CliError::TimedOut {
                command,
                timeout: self.timeout,
            }),
        }
    }

    async fn cli_command_without_terminal_output(
        &self,
        args: &[String],
    ) -> Result<Vec<String>, CliError> {
        let command = self.display(args);
        debug!(%command, "Running cf command quietly");

        let output = match tokio::time::timeout(self.timeout, self.command(args).output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.spawn_error(e)),
            Err(_) => {
                return Err(CliError::TimedOut {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            return Err(CliError::Failed {
                command,
                status: output.status.to_string(),
                output: detail.to_string(),
            });
        }

        Ok(stdout.lines().map(str::to_string).collect())
    }

    async fn current_space_guid(&self) -> Result<String, CliError> {
        let path = self.config_file.clone().ok_or(CliError::NoTargetSpace)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CliError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?;
        space_guid_from_config(&content).map_err(|message| match message {
            None => CliError::NoTargetSpace,
            Some(message) => CliError::Config { path, message },
        })
    }
}

#[derive(Debug, Deserialize)]
struct CfConfigFile {
    #[serde(rename = "SpaceFields", default)]
    space_fields: Option<SpaceFields>,
}

#[derive(Debug, Deserialize)]
struct SpaceFields {
    #[serde(rename = "GUID", default)]
    guid: String,
}

/// `Err(None)` when no space is targeted, `Err(Some(_))` on unreadable JSON.
fn space_guid_from_config(content: &str) -> Result<String, Option<String>> {
    let config: CfConfigFile = serde_json::from_str(content).map_err(|e| Some(e.to_string()))?;
    match config.space_fields {
        Some(space) if !space.guid.is_empty() => Ok(space.guid),
        _ => Err(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_guid_from_config() {
        let content = r#"{"ConfigVersion":3,"SpaceFields":{"GUID":"space-4","Name":"dev"}}"#;
        assert_eq!(space_guid_from_config(content), Ok("space-4".to_string()));
    }

    #[test]
    fn test_untargeted_space() {
        assert_eq!(space_guid_from_config(r#"{"ConfigVersion":3}"#), Err(None));
        assert_eq!(
            space_guid_from_config(r#"{"SpaceFields":{"GUID":"","Name":""}}"#),
            Err(None)
        );
    }

    #[test]
    fn test_unreadable_config() {
        assert!(matches!(space_guid_from_config("}notjson{"), Err(Some(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let mut config = AutopilotConfig::default();
        config.cf.binary = "/nonexistent/autopilot-test-cf".to_string();
        let connection = CfCliConnection::new(&config);

        let result = connection
            .cli_command_without_terminal_output(&["apps".to_string()])
            .await;

        assert!(matches!(result, Err(CliError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() {
        let mut config = AutopilotConfig::default();
        config.cf.binary = "sleep".to_string();
        config.cf.command_timeout = Duration::from_millis(50);
        let connection = CfCliConnection::new(&config);
        let args = ["5".to_string()];

        let quiet = connection.cli_command_without_terminal_output(&args).await;
        assert!(matches!(
            quiet,
            Err(CliError::TimedOut { ref command, timeout })
                if command == "sleep 5" && timeout == Duration::from_millis(50)
        ));

        let loud = connection.cli_command(&args).await;
        assert!(matches!(loud, Err(CliError::TimedOut { .. })));
    }

    #[tokio::test]
    async fn test_reads_space_from_cf_home() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join(".cf")).unwrap();
        std::fs::write(
            home.path().join(".cf").join("config.json"),
            r#"{"SpaceFields":{"GUID":"abc-123"}}"#,
        )
        .unwrap();

        let mut config = AutopilotConfig::default();
        config.cf.home = Some(home.path().to_path_buf());
        let connection = CfCliConnection::new(&config);

        assert_eq!(connection.current_space_guid().await.unwrap(), "abc-123");
    }
}
