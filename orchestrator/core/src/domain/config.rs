// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Autopilot Configuration
//
// Settings for talking to the platform CLI:
// - which `cf` binary to run and which CF_HOME it should see
// - per-call timeout for remote operations
// - fallback domain for routes reported without one

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "AUTOPILOT_CONFIG_PATH";

const DEFAULT_CF_BINARY: &str = "cf";
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_DOMAIN: &str = "apps.internal";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    #[serde(default)]
    pub cf: CfSettings,

    #[serde(default)]
    pub routes: RouteSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfSettings {
    /// Executable used for every platform call
    #[serde(default = "default_cf_binary")]
    pub binary: String,

    /// CF_HOME passed to the CLI (its `.cf/config.json` holds the target space)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    /// Upper bound for a single remote call, e.g. "90s" or "10m"
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

impl Default for CfSettings {
    fn default() -> Self {
        Self {
            binary: default_cf_binary(),
            home: None,
            command_timeout: default_command_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSettings {
    #[serde(default = "default_domain")]
    pub default_domain: String,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            default_domain: default_domain(),
        }
    }
}

fn default_cf_binary() -> String {
    DEFAULT_CF_BINARY.to_string()
}

fn default_command_timeout() -> Duration {
    DEFAULT_COMMAND_TIMEOUT
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl AutopilotConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AUTOPILOT_CONFIG_PATH environment variable
    /// 2. ./autopilot.yaml (working directory)
    /// 3. ~/.autopilot/config.yaml (user home)
    /// 4. /etc/autopilot/config.yaml (Unix) or C:\ProgramData\Autopilot\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./autopilot.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".autopilot").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/autopilot/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Autopilot\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load from an explicit path (which must exist), else discover, else defaults.
    /// Environment overrides are applied in every case.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(binary) = lookup("AUTOPILOT_CF_BINARY") {
            tracing::info!("Environment override: AUTOPILOT_CF_BINARY={}", binary);
            self.cf.binary = binary;
        }

        if self.cf.home.is_none() {
            if let Some(home) = lookup("CF_HOME") {
                self.cf.home = Some(PathBuf::from(home));
            }
        }

        if let Some(val) = lookup("AUTOPILOT_COMMAND_TIMEOUT") {
            match humantime_serde::re::humantime::parse_duration(&val) {
                Ok(timeout) => {
                    tracing::info!("Environment override: AUTOPILOT_COMMAND_TIMEOUT={}", val);
                    self.cf.command_timeout = timeout;
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid value for AUTOPILOT_COMMAND_TIMEOUT: '{}' ({}). Ignoring.",
                        val,
                        e
                    );
                }
            }
        }

        if let Some(domain) = lookup("AUTOPILOT_DEFAULT_DOMAIN") {
            tracing::info!("Environment override: AUTOPILOT_DEFAULT_DOMAIN={}", domain);
            self.routes.default_domain = domain;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cf.binary.trim().is_empty() {
            anyhow::bail!("cf.binary cannot be empty");
        }

        if self.cf.command_timeout.is_zero() {
            anyhow::bail!("cf.command_timeout must be greater than zero");
        }

        if self.routes.default_domain.trim().is_empty() {
            anyhow::bail!("routes.default_domain cannot be empty");
        }

        Ok(())
    }

    /// Path of the CF CLI config file holding the targeted org and space
    pub fn cf_config_file(&self) -> Option<PathBuf> {
        self.cf
            .home
            .clone()
            .or_else(dirs::home_dir)
            .map(|home| home.join(".cf").join("config.json"))
    }
}
