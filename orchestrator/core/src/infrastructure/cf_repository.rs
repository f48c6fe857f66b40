// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cloud Foundry Application Repository
//!
//! Implements [`ApplicationRepository`] on top of a [`CliConnection`]:
//!
//! | Operation | Command |
//! |-----------|---------|
//! | rename | `cf rename OLD NEW` |
//! | push | `cf push APP -f MANIFEST [-p PATH]` |
//! | delete | `cf delete APP -f` |
//! | start / stop | `cf start APP` / `cf stop APP` |
//! | map / unmap | `cf map-route APP DOMAIN --hostname HOST`, once per host |
//! | exists | `cf curl v2/apps?q=name:APP&q=space_guid:GUID` |
//! | find routes | `cf curl v2/apps/GUID/routes?inline-relations-depth=1` |
//! | list | `cf apps` |

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::errors::PlatformError;
use crate::domain::repository::ApplicationRepository;
use crate::domain::route::Route;
use crate::infrastructure::cf_cli::{CliConnection, CliError};

pub struct CfApplicationRepository {
    connection: Arc<dyn CliConnection>,
    default_domain: String,
}

impl CfApplicationRepository {
    pub fn new(connection: Arc<dyn CliConnection>, default_domain: impl Into<String>) -> Self {
        Self {
            connection,
            default_domain: default_domain.into(),
        }
    }

    async fn run(
        &self,
        operation: &'static str,
        target: &str,
        args: Vec<String>,
    ) -> Result<(), PlatformError> {
        self.connection
            .cli_command(&args)
            .await
            .map_err(|e| remote_error(operation, target, e))
    }

    async fn curl(
        &self,
        operation: &'static str,
        target: &str,
        path: String,
    ) -> Result<String, PlatformError> {
        let lines = self
            .connection
            .cli_command_without_terminal_output(&["curl".to_string(), path])
            .await
            .map_err(|e| remote_error(operation, target, e))?;
        Ok(lines.join(""))
    }

    async fn apps_query(
        &self,
        operation: &'static str,
        app_name: &str,
    ) -> Result<String, PlatformError> {
        let space_guid = self
            .connection
            .current_space_guid()
            .await
            .map_err(|e| remote_error(operation, app_name, e))?;
        self.curl(
            operation,
            app_name,
            format!("v2/apps?q=name:{}&q=space_guid:{}", app_name, space_guid),
        )
        .await
    }

    async fn for_each_host(
        &self,
        operation: &'static str,
        command: &str,
        app_name: &str,
        route: &Route,
    ) -> Result<(), PlatformError> {
        if !route.has_hosts() {
            return Err(PlatformError::NoRoutes {
                app: app_name.to_string(),
            });
        }

        for host in &route.hosts {
            self.run(
                operation,
                app_name,
                args(&[command, app_name, &route.domain, "--hostname", host]),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationRepository for CfApplicationRepository {
    async fn app_exists(&self, app_name: &str) -> Result<bool, PlatformError> {
        let response = self.apps_query("exists", app_name).await?;
        parse_total_results(&response)
    }

    async fn rename_app(&self, old_name: &str, new_name: &str) -> Result<(), PlatformError> {
        self.run("rename", old_name, args(&["rename", old_name, new_name]))
            .await
    }

    async fn push_app(
        &self,
        app_name: &str,
        manifest_path: &Path,
        app_path: Option<&Path>,
    ) -> Result<(), PlatformError> {
        let mut command = vec![
            "push".to_string(),
            app_name.to_string(),
            "-f".to_string(),
            manifest_path.to_string_lossy().into_owned(),
        ];
        if let Some(path) = app_path {
            command.push("-p".to_string());
            command.push(path.to_string_lossy().into_owned());
        }
        self.run("push", app_name, command).await
    }

    async fn delete_app(&self, app_name: &str) -> Result<(), PlatformError> {
        self.run("delete", app_name, args(&["delete", app_name, "-f"]))
            .await
    }

    async fn start_app(&self, app_name: &str) -> Result<(), PlatformError> {
        self.run("start", app_name, args(&["start", app_name])).await
    }

    async fn stop_app(&self, app_name: &str) -> Result<(), PlatformError> {
        self.run("stop", app_name, args(&["stop", app_name])).await
    }

    async fn map_routes(&self, app_name: &str, route: &Route) -> Result<(), PlatformError> {
        self.for_each_host("map route", "map-route", app_name, route)
            .await?;
        info!(app = app_name, routes = %route, "Mapped routes");
        Ok(())
    }

    async fn unmap_routes(&self, app_name: &str, route: &Route) -> Result<(), PlatformError> {
        self.for_each_host("unmap route", "unmap-route", app_name, route)
            .await?;
        info!(app = app_name, routes = %route, "Unmapped routes");
        Ok(())
    }

    async fn find_routes(&self, app_name: &str) -> Result<Route, PlatformError> {
        let apps = self.apps_query("find routes", app_name).await?;
        let guid = parse_app_guid(&apps)?.ok_or_else(|| {
            PlatformError::command_failed("find routes", app_name, "app not found")
        })?;

        let routes = self
            .curl(
                "find routes",
                app_name,
                format!("v2/apps/{}/routes?inline-relations-depth=1", guid),
            )
            .await?;
        parse_routes(app_name, &routes, &self.default_domain)
    }

    async fn list_apps(&self) -> Result<(), PlatformError> {
        self.run("list", "all apps", args(&["apps"])).await
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

fn remote_error(operation: &'static str, target: &str, error: CliError) -> PlatformError {
    match error {
        CliError::TimedOut { timeout, .. } => PlatformError::Timeout {
            operation,
            target: target.to_string(),
            timeout,
        },
        CliError::Spawn { program, source } => PlatformError::Io { program, source },
        CliError::NoTargetSpace => PlatformError::NoTargetSpace,
        other => PlatformError::command_failed(operation, target, other.to_string()),
    }
}

/// An app exists when the space-scoped name query reports exactly one result.
fn parse_total_results(response: &str) -> Result<bool, PlatformError> {
    let output: Value = serde_json::from_str(response)
        .map_err(|e| PlatformError::malformed("exists", e.to_string()))?;

    let total_results = output.get("total_results").ok_or_else(|| {
        PlatformError::malformed("exists", "Missing total_results from api response")
    })?;

    let count = total_results.as_f64().ok_or_else(|| {
        let shown = match total_results {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        PlatformError::malformed("exists", format!("total_results didn't have a number {}", shown))
    })?;

    Ok(count == 1.0)
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    resources: Vec<Resource<T>>,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    #[serde(default)]
    metadata: Metadata,
    entity: T,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    guid: String,
}

#[derive(Debug, Deserialize)]
struct RouteEntity {
    #[serde(default)]
    host: String,
    #[serde(default)]
    domain: Option<Resource<DomainEntity>>,
}

#[derive(Debug, Deserialize)]
struct DomainEntity {
    name: String,
}

impl RouteEntity {
    fn domain_name(&self) -> Option<&str> {
        self.domain.as_ref().map(|d| d.entity.name.as_str())
    }
}

fn parse_app_guid(response: &str) -> Result<Option<String>, PlatformError> {
    let page: Page<IgnoredAny> = serde_json::from_str(response)
        .map_err(|e| PlatformError::malformed("find routes", e.to_string()))?;
    Ok(page
        .resources
        .into_iter()
        .map(|resource| resource.metadata.guid)
        .find(|guid| !guid.is_empty()))
}

/// Collapse the app's routes into one [`Route`] on the first route's domain.
fn parse_routes(
    app_name: &str,
    response: &str,
    default_domain: &str,
) -> Result<Route, PlatformError> {
    let page: Page<RouteEntity> = serde_json::from_str(response)
        .map_err(|e| PlatformError::malformed("find routes", e.to_string()))?;

    let domain = page
        .resources
        .iter()
        .find_map(|r| r.entity.domain_name())
        .unwrap_or(default_domain)
        .to_string();

    let mut hosts = Vec::new();
    for resource in &page.resources {
        let route = &resource.entity;
        match route.domain_name() {
            Some(other) if other != domain => {
                warn!(
                    app = app_name,
                    host = %route.host,
                    domain = other,
                    "Skipping route on another domain"
                );
            }
            _ if route.host.is_empty() => {
                debug!(app = app_name, "Skipping route without a hostname");
            }
            _ => hosts.push(route.host.clone()),
        }
    }

    if hosts.is_empty() {
        return Err(PlatformError::NoRoutes {
            app: app_name.to_string(),
        });
    }
    Ok(Route::new(domain, hosts))
}
