// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-memory application platform
//!
//! Simulates the app namespace and route mappings of a single space, records
//! every remote call in order, and can be told to fail specific calls. Used by
//! the workflow tests in place of a real platform.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::errors::PlatformError;
use crate::domain::repository::ApplicationRepository;
use crate::domain::route::Route;

const SIMULATED_DOMAIN: &str = "apps.internal";

/// One remote call as the platform saw it. Route mapping is recorded per host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Exists(String),
    Rename { from: String, to: String },
    Push {
        app: String,
        manifest: PathBuf,
        path: Option<PathBuf>,
    },
    Delete(String),
    Start(String),
    Stop(String),
    MapRoute {
        app: String,
        domain: String,
        host: String,
    },
    UnmapRoute {
        app: String,
        domain: String,
        host: String,
    },
    FindRoutes(String),
    ListApps,
}

impl RemoteCall {
    /// Calls that change platform state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Exists(_) | Self::FindRoutes(_) | Self::ListApps)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub running: bool,
    pub route: Route,
    pub manifest: Option<PathBuf>,
}

impl AppRecord {
    pub fn running_on(domain: &str, hosts: &[&str]) -> Self {
        Self {
            running: true,
            route: Route::new(domain, hosts.iter().map(|h| h.to_string()).collect()),
            manifest: None,
        }
    }

    pub fn without_routes() -> Self {
        Self {
            running: true,
            route: Route::empty(SIMULATED_DOMAIN),
            manifest: None,
        }
    }
}

#[derive(Debug)]
struct Fault {
    call: RemoteCall,
    message: String,
    /// For pushes: the app record is created before the failure is reported
    leaves_app: bool,
    /// Matching calls to let through before failing
    skip: usize,
}

#[derive(Debug, Default)]
struct Platform {
    apps: BTreeMap<String, AppRecord>,
    calls: Vec<RemoteCall>,
    faults: Vec<Fault>,
}

impl Platform {
    fn record(&mut self, call: RemoteCall, target: &str) -> Result<(), PlatformError> {
        self.check(call, target).map_err(|(error, _)| error)
    }

    /// Log the call and report an injected fault, if one matches.
    fn check(&mut self, call: RemoteCall, target: &str) -> Result<(), (PlatformError, bool)> {
        self.calls.push(call.clone());
        let Some(index) = self.faults.iter().position(|fault| fault.call == call) else {
            return Ok(());
        };
        if self.faults[index].skip > 0 {
            self.faults[index].skip -= 1;
            return Ok(());
        }
        let fault = self.faults.remove(index);
        Err((
            PlatformError::command_failed(operation_name(&call), target, fault.message),
            fault.leaves_app,
        ))
    }

    fn require(
        &mut self,
        operation: &'static str,
        app: &str,
    ) -> Result<&mut AppRecord, PlatformError> {
        self.apps
            .get_mut(app)
            .ok_or_else(|| PlatformError::command_failed(operation, app, "App not found"))
    }
}

fn operation_name(call: &RemoteCall) -> &'static str {
    match call {
        RemoteCall::Exists(_) => "exists",
        RemoteCall::Rename { .. } => "rename",
        RemoteCall::Push { .. } => "push",
        RemoteCall::Delete(_) => "delete",
        RemoteCall::Start(_) => "start",
        RemoteCall::Stop(_) => "stop",
        RemoteCall::MapRoute { .. } => "map route",
        RemoteCall::UnmapRoute { .. } => "unmap route",
        RemoteCall::FindRoutes(_) => "find routes",
        RemoteCall::ListApps => "list",
    }
}

#[derive(Debug, Default)]
pub struct InMemoryApplicationRepository {
    platform: Mutex<Platform>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(self, name: &str, record: AppRecord) -> Self {
        self.platform.lock().apps.insert(name.to_string(), record);
        self
    }

    /// Make the next call equal to `call` fail with `message`.
    pub fn fail_on(&self, call: RemoteCall, message: &str) {
        self.fail_on_nth(call, 1, message);
    }

    /// Make the `nth` call (1-based) equal to `call` fail with `message`.
    pub fn fail_on_nth(&self, call: RemoteCall, nth: usize, message: &str) {
        self.platform.lock().faults.push(Fault {
            call,
            message: message.to_string(),
            leaves_app: false,
            skip: nth.saturating_sub(1),
        });
    }

    /// Make the next push of `app` fail after the platform already created it,
    /// like a push whose app cannot start.
    pub fn fail_push_leaving_app(
        &self,
        app: &str,
        manifest: &Path,
        path: Option<&Path>,
        message: &str,
    ) {
        self.platform.lock().faults.push(Fault {
            call: RemoteCall::Push {
                app: app.to_string(),
                manifest: manifest.to_path_buf(),
                path: path.map(Path::to_path_buf),
            },
            message: message.to_string(),
            leaves_app: true,
            skip: 0,
        });
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.platform.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<RemoteCall> {
        self.calls().into_iter().filter(RemoteCall::is_mutation).collect()
    }

    pub fn app(&self, name: &str) -> Option<AppRecord> {
        self.platform.lock().apps.get(name).cloned()
    }

    pub fn app_names(&self) -> Vec<String> {
        self.platform.lock().apps.keys().cloned().collect()
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn app_exists(&self, app_name: &str) -> Result<bool, PlatformError> {
        let mut platform = self.platform.lock();
        platform.record(RemoteCall::Exists(app_name.to_string()), app_name)?;
        Ok(platform.apps.contains_key(app_name))
    }

    async fn rename_app(&self, old_name: &str, new_name: &str) -> Result<(), PlatformError> {
        let mut platform = self.platform.lock();
        platform.record(
            RemoteCall::Rename {
                from: old_name.to_string(),
                to: new_name.to_string(),
            },
            old_name,
        )?;
        if platform.apps.contains_key(new_name) {
            return Err(PlatformError::command_failed(
                "rename",
                old_name,
                format!("The app name {} is taken", new_name),
            ));
        }
        let record = platform
            .apps
            .remove(old_name)
            .ok_or_else(|| PlatformError::command_failed("rename", old_name, "App not found"))?;
        platform.apps.insert(new_name.to_string(), record);
        Ok(())
    }

    async fn push_app(
        &self,
        app_name: &str,
        manifest_path: &Path,
        app_path: Option<&Path>,
    ) -> Result<(), PlatformError> {
        let mut platform = self.platform.lock();
        let call = RemoteCall::Push {
            app: app_name.to_string(),
            manifest: manifest_path.to_path_buf(),
            path: app_path.map(Path::to_path_buf),
        };

        match platform.check(call, app_name) {
            Ok(()) => {
                let record = platform
                    .apps
                    .entry(app_name.to_string())
                    .or_insert_with(|| AppRecord::running_on(SIMULATED_DOMAIN, &[app_name]));
                record.running = true;
                record.manifest = Some(manifest_path.to_path_buf());
                Ok(())
            }
            Err((error, leaves_app)) => {
                if leaves_app {
                    platform
                        .apps
                        .entry(app_name.to_string())
                        .or_insert_with(|| AppRecord {
                            running: false,
                            route: Route::empty(SIMULATED_DOMAIN),
                            manifest: Some(manifest_path.to_path_buf()),
                        });
                }
                Err(error)
            }
        }
    }

    async fn delete_app(&self, app_name: &str) -> Result<(), PlatformError> {
        let mut platform = self.platform.lock();
        platform.record(RemoteCall::Delete(app_name.to_string()), app_name)?;
        platform
            .apps
            .remove(app_name)
            .map(|_| ())
            .ok_or_else(|| PlatformError::command_failed("delete", app_name, "App not found"))
    }

    async fn start_app(&self, app_name: &str) -> Result<(), PlatformError> {
        let mut platform = self.platform.lock();
        platform.record(RemoteCall::Start(app_name.to_string()), app_name)?;
        platform.require("start", app_name)?.running = true;
        Ok(())
    }

    async fn stop_app(&self, app_name: &str) -> Result<(), PlatformError> {
        let mut platform = self.platform.lock();
        platform.record(RemoteCall::Stop(app_name.to_string()), app_name)?;
        platform.require("stop", app_name)?.running = false;
        Ok(())
    }

    async fn map_routes(&self, app_name: &str, route: &Route) -> Result<(), PlatformError> {
        if !route.has_hosts() {
            return Err(PlatformError::NoRoutes {
                app: app_name.to_string(),
            });
        }
        let mut platform = self.platform.lock();
        for host in &route.hosts {
            platform.record(
                RemoteCall::MapRoute {
                    app: app_name.to_string(),
                    domain: route.domain.clone(),
                    host: host.clone(),
                },
                app_name,
            )?;
            let record = platform.require("map route", app_name)?;
            record.route.domain = route.domain.clone();
            if !record.route.hosts.contains(host) {
                record.route.hosts.push(host.clone());
            }
        }
        Ok(())
    }

    async fn unmap_routes(&self, app_name: &str, route: &Route) -> Result<(), PlatformError> {
        if !route.has_hosts() {
            return Err(PlatformError::NoRoutes {
                app: app_name.to_string(),
            });
        }
        let mut platform = self.platform.lock();
        for host in &route.hosts {
            platform.record(
                RemoteCall::UnmapRoute {
                    app: app_name.to_string(),
                    domain: route.domain.clone(),
                    host: host.clone(),
                },
                app_name,
            )?;
            platform
                .require("unmap route", app_name)?
                .route
                .hosts
                .retain(|h| h != host);
        }
        Ok(())
    }

    async fn find_routes(&self, app_name: &str) -> Result<Route, PlatformError> {
        let mut platform = self.platform.lock();
        platform.record(RemoteCall::FindRoutes(app_name.to_string()), app_name)?;
        let route = platform.require("find routes", app_name)?.route.clone();
        if !route.has_hosts() {
            return Err(PlatformError::NoRoutes {
                app: app_name.to_string(),
            });
        }
        Ok(route)
    }

    async fn list_apps(&self) -> Result<(), PlatformError> {
        self.platform.lock().record(RemoteCall::ListApps, "all apps")?;
        Ok(())
    }
}
