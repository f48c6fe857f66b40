// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Repository Interface
//!
//! Contract for the remote application platform, defined in the domain layer
//! and implemented in `crate::infrastructure`.
//!
//! | Implementation | Backend |
//! |----------------|---------|
//! | `CfApplicationRepository` | the `cf` CLI |
//! | `InMemoryApplicationRepository` | simulated platform for tests |
//!
//! Every call is a single round-trip; nothing is retried. Workflow builders
//! capture an `Arc<dyn ApplicationRepository>` inside their step closures.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::errors::PlatformError;
use crate::domain::route::Route;

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Whether an app with exactly this name exists in the targeted space
    async fn app_exists(&self, app_name: &str) -> Result<bool, PlatformError>;

    async fn rename_app(&self, old_name: &str, new_name: &str) -> Result<(), PlatformError>;

    /// Push `app_name` from a manifest, optionally overriding the source path
    async fn push_app(
        &self,
        app_name: &str,
        manifest_path: &Path,
        app_path: Option<&Path>,
    ) -> Result<(), PlatformError>;

    async fn delete_app(&self, app_name: &str) -> Result<(), PlatformError>;

    async fn start_app(&self, app_name: &str) -> Result<(), PlatformError>;

    async fn stop_app(&self, app_name: &str) -> Result<(), PlatformError>;

    /// Map every host of `route` onto the app, one call per host in order.
    /// Fails with `PlatformError::NoRoutes` on an empty host list.
    async fn map_routes(&self, app_name: &str, route: &Route) -> Result<(), PlatformError>;

    /// Unmap every host of `route` from the app, one call per host in order.
    /// Fails with `PlatformError::NoRoutes` on an empty host list.
    async fn unmap_routes(&self, app_name: &str, route: &Route) -> Result<(), PlatformError>;

    /// Routes currently mapped to the app.
    /// Fails with `PlatformError::NoRoutes` when the app has none.
    async fn find_routes(&self, app_name: &str) -> Result<Route, PlatformError>;

    /// Print the application listing of the targeted space
    async fn list_apps(&self) -> Result<(), PlatformError>;
}

/// Routes of `app_name`, treating "no routes" as an empty host list.
pub async fn find_routes_or_empty(
    repository: &dyn ApplicationRepository,
    app_name: &str,
) -> Result<Route, PlatformError> {
    match repository.find_routes(app_name).await {
        Ok(route) => Ok(route),
        Err(e) if e.is_no_routes() => Ok(Route::default()),
        Err(e) => Err(e),
    }
}
