// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deploy-rollback plan builder
//!
//! Reverts `X` to the version kept as `X-venerable`:
//!
//! ```text
//! rename X → X-rollback                     (undo: rename back)
//! move X-rollback's routes onto X-venerable (undo: move them back)
//! rename X-venerable → X                    (undo: rename X → X-venerable)
//! start X
//! delete X-rollback
//! ```
//!
//! Both `X` and `X-venerable` must exist; that is checked before any step is
//! built.

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::deployment::DeployError;
use crate::application::saga::ActionStep;
use crate::domain::app::AppIdentity;
use crate::domain::errors::{PlatformError, ValidationError};
use crate::domain::repository::{find_routes_or_empty, ApplicationRepository};

/// Fails with a validation error when the live or the venerable app is missing.
pub async fn verify_preconditions(
    repository: &dyn ApplicationRepository,
    identity: &AppIdentity,
) -> Result<(), DeployError> {
    if !repository.app_exists(identity.live()).await? {
        return Err(ValidationError::LiveAppNotFound(identity.live().to_string()).into());
    }
    if !repository.app_exists(identity.venerable()).await? {
        return Err(ValidationError::VenerableAppNotFound(identity.live().to_string()).into());
    }
    Ok(())
}

pub fn build_rollback_plan(
    repository: &Arc<dyn ApplicationRepository>,
    identity: &AppIdentity,
) -> Vec<ActionStep> {
    let live = identity.live().to_string();
    let venerable = identity.venerable().to_string();
    let rollback = identity.rollback().to_string();

    vec![
        rename_step("rename live app aside", repository, &live, &rollback),
        reconcile_routes(repository, &venerable, &rollback),
        rename_step("promote previous version", repository, &venerable, &live),
        start_step(repository.clone(), live),
        delete_remnant(repository.clone(), rollback),
    ]
}

/// Rename `from` → `to`, undone by renaming `to` → `from`.
fn rename_step(
    name: &'static str,
    repository: &Arc<dyn ApplicationRepository>,
    from: &str,
    to: &str,
) -> ActionStep {
    let (repo, old_name, new_name) = (repository.clone(), from.to_string(), to.to_string());
    let (undo_repo, undo_old, undo_new) = (repository.clone(), to.to_string(), from.to_string());

    ActionStep::new(name, move || async move { repo.rename_app(&old_name, &new_name).await })
        .with_reverse(move || async move { undo_repo.rename_app(&undo_old, &undo_new).await })
}

/// Traffic follows whichever app is about to be live: an unrouted venerable
/// app takes over the routes of the app being rolled back.
fn reconcile_routes(
    repository: &Arc<dyn ApplicationRepository>,
    venerable: &str,
    rollback: &str,
) -> ActionStep {
    let (repo, target, source) = (repository.clone(), venerable.to_string(), rollback.to_string());
    let (undo_repo, undo_target, undo_source) =
        (repository.clone(), rollback.to_string(), venerable.to_string());

    ActionStep::new("move routes to previous version", move || async move {
        move_routes_if_unrouted(repo.as_ref(), &target, &source).await
    })
    .with_reverse(move || async move {
        move_routes_if_unrouted(undo_repo.as_ref(), &undo_target, &undo_source).await
    })
}

/// If `target` has no routes, map `source`'s routes onto it and unmap them
/// from `source`.
async fn move_routes_if_unrouted(
    repository: &dyn ApplicationRepository,
    target: &str,
    source: &str,
) -> Result<(), PlatformError> {
    let target_route = find_routes_or_empty(repository, target).await?;
    if target_route.has_hosts() {
        info!(app = target, routes = %target_route, "App already has routes, leaving them");
        return Ok(());
    }

    let source_route = find_routes_or_empty(repository, source).await?;
    if !source_route.has_hosts() {
        warn!(app = target, from = source, "Neither app has routes, nothing to move");
        return Ok(());
    }

    info!(app = target, from = source, routes = %source_route, "Moving routes");
    repository.map_routes(target, &source_route).await?;
    repository.unmap_routes(source, &source_route).await
}

fn start_step(repository: Arc<dyn ApplicationRepository>, live: String) -> ActionStep {
    ActionStep::new("start previous version", move || async move {
        repository.start_app(&live).await
    })
}

fn delete_remnant(repository: Arc<dyn ApplicationRepository>, rollback: String) -> ActionStep {
    ActionStep::new("delete rolled back version", move || async move {
        repository.delete_app(&rollback).await
    })
}
