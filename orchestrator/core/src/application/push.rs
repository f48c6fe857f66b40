// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deploy-replace plan builder
//!
//! Decides, from whether `X` already exists, which steps replace it:
//!
//! ```text
//! new app:       push X
//! existing app:  delete stale X-venerable
//!                rename X → X-venerable      (undo: restore X)
//!                push X                      (undo: restore X)
//!                stop | unmap | delete X-venerable
//! ```
//!
//! Restoring `X` deletes whatever occupies the live name and renames
//! `X-venerable` back. A failed push is undone by the rename step, since the
//! failing step itself is never reversed; once `X-venerable` has been renamed
//! back, later restores have nothing left to do.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::saga::ActionStep;
use crate::domain::app::AppIdentity;
use crate::domain::errors::PlatformError;
use crate::domain::options::{FinalizeStrategy, ValidatedReplace};
use crate::domain::repository::ApplicationRepository;

/// The steps of a replace plus the existence check they were chosen from.
#[derive(Debug)]
pub struct PushPlan {
    pub app_exists: bool,
    pub steps: Vec<ActionStep>,
}

/// Query the platform once and build the matching plan.
/// The existence check is the only remote call made here.
pub async fn build_push_plan(
    repository: &Arc<dyn ApplicationRepository>,
    request: &ValidatedReplace,
) -> Result<PushPlan, PlatformError> {
    let identity = AppIdentity::new(request.app_name.as_str());
    let app_exists = repository.app_exists(identity.live()).await?;

    let steps = if app_exists {
        info!(app = %identity, "App exists, replacing it");
        existing_app_steps(repository, &identity, request)
    } else {
        info!(app = %identity, "App does not exist yet, pushing it");
        new_app_steps(repository, &identity, request)
    };

    Ok(PushPlan { app_exists, steps })
}

fn new_app_steps(
    repository: &Arc<dyn ApplicationRepository>,
    identity: &AppIdentity,
    request: &ValidatedReplace,
) -> Vec<ActionStep> {
    vec![push_step(repository.clone(), identity.live().to_string(), request)]
}

fn existing_app_steps(
    repository: &Arc<dyn ApplicationRepository>,
    identity: &AppIdentity,
    request: &ValidatedReplace,
) -> Vec<ActionStep> {
    let live = identity.live().to_string();
    let venerable = identity.venerable().to_string();

    let push = {
        let repository = repository.clone();
        let live = live.clone();
        let venerable = venerable.clone();
        push_step(repository.clone(), live.clone(), request).with_reverse(move || async move {
            restore_live(repository.as_ref(), &live, &venerable).await
        })
    };

    vec![
        delete_stale_venerable(repository.clone(), venerable.clone()),
        demote_live(repository.clone(), live, venerable.clone()),
        push,
        finalize_venerable(repository.clone(), venerable, request.options.finalize_strategy()),
    ]
}

fn push_step(
    repository: Arc<dyn ApplicationRepository>,
    app_name: String,
    request: &ValidatedReplace,
) -> ActionStep {
    let manifest_path: PathBuf = request.manifest_path.clone();
    let app_path: Option<PathBuf> = request.app_path.clone();

    ActionStep::new("push new version", move || async move {
        repository
            .push_app(&app_name, &manifest_path, app_path.as_deref())
            .await
    })
}

/// Leftover `X-venerable` from an interrupted earlier run; forward-only.
fn delete_stale_venerable(
    repository: Arc<dyn ApplicationRepository>,
    venerable: String,
) -> ActionStep {
    ActionStep::new("delete stale previous version", move || async move {
        if repository.app_exists(&venerable).await? {
            info!(app = %venerable, "Found old version of app running, deleting.");
            repository.delete_app(&venerable).await
        } else {
            Ok(())
        }
    })
}

fn demote_live(
    repository: Arc<dyn ApplicationRepository>,
    live: String,
    venerable: String,
) -> ActionStep {
    let (undo_repository, undo_live, undo_venerable) =
        (repository.clone(), live.clone(), venerable.clone());

    ActionStep::new("rename live app aside", move || async move {
        repository.rename_app(&live, &venerable).await
    })
    .with_reverse(move || async move {
        restore_live(undo_repository.as_ref(), &undo_live, &undo_venerable).await
    })
}

/// Clear whatever a push left under the live name, then give the previous
/// version its name back. A no-op once `venerable` is gone.
///
/// Nothing is deleted unless both apps are known to exist: an unanswered
/// existence check fails the restore instead.
async fn restore_live(
    repository: &dyn ApplicationRepository,
    live: &str,
    venerable: &str,
) -> Result<(), PlatformError> {
    if !repository.app_exists(venerable).await? {
        info!(app = live, "Previous version already restored");
        return Ok(());
    }

    if repository.app_exists(live).await? {
        // A failed delete shows up as the rename failing on the taken name.
        if let Err(error) = repository.delete_app(live).await {
            warn!(
                app = live,
                error = %error,
                "Failed to delete partially pushed app"
            );
        }
    }

    repository.rename_app(venerable, live).await
}

/// Runs only after the new version is live; forward-only.
fn finalize_venerable(
    repository: Arc<dyn ApplicationRepository>,
    venerable: String,
    strategy: FinalizeStrategy,
) -> ActionStep {
    ActionStep::new("retire previous version", move || async move {
        match strategy {
            FinalizeStrategy::Stop => {
                info!(
                    app = %venerable,
                    "Stopping old version of app. Remove the --keep-existing-app flag to delete it automatically."
                );
                repository.stop_app(&venerable).await
            }
            FinalizeStrategy::UnmapRoutes => {
                info!(
                    app = %venerable,
                    "Unmapping routes for the old version of app. Remove the --unmap-routes flag to delete it."
                );
                match repository.find_routes(&venerable).await {
                    Ok(route) => repository.unmap_routes(&venerable, &route).await,
                    Err(error) if error.is_no_routes() => {
                        warn!(
                            app = %venerable,
                            "Old version of app has no routes, nothing to unmap"
                        );
                        Ok(())
                    }
                    Err(error) => Err(error),
                }
            }
            FinalizeStrategy::Delete => {
                info!(
                    app = %venerable,
                    "Deleting old version of app. Use the --keep-existing-app flag to preserve it."
                );
                repository.delete_app(&venerable).await
            }
        }
    })
}
