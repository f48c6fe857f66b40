// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Application Service
//!
//! Entry point for both workflows:
//!
//! 1. Validate the request (no remote calls on failure)
//! 2. Query current state and build the plan
//! 3. Execute the plan as a saga with the rewind warning
//! 4. Return a structured outcome; exit behavior is the caller's decision

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::push::build_push_plan;
use crate::application::rollback::{build_rollback_plan, verify_preconditions};
use crate::application::saga::{ActionStep, Saga, SagaFailure};
use crate::domain::app::AppIdentity;
use crate::domain::errors::{PlatformError, ValidationError};
use crate::domain::options::ReplaceRequest;
use crate::domain::repository::ApplicationRepository;

pub const REWIND_FAILURE_MESSAGE: &str =
    "Oh no. Something's gone wrong. I've tried to roll back but you should check to see if everything is OK.";

pub const PUSH_SUCCESS_MESSAGE: &str =
    "A new version of your application has successfully been pushed!";

pub const ROLLBACK_SUCCESS_MESSAGE: &str = "Your application has been successfully rolled back!";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A state query made while building the plan failed; nothing has run.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Saga(#[from] SagaFailure),
}

impl DeployError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True once any plan step has been attempted.
    pub fn workflow_started(&self) -> bool {
        matches!(self, Self::Saga(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    /// Push of an app that did not exist yet
    NewApp,
    /// Blue-green replace of an existing app
    Replace,
    Rollback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub app_name: String,
    pub kind: WorkflowKind,
    pub steps: Vec<&'static str>,
    pub message: &'static str,
}

pub struct DeploymentService {
    repository: Arc<dyn ApplicationRepository>,
    cancellation: Option<CancellationToken>,
}

impl DeploymentService {
    pub fn new(repository: Arc<dyn ApplicationRepository>) -> Self {
        Self {
            repository,
            cancellation: None,
        }
    }

    /// Stop between steps (and unwind) once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Push a new version of an app, replacing the running one if present.
    pub async fn replace(&self, request: ReplaceRequest) -> Result<DeployOutcome, DeployError> {
        let request = request.validate()?;
        let plan = build_push_plan(&self.repository, &request).await?;

        let kind = if plan.app_exists {
            WorkflowKind::Replace
        } else {
            WorkflowKind::NewApp
        };

        let steps = self.run(plan.steps).await?;
        info!(app = %request.app_name, "Push completed");

        Ok(DeployOutcome {
            app_name: request.app_name,
            kind,
            steps,
            message: PUSH_SUCCESS_MESSAGE,
        })
    }

    /// Revert an app to the version kept as `<app>-venerable`.
    pub async fn rollback(&self, app_name: &str) -> Result<DeployOutcome, DeployError> {
        if app_name.trim().is_empty() {
            return Err(ValidationError::MissingAppName.into());
        }

        let identity = AppIdentity::new(app_name);
        verify_preconditions(self.repository.as_ref(), &identity).await?;

        let steps = self.run(build_rollback_plan(&self.repository, &identity)).await?;
        info!(app = %identity, "Rollback completed");

        Ok(DeployOutcome {
            app_name: identity.live().to_string(),
            kind: WorkflowKind::Rollback,
            steps,
            message: ROLLBACK_SUCCESS_MESSAGE,
        })
    }

    pub async fn list_apps(&self) -> Result<(), PlatformError> {
        self.repository.list_apps().await
    }

    async fn run(&self, steps: Vec<ActionStep>) -> Result<Vec<&'static str>, SagaFailure> {
        let mut saga = Saga::new(steps, REWIND_FAILURE_MESSAGE);
        if let Some(token) = &self.cancellation {
            saga = saga.with_cancellation(token.clone());
        }

        let names = saga.step_names();
        saga.execute().await?;
        Ok(names)
    }
}
