// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod deployment;
pub mod push;
pub mod rollback;
pub mod saga;

// Re-export use cases for convenience
pub use deployment::{DeployError, DeployOutcome, DeploymentService, WorkflowKind};
pub use saga::{ActionStep, FailureCause, Saga, SagaFailure, UnwindFailure};
