// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Saga Executor
//!
//! Runs an ordered plan of [`ActionStep`]s and, when a forward operation
//! fails, unwinds the steps that already succeeded using their compensating
//! operations.
//!
//! # Unwind Order
//!
//! ```text
//! forward:  step[0] ─▶ step[1] ─▶ … ─▶ step[k] ✗
//! reverse:  step[k-1] ─▶ step[k-2] ─▶ … ─▶ step[0]
//! ```
//!
//! Unwind is best-effort: a failing reverse operation is recorded and the
//! remaining reverses still run, since earlier steps may have created remote
//! entities that would otherwise be orphaned.
//!
//! A plan is single-use: each operation is `FnOnce`, and [`Saga::execute`]
//! consumes the saga.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::errors::PlatformError;

/// A deferred remote operation.
pub type Operation = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), PlatformError>> + Send>;

fn boxed<F, Fut>(operation: F) -> Operation
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), PlatformError>> + Send + 'static,
{
    Box::new(move || operation().boxed())
}

/// A forward operation paired with an optional compensating operation.
pub struct ActionStep {
    name: &'static str,
    forward: Operation,
    reverse: Option<Operation>,
}

impl ActionStep {
    /// A step with no compensating operation.
    pub fn new<F, Fut>(name: &'static str, forward: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), PlatformError>> + Send + 'static,
    {
        Self {
            name,
            forward: boxed(forward),
            reverse: None,
        }
    }

    /// Attach the operation that undoes this step's forward effect.
    pub fn with_reverse<F, Fut>(mut self, reverse: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), PlatformError>> + Send + 'static,
    {
        self.reverse = Some(boxed(reverse));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_reversible(&self) -> bool {
        self.reverse.is_some()
    }
}

impl fmt::Debug for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionStep")
            .field("name", &self.name)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}

/// Why the forward sequence stopped.
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Step(#[from] PlatformError),

    #[error("workflow cancelled")]
    Cancelled,
}

/// A compensating operation that failed during unwind.
#[derive(Debug)]
pub struct UnwindFailure {
    pub step: &'static str,
    pub error: PlatformError,
}

/// Aggregate report of a failed plan: the primary cause, every unwind failure
/// in the order it occurred, and the caller's fallback warning.
#[derive(Debug)]
pub struct SagaFailure {
    pub step: &'static str,
    pub cause: FailureCause,
    pub unwind_failures: Vec<UnwindFailure>,
    pub warning: String,
}

impl SagaFailure {
    /// True when at least one compensating operation failed, so the remote
    /// state may not match what it was before the workflow started.
    pub fn recovery_incomplete(&self) -> bool {
        !self.unwind_failures.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, FailureCause::Cancelled)
    }
}

impl fmt::Display for SagaFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.cause)?;
        for failure in &self.unwind_failures {
            write!(
                f,
                "\nundoing step '{}' also failed: {}",
                failure.step, failure.error
            )?;
        }
        write!(f, "\n{}", self.warning)
    }
}

impl std::error::Error for SagaFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// An ordered, single-use plan of steps plus the warning reported on failure.
pub struct Saga {
    steps: Vec<ActionStep>,
    fallback_message: String,
    cancellation: Option<CancellationToken>,
}

impl Saga {
    pub fn new(steps: Vec<ActionStep>, fallback_message: impl Into<String>) -> Self {
        Self {
            steps,
            fallback_message: fallback_message.into(),
            cancellation: None,
        }
    }

    /// Stop before the next forward step once `token` is cancelled.
    /// Steps that already ran are still unwound.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(ActionStep::name).collect()
    }

    pub async fn execute(self) -> Result<(), SagaFailure> {
        let total = self.steps.len();
        let mut completed: Vec<(&'static str, Option<Operation>)> = Vec::with_capacity(total);

        for (index, step) in self.steps.into_iter().enumerate() {
            let ActionStep {
                name,
                forward,
                reverse,
            } = step;

            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                warn!(step = name, "Workflow cancelled, unwinding completed steps");
                let unwind_failures = unwind(completed).await;
                return Err(SagaFailure {
                    step: name,
                    cause: FailureCause::Cancelled,
                    unwind_failures,
                    warning: self.fallback_message,
                });
            }

            info!(step = name, "Running step {}/{}", index + 1, total);

            match forward().await {
                Ok(()) => completed.push((name, reverse)),
                Err(error) => {
                    warn!(step = name, error = %error, "Step failed, unwinding completed steps");
                    let unwind_failures = unwind(completed).await;
                    return Err(SagaFailure {
                        step: name,
                        cause: FailureCause::Step(error),
                        unwind_failures,
                        warning: self.fallback_message,
                    });
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Saga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Saga")
            .field("steps", &self.steps)
            .field("fallback_message", &self.fallback_message)
            .finish()
    }
}

async fn unwind(mut completed: Vec<(&'static str, Option<Operation>)>) -> Vec<UnwindFailure> {
    let mut failures = Vec::new();

    while let Some((name, reverse)) = completed.pop() {
        let Some(reverse) = reverse else {
            continue;
        };

        info!(step = name, "Undoing step");
        if let Err(error) = reverse().await {
            warn!(step = name, error = %error, "Undo failed, continuing unwind");
            failures.push(UnwindFailure { step: name, error });
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type CallLog = Arc<Mutex<Vec<String>>>;

    const WARNING: &str = "check everything is OK";

    type Ready = futures::future::Ready<Result<(), PlatformError>>;

    fn op(log: &CallLog, entry: String, fail: bool) -> impl FnOnce() -> Ready {
        let log = log.clone();
        move || {
            log.lock().push(entry.clone());
            futures::future::ready(if fail {
                Err(PlatformError::command_failed("test", entry, "boom"))
            } else {
                Ok(())
            })
        }
    }

    /// Step `name` whose forward fails when `fail` is set, with a reverse
    /// that fails when `reverse` is `Some(true)`.
    fn step(log: &CallLog, name: &'static str, fail: bool, reverse: Option<bool>) -> ActionStep {
        let step = ActionStep::new(name, op(log, format!("forward:{name}"), fail));
        match reverse {
            Some(reverse_fails) => {
                step.with_reverse(op(log, format!("reverse:{name}"), reverse_fails))
            }
            None => step,
        }
    }

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().clone()
    }

    #[tokio::test]
    async fn test_all_steps_succeed_without_unwind() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![
                step(&log, "a", false, Some(false)),
                step(&log, "b", false, Some(false)),
                step(&log, "c", false, None),
            ],
            WARNING,
        );

        saga.execute().await.unwrap();

        assert_eq!(calls(&log), vec!["forward:a", "forward:b", "forward:c"]);
    }

    #[tokio::test]
    async fn test_failure_unwinds_previous_steps_in_reverse_order() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![
                step(&log, "a", false, Some(false)),
                step(&log, "b", false, Some(false)),
                step(&log, "c", false, Some(false)),
                step(&log, "d", true, Some(false)),
                step(&log, "e", false, Some(false)),
            ],
            WARNING,
        );

        let failure = saga.execute().await.unwrap_err();

        assert_eq!(
            calls(&log),
            vec![
                "forward:a",
                "forward:b",
                "forward:c",
                "forward:d",
                "reverse:c",
                "reverse:b",
                "reverse:a",
            ]
        );
        assert_eq!(failure.step, "d");
        assert!(!failure.recovery_incomplete());
        assert_eq!(failure.warning, WARNING);
    }

    #[tokio::test]
    async fn test_first_step_failure_runs_no_reverse() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![
                step(&log, "a", true, Some(false)),
                step(&log, "b", false, Some(false)),
            ],
            WARNING,
        );

        let failure = saga.execute().await.unwrap_err();

        assert_eq!(calls(&log), vec!["forward:a"]);
        assert!(matches!(failure.cause, FailureCause::Step(_)));
    }

    #[tokio::test]
    async fn test_unwind_continues_after_reverse_failure() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![
                step(&log, "a", false, Some(true)),
                step(&log, "b", false, Some(true)),
                step(&log, "c", false, Some(false)),
                step(&log, "d", true, None),
            ],
            WARNING,
        );

        let failure = saga.execute().await.unwrap_err();

        assert_eq!(
            calls(&log),
            vec![
                "forward:a",
                "forward:b",
                "forward:c",
                "forward:d",
                "reverse:c",
                "reverse:b",
                "reverse:a",
            ]
        );
        let failed: Vec<&str> = failure.unwind_failures.iter().map(|f| f.step).collect();
        assert_eq!(failed, vec!["b", "a"]);
        assert!(failure.recovery_incomplete());
    }

    #[tokio::test]
    async fn test_steps_without_reverse_are_skipped_during_unwind() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![
                step(&log, "a", false, Some(false)),
                step(&log, "b", false, None),
                step(&log, "c", true, Some(false)),
            ],
            WARNING,
        );

        saga.execute().await.unwrap_err();

        assert_eq!(
            calls(&log),
            vec!["forward:a", "forward:b", "forward:c", "reverse:a"]
        );
    }

    #[tokio::test]
    async fn test_report_combines_cause_unwind_errors_and_warning() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![step(&log, "rename", false, Some(true)), step(&log, "push", true, None)],
            WARNING,
        );

        let report = saga.execute().await.unwrap_err().to_string();

        assert!(report.starts_with("step 'push' failed: test of forward:push failed: boom"));
        assert!(report.contains("undoing step 'rename' also failed"));
        assert!(report.ends_with(WARNING));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let log = CallLog::default();
        let token = CancellationToken::new();
        token.cancel();

        let failure = Saga::new(vec![step(&log, "a", false, Some(false))], WARNING)
            .with_cancellation(token)
            .execute()
            .await
            .unwrap_err();

        assert!(calls(&log).is_empty());
        assert!(failure.is_cancelled());
        assert_eq!(failure.step, "a");
    }

    #[tokio::test]
    async fn test_cancellation_between_steps_unwinds() {
        let log = CallLog::default();
        let token = CancellationToken::new();

        let cancel = {
            let token = token.clone();
            let forward_log = log.clone();
            ActionStep::new("b", move || {
                forward_log.lock().push("forward:b".to_string());
                token.cancel();
                futures::future::ready(Ok(()))
            })
            .with_reverse(op(&log, "reverse:b".to_string(), false))
        };

        let failure = Saga::new(
            vec![
                step(&log, "a", false, Some(false)),
                cancel,
                step(&log, "c", false, Some(false)),
            ],
            WARNING,
        )
        .with_cancellation(token)
        .execute()
        .await
        .unwrap_err();

        assert_eq!(
            calls(&log),
            vec!["forward:a", "forward:b", "reverse:b", "reverse:a"]
        );
        assert!(failure.is_cancelled());
        assert_eq!(failure.step, "c");
    }

    #[test]
    fn test_step_names() {
        let log = CallLog::default();
        let saga = Saga::new(
            vec![step(&log, "a", false, None), step(&log, "b", false, Some(false))],
            WARNING,
        );
        assert_eq!(saga.step_names(), vec!["a", "b"]);
        assert_eq!(saga.len(), 2);
        assert!(!saga.is_empty());
    }
}
