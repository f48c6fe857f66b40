// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::time::Duration;
use thiserror::Error;

/// Problems detected before any workflow step is built.
///
/// Nothing has executed when one of these is returned, so no unwind is needed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a manifest is required to push this application")]
    NoManifest,

    #[error("an application name is required")]
    MissingAppName,

    #[error("Live version of app \"{0}\" not found, cannot rollback.")]
    LiveAppNotFound(String),

    #[error(
        "Venerable version of \"{0}\" not found, cannot rollback. Make sure you push with the \
         --keep-existing-app flag to leave the venerable version behind."
    )]
    VenerableAppNotFound(String),
}

/// A failed call against the application platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{operation} of {target} failed: {message}")]
    CommandFailed {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("no routes for app {app}")]
    NoRoutes { app: String },

    #[error("malformed response to {operation}: {message}")]
    MalformedResponse {
        operation: &'static str,
        message: String,
    },

    #[error("no target space is set, run `cf target` first")]
    NoTargetSpace,

    #[error("{operation} of {target} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        target: String,
        timeout: Duration,
    },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlatformError {
    pub fn command_failed(
        operation: &'static str,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            operation,
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn malformed(operation: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            message: message.into(),
        }
    }

    pub fn is_no_routes(&self) -> bool {
        matches!(self, Self::NoRoutes { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_manifest_message() {
        assert_eq!(
            ValidationError::NoManifest.to_string(),
            "a manifest is required to push this application"
        );
    }

    #[test]
    fn test_venerable_not_found_message() {
        let msg = ValidationError::VenerableAppNotFound("foo".into()).to_string();
        assert!(msg.starts_with("Venerable version of \"foo\" not found"));
        assert!(msg.contains("--keep-existing-app"));
    }

    #[test]
    fn test_command_failed_names_operation_and_target() {
        let err = PlatformError::command_failed("rename", "foo", "no app");
        assert_eq!(err.to_string(), "rename of foo failed: no app");
        assert!(!err.is_no_routes());
        assert!(PlatformError::NoRoutes { app: "foo".into() }.is_no_routes());
    }
}
