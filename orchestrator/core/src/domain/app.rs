// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Identity
//!
//! A single logical application `X` is represented on the platform by up to
//! three distinct app records while a workflow is in flight:
//!
//! | Name | Role |
//! |------|------|
//! | `X` | live, user-facing version |
//! | `X-venerable` | previous version, kept aside during a replace |
//! | `X-rollback` | live version renamed aside during a rollback |
//!
//! At steady state only one of `X` / `X-venerable` serves as the live identity.

use std::fmt;

const VENERABLE_SUFFIX: &str = "-venerable";
const ROLLBACK_SUFFIX: &str = "-rollback";

/// Name of the previous version kept aside during a replace.
pub fn venerable_app_name(app_name: &str) -> String {
    format!("{}{}", app_name, VENERABLE_SUFFIX)
}

/// Name of the live version while a rollback is in progress.
pub fn rollback_app_name(app_name: &str) -> String {
    format!("{}{}", app_name, ROLLBACK_SUFFIX)
}

/// The three derived names of one logical application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppIdentity {
    live: String,
    venerable: String,
    rollback: String,
}

impl AppIdentity {
    pub fn new(app_name: impl Into<String>) -> Self {
        let live = app_name.into();
        Self {
            venerable: venerable_app_name(&live),
            rollback: rollback_app_name(&live),
            live,
        }
    }

    pub fn live(&self) -> &str {
        &self.live
    }

    pub fn venerable(&self) -> &str {
        &self.venerable
    }

    pub fn rollback(&self) -> &str {
        &self.rollback
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        assert_eq!(venerable_app_name("foo"), "foo-venerable");
        assert_eq!(rollback_app_name("foo"), "foo-rollback");
    }

    #[test]
    fn test_derived_names_never_collide_with_live() {
        for name in ["a", "foo", "foo-venerable", "my-app-rollback", "x y"] {
            assert_ne!(venerable_app_name(name), name);
            assert_ne!(rollback_app_name(name), name);
            assert_ne!(venerable_app_name(name), rollback_app_name(name));
        }
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = AppIdentity::new("billing");
        let b = AppIdentity::new(String::from("billing"));
        assert_eq!(a, b);
        assert_eq!(a.live(), "billing");
        assert_eq!(a.venerable(), "billing-venerable");
        assert_eq!(a.rollback(), "billing-rollback");
        assert_eq!(a.to_string(), "billing");
    }
}
