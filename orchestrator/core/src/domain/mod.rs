// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value types, naming rules, errors and the platform contract shared by the
//! replace and rollback workflows.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure data and interfaces, no I/O

pub mod app;
pub mod config;
pub mod errors;
pub mod options;
pub mod repository;
pub mod route;

pub use app::{rollback_app_name, venerable_app_name, AppIdentity};
pub use config::AutopilotConfig;
pub use errors::{PlatformError, ValidationError};
pub use options::{DeploymentOptions, FinalizeStrategy, ReplaceRequest, ValidatedReplace};
pub use repository::ApplicationRepository;
pub use route::Route;
