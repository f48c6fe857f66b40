// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Autopilot core
//!
//! Zero-downtime replace and rollback of platform applications, built as
//! plans of compensating steps.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, saga executor, workflow builders and the
//!   platform adapters they run against

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
