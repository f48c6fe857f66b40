// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod cf_cli;
pub mod cf_repository;
pub mod in_memory;

pub use cf_cli::{CfCliConnection, CliConnection, CliError};
pub use cf_repository::CfApplicationRepository;
pub use in_memory::{AppRecord, InMemoryApplicationRepository, RemoteCall};
