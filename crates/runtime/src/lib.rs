// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! orca-runtime: Container runtime adapters for OrcaOps

pub mod driver;
pub mod subprocess;

pub use driver::{ContainerStats, CreateOpts, DriverError, ExecOutput, RuntimeDriver};

pub use driver::DockerCliDriver;

#[cfg(any(test, feature = "test-support"))]
pub use driver::{DriverCall, FakeDriver, FakeExecResult};
