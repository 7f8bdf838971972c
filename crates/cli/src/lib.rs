// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! yawl: the process bootstrap binary. Resolves configuration, starts or
//! signals the daemon, and turns [`DaemonError`](yawl_daemon::DaemonError)
//! into the exit codes §6 specifies. Kept as a library so `main.rs` stays a
//! thin dispatcher and commands are independently testable.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod commands;
pub mod exit_error;

pub use exit_error::ExitError;
