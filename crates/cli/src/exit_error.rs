// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Carries a process exit code alongside a message so `main()` is the only
//! place that calls [`std::process::exit`].

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<yawl_daemon::DaemonError> for ExitError {
    fn from(err: yawl_daemon::DaemonError) -> Self {
        let code = err.exit_code();
        Self::new(code, err.to_string())
    }
}
