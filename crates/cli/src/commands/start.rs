// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yawl start`: resolve configuration, then run the daemon in the
//! foreground until a shutdown signal arrives (§6 exit codes: 0 normal
//! shutdown, 1 config error, 2 log unrecoverable, 3 port bind failure).

use yawl_daemon::Config;

use crate::exit_error::ExitError;

pub async fn start() -> Result<(), ExitError> {
    let config = Config::from_env().map_err(ExitError::from)?;
    tracing::info!(addr = %config.http_addr, state_dir = %config.state_dir.display(), "starting yawl daemon");
    yawl_daemon::serve(config).await.map_err(ExitError::from)
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
