// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yawl stop`: sends `SIGTERM` to the pid recorded in the daemon's lock
//! file, triggering the same graceful-shutdown path as Ctrl-C
//! ([`yawl_daemon::lifecycle::serve`]'s `shutdown_signal`).

use yawl_daemon::Config;

use crate::exit_error::ExitError;

pub fn stop() -> Result<(), ExitError> {
    let config = Config::from_env().map_err(ExitError::from)?;
    let pid = read_pid(&config.lock_path).ok_or_else(|| ExitError::new(1, "yawl daemon is not running"))?;
    send_sigterm(pid)?;
    println!("sent shutdown signal to yawl daemon (pid {pid})");
    Ok(())
}

fn read_pid(lock_path: &std::path::Path) -> Option<u32> {
    std::fs::read_to_string(lock_path).ok()?.trim().parse().ok()
}

#[cfg(unix)]
fn send_sigterm(pid: u32) -> Result<(), ExitError> {
    let status = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .map_err(|err| ExitError::new(1, format!("failed to signal pid {pid}: {err}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(ExitError::new(1, format!("no process with pid {pid} (stale lock file?)")))
    }
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> Result<(), ExitError> {
    Err(ExitError::new(1, "stop is only supported on unix targets"))
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
