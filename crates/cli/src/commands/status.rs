// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yawl status`: reports whether a daemon instance holds the exclusive
//! lock in the configured state directory, and if so, its pid.

use fs2::FileExt;
use yawl_daemon::Config;

use crate::exit_error::ExitError;

pub fn status() -> Result<(), ExitError> {
    let config = Config::from_env().map_err(ExitError::from)?;
    match running_pid(&config.lock_path) {
        Some(pid) => println!("yawl daemon is running (pid {pid})"),
        None => println!("yawl daemon is not running"),
    }
    Ok(())
}

/// `None` both when no lock file exists and when it exists but nothing
/// currently holds it (a stale file left by an unclean shutdown).
fn running_pid(lock_path: &std::path::Path) -> Option<u32> {
    let file = std::fs::File::open(lock_path).ok()?;
    if file.try_lock_exclusive().is_ok() {
        let _ = file.unlock();
        return None;
    }
    let contents = std::fs::read_to_string(lock_path).ok()?;
    contents.trim().parse().ok()
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
