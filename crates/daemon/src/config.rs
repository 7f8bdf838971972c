// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, resolved from the environment at startup (§6).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::DaemonError;

/// Overlay read from an optional TOML file (§2 ambient "Configuration"):
/// every field is optional, and anything present here is overridden by the
/// matching `YAWL_*` environment variable so the file is safe to check in
/// while secrets and per-host addresses stay in the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    http_addr: Option<String>,
    auth_token: Option<String>,
    exception_handler_url: Option<String>,
    case_lock_timeout_ms: Option<u64>,
    retire_grace_secs: Option<u64>,
    timeout_sweep_ms: Option<u64>,
}

impl TomlConfig {
    fn load(path: &std::path::Path) -> Result<Self, DaemonError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(DaemonError::Io(err)),
        };
        toml::from_str(&raw).map_err(|source| DaemonError::ConfigFile { path: path.to_path_buf(), source })
    }
}

/// Runtime configuration for one daemon instance. Every path lives under
/// [`Config::state_dir`]; nothing here is mutable once [`crate::serve`] has
/// started.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub wal_path: PathBuf,
    pub http_addr: SocketAddr,
    /// Shared secret checked by [`yawl_adapters::StaticTokenAuthProvider`].
    /// When unset, [`Config::from_env`] falls back to an allow-all
    /// provider, matching local-development use.
    pub auth_token: Option<String>,
    /// Base URL an Interface X callback is POSTed to (§6). When unset, no
    /// exception handler is reachable and every timeout/failure escalates
    /// immediately (§7's default policy).
    pub exception_handler_url: Option<String>,
    /// Bound on per-case lock acquisition before a caller sees `BusyError`
    /// (§5).
    pub case_lock_timeout: Duration,
    /// How long a terminal case's record stays queryable after its runtime
    /// is evicted (§4.7 "Retire").
    pub retire_grace: Duration,
    /// Interval between SLA sweeps over started work items (§4.6).
    pub timeout_sweep_interval: Duration,
}

impl Config {
    /// Resolve configuration from the process environment and an optional
    /// TOML file, environment taking precedence over the file and the file
    /// taking precedence over the hard default:
    ///
    /// - `YAWL_STATE_DIR` > `XDG_STATE_HOME/yawl` > `~/.local/state/yawl`
    /// - `YAWL_CONFIG_FILE` (default `<state_dir>/config.toml`, silently
    ///   skipped if absent)
    /// - `YAWL_HTTP_ADDR` (default `127.0.0.1:4433`)
    /// - `YAWL_AUTH_TOKEN` (optional)
    /// - `YAWL_EXCEPTION_HANDLER_URL` (optional)
    /// - `YAWL_CASE_LOCK_TIMEOUT_MS` (default 2000)
    /// - `YAWL_RETIRE_GRACE_SECS` (default 300)
    /// - `YAWL_TIMEOUT_SWEEP_MS` (default 1000)
    #[allow(clippy::expect_used)]
    pub fn from_env() -> Result<Self, DaemonError> {
        let state_dir = state_dir()?;
        let config_path = std::env::var("YAWL_CONFIG_FILE").map(PathBuf::from).unwrap_or_else(|_| state_dir.join("config.toml"));
        let file = TomlConfig::load(&config_path)?;

        let http_addr = std::env::var("YAWL_HTTP_ADDR")
            .ok()
            .or(file.http_addr)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:4433".parse().expect("valid default addr"));

        Ok(Self {
            lock_path: state_dir.join("daemon.lock"),
            wal_path: state_dir.join("wal").join("events.jsonl"),
            http_addr,
            auth_token: str_var("YAWL_AUTH_TOKEN").or(file.auth_token).filter(|s| !s.is_empty()),
            exception_handler_url: str_var("YAWL_EXCEPTION_HANDLER_URL").or(file.exception_handler_url).filter(|s| !s.is_empty()),
            case_lock_timeout: duration_ms_var("YAWL_CASE_LOCK_TIMEOUT_MS", file.case_lock_timeout_ms, 2_000),
            retire_grace: Duration::from_secs(secs_var("YAWL_RETIRE_GRACE_SECS", file.retire_grace_secs, 300)),
            timeout_sweep_interval: duration_ms_var("YAWL_TIMEOUT_SWEEP_MS", file.timeout_sweep_ms, 1_000),
            state_dir,
        })
    }
}

fn str_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn state_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("YAWL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("yawl"));
    }
    let home = std::env::var("HOME").map_err(|_| DaemonError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/yawl"))
}

fn duration_ms_var(name: &str, file_value: Option<u64>, default_ms: u64) -> Duration {
    Duration::from_millis(std::env::var(name).ok().and_then(|s| s.parse().ok()).or(file_value).unwrap_or(default_ms))
}

fn secs_var(name: &str, file_value: Option<u64>, default_secs: u64) -> u64 {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).or(file_value).unwrap_or(default_secs)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
