// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and serve loop (§6): acquire the exclusive lock first,
//! create every directory the rest of startup depends on, replay the
//! event log into both the materialized projection and a reconstructed
//! [`CaseRegistry`], bind the HTTP listener LAST (only once everything
//! that could fail already has), then serve until a shutdown signal
//! arrives.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use yawl_adapters::{AuthProvider, ExceptionHandler, HttpExceptionHandler, NoAuthProvider, NoExceptionHandler, StaticTokenAuthProvider};
use yawl_storage::{MaterializedState, Wal};

use crate::announcer::Announcer;
use crate::config::Config;
use crate::error::DaemonError;
use crate::http::{router, AppState};
use crate::recovery;
use crate::registry::CaseRegistry;
use crate::session::SessionStore;
use crate::timeout_sweeper;

/// Start the daemon and serve Interfaces A/B/E/X until the process
/// receives a shutdown signal (ctrl-c or SIGTERM). Returns once the HTTP
/// server has drained in-flight requests and stopped.
pub async fn serve(config: Config) -> Result<(), DaemonError> {
    let bootstrap = bootstrap(&config).await;
    let bootstrap = match bootstrap {
        Ok(b) => b,
        Err(err) => {
            cleanup_on_failure(&config, &err);
            return Err(err);
        }
    };

    let Bootstrap { registry, listener, lock_file: _lock_file } = bootstrap;

    let sweeper = timeout_sweeper::spawn(Arc::clone(&registry), config.timeout_sweep_interval);

    let state = Arc::new(AppState { registry, sessions: Arc::new(session_store(&config)) });
    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    info!(addr = %config.http_addr, "yawl daemon ready");
    let result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;

    sweeper.abort();
    result.map_err(DaemonError::Io)?;
    info!("yawl daemon shut down");
    Ok(())
}

struct Bootstrap {
    registry: Arc<CaseRegistry>,
    listener: tokio::net::TcpListener,
    /// Held only to keep the exclusive lock until `serve` returns.
    lock_file: std::fs::File,
}

async fn bootstrap(config: &Config) -> Result<Bootstrap, DaemonError> {
    // 1. Directories the lock file and WAL live under.
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire the exclusive lock FIRST, before anything else can race
    // on the state directory (teacher's startup ordering).
    let lock_file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(DaemonError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Open the WAL and replay it into both the cheap read projection
    // and a freshly reconstructed case registry.
    let wal = Wal::open(&config.wal_path, 0)?;
    let entries = wal.entries_after(0)?;
    let replay_count = entries.len();
    let materialized = MaterializedState::replay(&entries);

    let announcer = Arc::new(Announcer::new());
    let exception_handler = exception_handler(config);
    let registry = Arc::new(CaseRegistry::new(wal, materialized, announcer, exception_handler, config.case_lock_timeout, config.retire_grace));

    recovery::recover(&entries, &registry)?;

    if replay_count > 0 {
        info!(replayed = replay_count, "replayed event log");
    }

    // 4. Bind the HTTP listener LAST: any failure before this point
    // leaves no listening socket for a client to mistakenly reach.
    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .map_err(|source| DaemonError::BindFailed { addr: config.http_addr, source })?;

    Ok(Bootstrap { registry, listener, lock_file })
}

fn session_store(config: &Config) -> SessionStore {
    let auth: Box<dyn AuthProvider> = match &config.auth_token {
        Some(token) => Box::new(StaticTokenAuthProvider::new(token.clone())),
        None => Box::new(NoAuthProvider),
    };
    SessionStore::new(auth)
}

fn exception_handler(config: &Config) -> Arc<dyn ExceptionHandler> {
    match &config.exception_handler_url {
        Some(url) => Arc::new(HttpExceptionHandler::new(url)),
        None => Arc::new(NoExceptionHandler),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Remove whatever bootstrap created before failing, except the lock file
/// when the failure was acquiring that very lock — those bytes belong to
/// the daemon instance already holding it.
fn cleanup_on_failure(config: &Config, err: &DaemonError) {
    if !matches!(err, DaemonError::LockFailed(_)) && config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
