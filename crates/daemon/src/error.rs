// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level errors (bootstrap/lifecycle, §6 exit codes) and the mapping
//! from [`yawl_core::EngineError`] onto an HTTP status + [`ErrorResponse`]
//! body at the Interface A/B/X boundary (§7).

use axum::http::StatusCode;
use thiserror::Error;
use yawl_core::{AuthError, ConflictError, EngineError, LogError, NotFoundError, ValidationError};
use yawl_wire::ErrorResponse;

/// Bootstrap and lifecycle failures. [`DaemonError::exit_code`] matches
/// §6's CLI exit code table exactly.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire daemon lock: another instance is already running")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind HTTP listener at {addr}: {source}")]
    BindFailed { addr: std::net::SocketAddr, source: std::io::Error },
    #[error("event log error: {0}")]
    Wal(#[from] yawl_storage::WalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("event log is inconsistent with itself at replay: {0}")]
    Recovery(String),
    #[error("failed to parse config file {path}: {source}")]
    ConfigFile { path: std::path::PathBuf, source: toml::de::Error },
}

impl DaemonError {
    /// Process exit code for the CLI bootstrap binary (§6): 0 normal
    /// shutdown (not produced by this enum), 1 config error, 2 log
    /// unrecoverable, 3 port bind failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::NoStateDir | DaemonError::LockFailed(_) => 1,
            DaemonError::Wal(_) => 2,
            DaemonError::Recovery(_) => 2,
            DaemonError::BindFailed { .. } => 3,
            DaemonError::Io(_) => 1,
            DaemonError::ConfigFile { .. } => 1,
        }
    }
}

/// Map a kernel-level [`EngineError`] onto the HTTP status + structured
/// body Interfaces A and B return (§7): Validation/Auth/Conflict/NotFound
/// become 4xx, Busy becomes 503 with `Retry-After`, a fatal `LogError`
/// becomes 500 (the case/engine-wide degradation itself is recorded as a
/// `SYSTEM_DEGRADED` event by the caller, not here), and a case-fatal
/// `NetSemanticError` still returns 200 since the failure is recorded in
/// the case rather than rejected at the boundary — callers that reach this
/// function for a `NetSemanticError` are reporting it out-of-band (e.g. a
/// background sweep), not rejecting a request, so 500 is used there too.
pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::Auth(AuthError::InsufficientScope { .. }) => StatusCode::FORBIDDEN,
        EngineError::Auth(_) => StatusCode::UNAUTHORIZED,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Log(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::NetSemantic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::ExceptionHandler(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The wire `kind` tag for an [`EngineError`], one word per taxonomy row
/// (§7).
pub fn kind_for(err: &EngineError) -> &'static str {
    match err {
        EngineError::Validation(ValidationError::Specification(_)) => "validation_specification",
        EngineError::Validation(ValidationError::MalformedRequest(_)) => "validation_malformed_request",
        EngineError::Auth(AuthError::MissingSession) => "auth_missing_session",
        EngineError::Auth(AuthError::SessionExpired { .. }) => "auth_session_expired",
        EngineError::Auth(AuthError::InsufficientScope { .. }) => "auth_insufficient_scope",
        EngineError::Conflict(ConflictError::AlreadyOwned(_)) => "conflict_already_owned",
        EngineError::Conflict(ConflictError::SpecificationInUse(_)) => "conflict_specification_in_use",
        EngineError::Conflict(ConflictError::SpecificationNotLoaded(_)) => "conflict_specification_not_loaded",
        EngineError::Conflict(ConflictError::InvalidTransition(_)) => "conflict_invalid_transition",
        EngineError::Conflict(ConflictError::DuplicateCheckin(_)) => "conflict_duplicate_checkin",
        EngineError::NotFound(NotFoundError::Case(_)) => "not_found_case",
        EngineError::NotFound(NotFoundError::Workitem(_)) => "not_found_workitem",
        EngineError::NotFound(NotFoundError::Specification(_)) => "not_found_specification",
        EngineError::Busy(_) => "busy",
        EngineError::Log(LogError::AppendFailed(_)) => "log_append_failed",
        EngineError::Log(LogError::Unreadable(_)) => "log_unreadable",
        EngineError::Log(LogError::Pending) => "log_pending",
        EngineError::NetSemantic(_) => "net_semantic_error",
        EngineError::ExceptionHandler(_) => "exception_handler_error",
    }
}

pub fn to_response(err: &EngineError) -> ErrorResponse {
    ErrorResponse::new(kind_for(err), err.to_string())
}

/// `yawl_runtime::RunnerError` is narrower than [`EngineError`] (it never
/// produces an auth, validation, busy, or log failure); widen it at the
/// registry boundary.
pub fn from_runner_error(err: yawl_runtime::RunnerError) -> EngineError {
    match err {
        yawl_runtime::RunnerError::NotFound(e) => EngineError::NotFound(e),
        yawl_runtime::RunnerError::Conflict(e) => EngineError::Conflict(e),
        yawl_runtime::RunnerError::NetSemantic(e) => EngineError::NetSemantic(e),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
