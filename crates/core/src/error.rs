// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy (§7): one variant group per error kind, aggregated into
//! `EngineError` for kernel call sites. No `anyhow` here —
//! every caller that needs to react differently per kind (HTTP status
//! mapping, CLI exit code, retry policy) matches on this enum directly.

use thiserror::Error;

use crate::ids::{CaseId, WorkitemId};
use crate::spec::SpecId;

/// Malformed spec or malformed request payload. Does not mutate state.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("specification failed validation: {0:?}")]
    Specification(Vec<crate::spec::Diagnostic>),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// Missing/expired session or insufficient scope. No state change.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session found for token")]
    MissingSession,
    #[error("session expired at {expires_at_ms}")]
    SessionExpired { expires_at_ms: u64 },
    #[error("principal lacks required scope {required:?}")]
    InsufficientScope { required: &'static str },
}

/// Work item already checked out; spec delete with live cases; launch
/// against an unloaded spec. Surfaced to caller; no state change.
#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("workitem {0} already owned by another principal")]
    AlreadyOwned(WorkitemId),
    #[error("specification {0} has active cases and cannot be deleted")]
    SpecificationInUse(SpecId),
    #[error("specification {0} is not loaded")]
    SpecificationNotLoaded(SpecId),
    #[error("workitem {0} is not in a state that accepts this transition")]
    InvalidTransition(WorkitemId),
    #[error("duplicate checkin for workitem {0} with identical output; no-op")]
    DuplicateCheckin(WorkitemId),
}

/// Unknown case-id, workitem-id, or spec-id.
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("case {0} not found")]
    Case(CaseId),
    #[error("workitem {0} not found")]
    Workitem(WorkitemId),
    #[error("specification {0} not found")]
    Specification(SpecId),
}

/// Per-case lock not acquired within deadline. Retriable by caller.
#[derive(Debug, Error)]
#[error("case {case_id} busy: lock not acquired within {waited_ms}ms")]
pub struct BusyError {
    pub case_id: CaseId,
    pub waited_ms: u64,
}

/// Event log append failed and durability could not be verified (§4.4, §7).
/// Fatal: the calling operation is aborted and the engine enters degraded
/// read-only mode until the log is restored.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("event log append failed: {0}")]
    AppendFailed(String),
    #[error("event log is unreadable: {0}")]
    Unreadable(String),
    #[error("event log append is still pending; downstream effects held")]
    Pending,
}

/// Deadlock detected, MI bounds violated at fire time, or a required-path
/// predicate evaluation error. Fatal for the case; not retriable.
#[derive(Debug, Error)]
pub enum NetSemanticError {
    #[error("case {case_id} deadlocked with marking {marking:?}")]
    Deadlock { case_id: CaseId, marking: Vec<String> },
    #[error("MI task {task_id} in case {case_id} violated bounds: created {created} < min {min}")]
    MiBoundsViolated { case_id: CaseId, task_id: String, created: u32, min: u32 },
    #[error("predicate evaluation failed on required path: {0}")]
    PredicateFailed(String),
}

/// Interface X callback unreachable or returned a malformed decision.
/// Policy default: escalate (§7, §9).
#[derive(Debug, Error)]
pub enum ExceptionHandlerError {
    #[error("exception handler callback unreachable: {0}")]
    Unreachable(String),
    #[error("exception handler returned a malformed decision: {0}")]
    MalformedDecision(String),
}

/// Aggregate error for kernel call sites, mirroring §7's taxonomy 1:1.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Busy(#[from] BusyError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    NetSemantic(#[from] NetSemanticError),
    #[error(transparent)]
    ExceptionHandler(#[from] ExceptionHandlerError),
}

impl EngineError {
    /// Whether a caller may locally retry without operator intervention:
    /// `BusyError` always, plus log errors the caller observed as merely
    /// pending rather than confirmed-failed (§7 propagation policy).
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::Busy(_)) || matches!(self, EngineError::Log(LogError::Pending))
    }

    /// Process exit code for the CLI bootstrap binary (§6).
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Log(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
