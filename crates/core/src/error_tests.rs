// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn busy_error_is_retriable() {
    let err = EngineError::Busy(BusyError { case_id: CaseId::new("1"), waited_ms: 50 });
    assert!(err.is_retriable());
}

#[test]
fn log_error_not_pending_is_not_retriable() {
    let err = EngineError::Log(LogError::AppendFailed("disk full".into()));
    assert!(!err.is_retriable());
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn conflict_error_is_not_retriable_and_exits_one() {
    let err = EngineError::Conflict(ConflictError::AlreadyOwned(WorkitemId::new(
        CaseId::new("1"),
        crate::spec::TaskId::from("T1"),
    )));
    assert!(!err.is_retriable());
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn pending_log_error_is_retriable() {
    let err = EngineError::Log(LogError::Pending);
    assert!(err.is_retriable());
}
