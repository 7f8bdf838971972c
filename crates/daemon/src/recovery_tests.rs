use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use yawl_adapters::{ExceptionHandler, FakeExceptionHandler};
use yawl_core::test_support::{composite_descent_spec, straight_line_spec};
use yawl_core::{spec::TaskId, CaseId, ExceptionDecision, WorkitemId};
use yawl_runtime::{CaseStatus, WorkitemStatus};
use yawl_storage::{MaterializedState, Wal};
use yawl_wire::WorkitemFilter;

use crate::announcer::Announcer;

use super::*;

fn fresh_registry(dir: &tempfile::TempDir, decision: ExceptionDecision) -> CaseRegistry {
    let wal = Wal::open(dir.path().join("events.jsonl"), 0).unwrap();
    let materialized = MaterializedState::new();
    let announcer = Arc::new(Announcer::new());
    let handler: Arc<dyn ExceptionHandler> = Arc::new(FakeExceptionHandler::always(decision));
    CaseRegistry::new(wal, materialized, announcer, handler, Duration::from_millis(200), Duration::from_secs(300))
}

fn replay_into(dir: &tempfile::TempDir) -> CaseRegistry {
    let path = dir.path().join("events.jsonl");
    let wal = Wal::open(&path, 0).unwrap();
    let entries = wal.entries_after(0).unwrap();
    let fresh = fresh_registry(dir, ExceptionDecision::Escalate);
    recover(&entries, &fresh).unwrap();
    fresh
}

#[test]
fn completed_case_recovers_to_completed() {
    let dir = tempdir().unwrap();
    let registry = fresh_registry(&dir, ExceptionDecision::Escalate);
    registry.restore_specification(straight_line_spec());
    let case_id = registry.launch_case("test-spec", "1.0", "urn:test:spec", HashMap::new(), 0).unwrap();
    let id = WorkitemId::new(case_id.clone(), TaskId::from("T1"));
    registry.checkout(&case_id, &id, "alice", 1).unwrap();
    registry.checkin(case_id.clone(), id, HashMap::new(), 2).unwrap();
    drop(registry);

    let recovered = replay_into(&dir);
    assert_eq!(recovered.case_status(&case_id).unwrap().status, CaseStatus::Completed);
}

#[test]
fn suspended_case_recovers_with_live_workitem_still_enabled() {
    let dir = tempdir().unwrap();
    let registry = fresh_registry(&dir, ExceptionDecision::Escalate);
    registry.restore_specification(straight_line_spec());
    let case_id = registry.launch_case("test-spec", "1.0", "urn:test:spec", HashMap::new(), 0).unwrap();
    registry.suspend_case(&case_id, 1).unwrap();
    drop(registry);

    let recovered = replay_into(&dir);
    assert_eq!(recovered.case_status(&case_id).unwrap().status, CaseStatus::Suspended);
    let items = recovered.list_workitems(&WorkitemFilter { case_id: Some(case_id.to_string()), ..Default::default() });
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, WorkitemStatus::Enabled);
}

#[tokio::test]
async fn failed_workitem_retried_via_exception_handler_recovers_enabled() {
    let dir = tempdir().unwrap();
    let registry = fresh_registry(&dir, ExceptionDecision::Retry);
    registry.restore_specification(straight_line_spec());
    let case_id = registry.launch_case("test-spec", "1.0", "urn:test:spec", HashMap::new(), 0).unwrap();
    let id = WorkitemId::new(case_id.clone(), TaskId::from("T1"));
    registry.checkout(&case_id, &id, "alice", 1).unwrap();
    registry.fail(case_id.clone(), id, "boom".into(), 2).await.unwrap();
    drop(registry);

    let recovered = replay_into(&dir);
    let items = recovered.list_workitems(&WorkitemFilter { case_id: Some(case_id.to_string()), ..Default::default() });
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, WorkitemStatus::Enabled);
}

#[test]
fn composite_descent_recovers_both_parent_and_child_case() {
    let dir = tempdir().unwrap();
    let registry = fresh_registry(&dir, ExceptionDecision::Escalate);
    registry.restore_specification(composite_descent_spec());
    let parent_id = registry.launch_case("test-spec", "1.0", "urn:test:spec", HashMap::new(), 0).unwrap();
    let child_id = CaseId::new(format!("{parent_id}.1"));
    drop(registry);

    let recovered = replay_into(&dir);
    assert_eq!(recovered.case_status(&parent_id).unwrap().status, CaseStatus::Active);
    assert_eq!(recovered.case_status(&child_id).unwrap().status, CaseStatus::Active);

    let leaf = WorkitemId::new(child_id.clone(), TaskId::from("Tleaf"));
    recovered.checkout(&child_id, &leaf, "alice", 10).unwrap();
    recovered.checkin(child_id.clone(), leaf, HashMap::new(), 11).unwrap();
    assert_eq!(recovered.case_status(&child_id).unwrap().status, CaseStatus::Completed);
    assert_eq!(recovered.case_status(&parent_id).unwrap().status, CaseStatus::Completed);
}
