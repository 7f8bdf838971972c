use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use yawl_adapters::{ExceptionHandler, FakeExceptionHandler};
use yawl_core::test_support::straight_line_spec;
use yawl_core::{spec::TaskId, ExceptionDecision, WorkitemId};
use yawl_runtime::WorkitemStatus;
use yawl_storage::{MaterializedState, Wal};
use yawl_wire::WorkitemFilter;

use crate::announcer::Announcer;
use crate::registry::CaseRegistry;

use super::sweep_once;

fn spec_with_sla(sla_ms: u64) -> yawl_core::spec::SpecificationModel {
    let mut model = straight_line_spec();
    for task in model.tasks.values_mut() {
        task.sla_ms = Some(sla_ms);
        task.retry_limit = 1;
    }
    model
}

fn registry(decision: ExceptionDecision) -> (CaseRegistry, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let wal = Wal::open(dir.path().join("events.jsonl"), 0).unwrap();
    let materialized = MaterializedState::new();
    let announcer = Arc::new(Announcer::new());
    let handler: Arc<dyn ExceptionHandler> = Arc::new(FakeExceptionHandler::always(decision));
    (
        CaseRegistry::new(wal, materialized, announcer, handler, Duration::from_millis(200), Duration::from_secs(300)),
        dir,
    )
}

#[tokio::test]
async fn overrun_started_workitem_is_escalated_to_failed() {
    let (registry, _dir) = registry(ExceptionDecision::Escalate);
    registry.restore_specification(spec_with_sla(10));
    let case_id = registry.launch_case("test-spec", "1.0", "urn:test:spec", std::collections::HashMap::new(), 0).unwrap();
    let id = WorkitemId::new(case_id.clone(), TaskId::from("T1"));
    registry.checkout(&case_id, &id, "alice", 0).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    sweep_once(&registry).await;

    let items = registry.list_workitems(&WorkitemFilter { case_id: Some(case_id.to_string()), ..Default::default() });
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, WorkitemStatus::Failed);
}

#[tokio::test]
async fn workitem_within_sla_is_left_alone() {
    let (registry, _dir) = registry(ExceptionDecision::Escalate);
    registry.restore_specification(spec_with_sla(60_000));
    let case_id = registry.launch_case("test-spec", "1.0", "urn:test:spec", std::collections::HashMap::new(), 0).unwrap();
    let id = WorkitemId::new(case_id.clone(), TaskId::from("T1"));
    registry.checkout(&case_id, &id, "alice", 0).unwrap();

    sweep_once(&registry).await;

    let items = registry.list_workitems(&WorkitemFilter { case_id: Some(case_id.to_string()), ..Default::default() });
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, WorkitemStatus::Started);
}
