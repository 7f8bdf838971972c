// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use yawl_core::{CaseId, EventKind, EventRecord, TaskId, WorkitemId};

use super::*;

fn event(seq: u64, case: &str, kind: EventKind, payload: serde_json::Value) -> EventRecord {
    EventRecord { seq, ts_ms: 1, case_id: Some(CaseId::new(case)), kind, payload }
}

#[test]
fn tracks_case_status_transitions() {
    let mut state = MaterializedState::new();
    state.apply(&event(1, "1", EventKind::CaseStarted, json!({})));
    assert_eq!(state.case(&CaseId::new("1")).unwrap().status, CaseStatusSnapshot::Active);

    state.apply(&event(2, "1", EventKind::CaseSuspended, json!({})));
    assert_eq!(state.case(&CaseId::new("1")).unwrap().status, CaseStatusSnapshot::Suspended);

    state.apply(&event(3, "1", EventKind::CaseCompleted, json!({})));
    assert_eq!(state.case(&CaseId::new("1")).unwrap().status, CaseStatusSnapshot::Completed);
}

#[test]
fn tracks_workitem_status_by_id() {
    let mut state = MaterializedState::new();
    let wid = WorkitemId::new(CaseId::new("1"), TaskId::from("T1"));
    let payload = json!({ "workitem_id": wid.to_string() });

    state.apply(&event(1, "1", EventKind::CaseStarted, json!({})));
    state.apply(&event(2, "1", EventKind::WorkitemEnabled, payload.clone()));
    assert_eq!(
        state.case(&CaseId::new("1")).unwrap().workitems.get(&wid),
        Some(&WorkitemStatusSnapshot::Enabled)
    );

    state.apply(&event(3, "1", EventKind::WorkitemStarted, payload.clone()));
    assert_eq!(
        state.case(&CaseId::new("1")).unwrap().workitems.get(&wid),
        Some(&WorkitemStatusSnapshot::Started)
    );

    state.apply(&event(4, "1", EventKind::WorkitemCompleted, payload));
    assert_eq!(
        state.case(&CaseId::new("1")).unwrap().workitems.get(&wid),
        Some(&WorkitemStatusSnapshot::Completed)
    );
}

#[test]
fn replaying_the_same_entries_twice_is_idempotent() {
    let wid = WorkitemId::new(CaseId::new("1"), TaskId::from("T1"));
    let entries = vec![
        WalEntry { seq: 1, record: event(1, "1", EventKind::CaseStarted, json!({})) },
        WalEntry {
            seq: 2,
            record: event(2, "1", EventKind::WorkitemEnabled, json!({ "workitem_id": wid.to_string() })),
        },
    ];

    let once = MaterializedState::replay(&entries);
    let mut twice_applied = MaterializedState::new();
    for entry in entries.iter().chain(entries.iter()) {
        twice_applied.apply(&entry.record);
    }

    assert_eq!(once.case(&CaseId::new("1")).unwrap().last_seq, twice_applied.case(&CaseId::new("1")).unwrap().last_seq);
    assert_eq!(
        once.case(&CaseId::new("1")).unwrap().workitems.get(&wid),
        twice_applied.case(&CaseId::new("1")).unwrap().workitems.get(&wid)
    );
}

#[test]
fn engine_wide_events_are_not_attributed_to_a_case() {
    let mut state = MaterializedState::new();
    let mut record = event(1, "1", EventKind::SpecificationLoaded, json!({}));
    record.case_id = None;
    state.apply(&record);
    assert!(state.case(&CaseId::new("1")).is_none());
}
