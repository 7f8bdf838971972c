// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yawl_core::spec::{ConditionId, NetId, TaskId};
use yawl_core::CaseDocument;

use super::*;

fn task(s: &str) -> TaskId {
    TaskId::from(s)
}

fn wi(case: &CaseRuntime, task_id: &str) -> WorkitemId {
    WorkitemId::new(case.case_id.clone(), task(task_id))
}

fn fresh() -> CaseRuntime {
    CaseRuntime::new(CaseId::new("c1"), NetId::new("root"), CaseDocument::empty())
}

#[test]
fn new_case_starts_active_with_empty_marking() {
    let case = fresh();
    assert_eq!(case.status, CaseStatus::Active);
    assert!(case.marking.is_empty());
    assert!(case.workitems.is_empty());
}

#[test]
fn instance_suffixes_are_monotonic_within_a_case() {
    let mut case = fresh();
    assert_eq!(case.next_instance_suffix(), 1);
    assert_eq!(case.next_instance_suffix(), 2);
    assert_eq!(case.next_instance_suffix(), 3);
}

#[test]
fn has_live_workitems_for_task_ignores_terminal_items() {
    let mut case = fresh();
    let id = wi(&case, "T1");
    let mut item = WorkItem::new_enabled(id.clone(), CaseDocument::empty(), false, None, 0, 0);
    case.insert_workitem(item.clone());
    assert!(case.has_live_workitems_for_task(&task("T1")));

    item.checkout("alice", 10).unwrap();
    item.complete(CaseDocument::empty(), 20).unwrap();
    case.insert_workitem(item);
    assert!(!case.has_live_workitems_for_task(&task("T1")));
}

#[test]
fn withdraw_workitem_only_affects_live_items() {
    let mut case = fresh();
    let id = wi(&case, "T1");
    case.insert_workitem(WorkItem::new_enabled(id.clone(), CaseDocument::empty(), true, None, 0, 0));
    assert!(case.withdraw_workitem(&id));
    assert!(!case.withdraw_workitem(&id));
}

#[test]
fn live_workitems_in_places_filters_by_task_place() {
    let mut case = fresh();
    let id1 = wi(&case, "T1");
    let id2 = wi(&case, "T2");
    case.insert_workitem(WorkItem::new_enabled(id1.clone(), CaseDocument::empty(), false, None, 0, 0));
    case.insert_workitem(WorkItem::new_enabled(id2.clone(), CaseDocument::empty(), false, None, 0, 0));

    let places = vec![Place::Task(task("T1")), Place::Condition(ConditionId::new("c"))];
    let found = case.live_workitems_in_places(&places);
    assert_eq!(found, vec![id1]);
}

#[test]
fn mi_group_ready_to_fire_on_threshold_without_all_terminal() {
    let mut case = fresh();
    let i1 = wi(&case, "T1");
    let i2 = wi(&case, "T1");
    case.insert_workitem(WorkItem::new_enabled(i1.clone(), CaseDocument::empty(), false, None, 0, 0));
    case.insert_workitem(WorkItem::new_enabled(i2.clone(), CaseDocument::empty(), false, None, 0, 0));

    let group = MiGroup { min: 1, max: 2, threshold: 1, instances: vec![i1, i2], completed: 1, fired: false };
    assert!(group.ready_to_fire(&case.workitems));
}

#[test]
fn mi_group_waits_when_below_threshold_and_not_all_terminal() {
    let case = fresh();
    let group = MiGroup {
        min: 1,
        max: 2,
        threshold: 2,
        instances: vec![WorkitemId::new(case.case_id.clone(), task("T1"))],
        completed: 0,
        fired: false,
    };
    assert!(!group.ready_to_fire(&case.workitems));
}

#[test]
fn mi_group_does_not_refire_once_fired() {
    let case = fresh();
    let group = MiGroup { min: 1, max: 1, threshold: 1, instances: vec![], completed: 5, fired: true };
    assert!(!group.ready_to_fire(&case.workitems));
}
