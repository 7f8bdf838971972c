// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yawl_core::test_support::{
    and_split_and_join_spec, cancellation_set_spec, composite_descent_spec, deadlock_spec, mi_spec,
    straight_line_spec, xor_fallthrough_spec,
};
use yawl_core::{CaseDocument, EventKind, WorkitemId};

use super::*;

fn root_case(spec: &yawl_core::SpecificationModel) -> CaseRuntime {
    let mut case = CaseRuntime::new(CaseId::new("1"), spec.root_net.clone(), CaseDocument::empty());
    for c in spec.input_conditions(&spec.root_net) {
        case.marking.add_token(Place::Condition(c.clone()));
    }
    case
}

fn run(case: &mut CaseRuntime, spec: &yawl_core::SpecificationModel) -> RunOutcome {
    run_to_quiescence(case, spec, 0).unwrap()
}

#[test]
fn single_task_case_completes_in_exactly_five_events() {
    // §8 scenario 1: CASE_STARTED (caller-side), WORKITEM_ENABLED, checkout
    // (no event), WORKITEM_COMPLETED, NET_MARKING_CHANGED, CASE_COMPLETED —
    // five durable events total once CASE_STARTED is folded in by the
    // caller that launches the case.
    let spec = straight_line_spec();
    let mut case = root_case(&spec);
    let started = run(&mut case, &spec);
    assert_eq!(started.events.len(), 1);
    assert_eq!(started.events[0].kind, EventKind::WorkitemEnabled);

    let id = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &id, "alice", 1).unwrap();

    let outcome = checkin(&mut case, &spec, &id, CaseDocument::empty(), 2).unwrap();
    let kinds: Vec<EventKind> = outcome.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::WorkitemCompleted, EventKind::NetMarkingChanged, EventKind::CaseCompleted]
    );
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));
    assert_eq!(case.status, CaseStatus::Completed);
}

#[test]
fn duplicate_checkin_is_rejected_as_conflict() {
    let spec = straight_line_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);
    let id = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &id, "alice", 1).unwrap();
    checkin(&mut case, &spec, &id, CaseDocument::empty(), 2).unwrap();

    let err = checkin(&mut case, &spec, &id, CaseDocument::empty(), 3).unwrap_err();
    assert!(matches!(err, RunnerError::Conflict(yawl_core::ConflictError::DuplicateCheckin(_))));
}

#[test]
fn and_split_and_join_drains_both_branches_before_completing() {
    let spec = and_split_and_join_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);

    let t2 = WorkitemId::new(case.case_id.clone(), TaskId::from("T2"));
    let t3 = WorkitemId::new(case.case_id.clone(), TaskId::from("T3"));
    checkout(&mut case, &t2, "bob", 1).unwrap();
    let outcome = checkin(&mut case, &spec, &t2, CaseDocument::empty(), 2).unwrap();
    // T4's AND-join still needs T3's token.
    assert!(outcome.terminal.is_none());
    assert!(!case.has_live_workitems_for_task(&TaskId::from("T4")));

    checkout(&mut case, &t3, "carol", 3).unwrap();
    let outcome = checkin(&mut case, &spec, &t3, CaseDocument::empty(), 4).unwrap();
    assert!(case.has_live_workitems_for_task(&TaskId::from("T4")));
    assert!(outcome.terminal.is_none());

    let t4 = WorkitemId::new(case.case_id.clone(), TaskId::from("T4"));
    checkout(&mut case, &t4, "dave", 5).unwrap();
    let outcome = checkin(&mut case, &spec, &t4, CaseDocument::empty(), 6).unwrap();
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));
}

#[test]
fn xor_split_with_no_matching_predicate_falls_through_to_default_branch() {
    let spec = xor_fallthrough_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);

    let t1 = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &t1, "alice", 1).unwrap();
    checkin(&mut case, &spec, &t1, CaseDocument::empty(), 2).unwrap();

    assert!(case.has_live_workitems_for_task(&TaskId::from("T4")));
    assert!(!case.has_live_workitems_for_task(&TaskId::from("T2")));
    assert!(!case.has_live_workitems_for_task(&TaskId::from("T3")));
}

#[test]
fn mi_task_fires_output_side_once_threshold_reached_and_withdraws_stragglers() {
    let spec = mi_spec(2, 4, 2, "4");
    let mut case = root_case(&spec);
    run(&mut case, &spec);
    assert_eq!(case.workitems_for_task(&TaskId::from("T")).len(), 4);

    let instances: Vec<WorkitemId> = case.mi_groups[&TaskId::from("T")].instances.clone();
    checkout(&mut case, &instances[0], "a", 1).unwrap();
    let outcome = checkin(&mut case, &spec, &instances[0], CaseDocument::empty(), 2).unwrap();
    assert!(outcome.terminal.is_none());

    checkout(&mut case, &instances[1], "b", 3).unwrap();
    let outcome = checkin(&mut case, &spec, &instances[1], CaseDocument::empty(), 4).unwrap();
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));

    let withdrawn: Vec<_> =
        outcome.events.iter().filter(|e| e.kind == EventKind::WorkitemWithdrawn).collect();
    assert_eq!(withdrawn.len(), 2);
    assert!(case.mi_groups[&TaskId::from("T")].fired);
}

#[test]
fn skipping_a_skippable_task_proceeds_through_its_output_side() {
    let mut spec = straight_line_spec();
    spec.tasks.get_mut(&TaskId::from("T1")).unwrap().skippable = true;
    let mut case = root_case(&spec);
    run(&mut case, &spec);

    let id = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    let outcome = skip(&mut case, &spec, &id, 1).unwrap();
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));
}

#[test]
fn failed_workitem_can_be_retried_up_to_its_limit() {
    let mut spec = straight_line_spec();
    spec.tasks.get_mut(&TaskId::from("T1")).unwrap().retry_limit = 1;
    let mut case = root_case(&spec);
    run(&mut case, &spec);

    let id = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &id, "alice", 1).unwrap();
    fail(&mut case, &id, "boom", 2).unwrap();

    retry(&mut case, &id, 3).unwrap();
    assert_eq!(case.workitems[&id].status, WorkitemStatus::Enabled);

    checkout(&mut case, &id, "alice", 4).unwrap();
    fail(&mut case, &id, "boom again", 5).unwrap();
    let err = retry(&mut case, &id, 6).unwrap_err();
    assert!(matches!(err, RunnerError::Conflict(yawl_core::ConflictError::InvalidTransition(_))));
}

#[test]
fn reroute_on_non_skippable_failed_task_is_ignored() {
    let spec = straight_line_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);
    let id = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &id, "alice", 1).unwrap();
    fail(&mut case, &id, "boom", 2).unwrap();

    let outcome = reroute(&mut case, &spec, &id, 3).unwrap();
    assert!(outcome.events.is_empty());
    assert_eq!(case.workitems[&id].status, WorkitemStatus::Failed);
}

#[test]
fn reroute_on_skippable_failed_task_proceeds_like_a_skip() {
    let mut spec = straight_line_spec();
    spec.tasks.get_mut(&TaskId::from("T1")).unwrap().skippable = true;
    let mut case = root_case(&spec);
    run(&mut case, &spec);
    let id = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &id, "alice", 1).unwrap();
    fail(&mut case, &id, "boom", 2).unwrap();

    let outcome = reroute(&mut case, &spec, &id, 3).unwrap();
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));
}

#[test]
fn cancellation_set_withdraws_sibling_branch_work_item() {
    let spec = cancellation_set_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);
    assert!(case.has_live_workitems_for_task(&TaskId::from("Tb2")));

    let tcancel = WorkitemId::new(case.case_id.clone(), TaskId::from("Tcancel"));
    checkout(&mut case, &tcancel, "alice", 1).unwrap();
    let outcome = checkin(&mut case, &spec, &tcancel, CaseDocument::empty(), 2).unwrap();

    assert!(!case.has_live_workitems_for_task(&TaskId::from("Tb2")));
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));
}

#[test]
fn unreachable_and_join_branch_quiesces_into_deadlock() {
    let spec = deadlock_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);

    let t1 = WorkitemId::new(case.case_id.clone(), TaskId::from("T1"));
    checkout(&mut case, &t1, "alice", 1).unwrap();
    let outcome = checkin(&mut case, &spec, &t1, CaseDocument::empty(), 2).unwrap();

    assert_eq!(outcome.terminal, Some(EventKind::CaseFailed));
    assert_eq!(case.status, CaseStatus::Failed);
}

#[test]
fn composite_task_descent_queues_a_pending_child_case() {
    let spec = composite_descent_spec();
    let mut case = root_case(&spec);
    let outcome = run(&mut case, &spec);

    assert_eq!(outcome.pending_composites.len(), 1);
    let pending = &outcome.pending_composites[0];
    assert_eq!(pending.task_id, TaskId::from("Tcomposite"));
    assert_eq!(pending.sub_net, yawl_core::NetId::new("child"));
    assert!(!case.has_live_workitems_for_task(&TaskId::from("Tcomposite")));
}

#[test]
fn completing_a_child_case_fires_the_parents_composite_output_side() {
    let spec = composite_descent_spec();
    let mut parent = root_case(&spec);
    let outcome = run(&mut parent, &spec);
    let pending = outcome.pending_composites.into_iter().next().unwrap();

    let mut child = CaseRuntime::new_child(
        parent.case_id.child(1),
        pending.sub_net.clone(),
        pending.input.clone(),
        parent.case_id.clone(),
        pending.workitem_id.clone(),
    );
    for c in spec.input_conditions(&pending.sub_net) {
        child.marking.add_token(Place::Condition(c.clone()));
    }
    run(&mut child, &spec);
    let leaf = WorkitemId::new(child.case_id.clone(), TaskId::from("Tleaf"));
    checkout(&mut child, &leaf, "alice", 1).unwrap();
    checkin(&mut child, &spec, &leaf, CaseDocument::empty(), 2).unwrap();
    assert_eq!(child.status, CaseStatus::Completed);

    let outcome = complete_child_case(&mut parent, &spec, &pending.task_id, 3).unwrap();
    assert_eq!(outcome.terminal, Some(EventKind::CaseCompleted));
}

#[test]
fn cancelling_a_case_withdraws_every_live_workitem() {
    let spec = and_split_and_join_spec();
    let mut case = root_case(&spec);
    run(&mut case, &spec);
    assert!(case.has_live_workitems_for_task(&TaskId::from("T2")));
    assert!(case.has_live_workitems_for_task(&TaskId::from("T3")));

    let events = cancel_case(&mut case, 9);
    assert_eq!(case.status, CaseStatus::Cancelled);
    assert!(!case.has_live_workitems_for_task(&TaskId::from("T2")));
    assert!(case.marking.is_empty());
    assert_eq!(events.last().unwrap().kind, EventKind::CaseCancelled);
}

#[test]
fn suspend_and_resume_case_round_trip_status() {
    let spec = straight_line_spec();
    let mut case = root_case(&spec);
    let ev = suspend_case(&mut case, 1);
    assert_eq!(case.status, CaseStatus::Suspended);
    assert_eq!(ev.kind, EventKind::CaseSuspended);

    let ev = resume_case(&mut case, 2);
    assert_eq!(case.status, CaseStatus::Active);
    assert_eq!(ev.kind, EventKind::CaseResumed);
}

