// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yawl_core::spec::{ConditionId, NetId};
use yawl_core::test_support::{and_split_and_join_spec, mi_spec, xor_fallthrough_spec};
use yawl_core::CaseDocument;

use super::*;

fn root_case(spec: &yawl_core::SpecificationModel) -> CaseRuntime {
    let mut case = CaseRuntime::new(CaseId::new("1"), spec.root_net.clone(), CaseDocument::empty());
    for c in spec.input_conditions(&spec.root_net) {
        case.marking.add_token(Place::Condition(c.clone()));
    }
    case
}

#[test]
fn fire_input_side_consumes_and_join_places_and_enables_one_workitem() {
    let model = and_split_and_join_spec();
    let net = model.root();
    let mut case = root_case(&model);
    let t1 = model.find_task(&TaskId::from("T1")).unwrap();

    let events = fire_input_side(&mut case, net, t1, &model, 0).unwrap();

    assert!(!case.marking.is_marked(&Place::Condition(ConditionId::new("i"))));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, yawl_core::EventKind::WorkitemEnabled);
    assert!(case.has_live_workitems_for_task(&TaskId::from("T1")));
}

#[test]
fn fire_output_side_and_split_marks_every_branch() {
    let model = and_split_and_join_spec();
    let net = model.root();
    let mut case = root_case(&model);
    let t1 = model.find_task(&TaskId::from("T1")).unwrap();

    fire_input_side(&mut case, net, t1, &model, 0).unwrap();
    fire_output_side(&mut case, net, t1, 0).unwrap();

    assert!(case.marking.is_marked(&Place::Task(TaskId::from("T2"))));
    assert!(case.marking.is_marked(&Place::Task(TaskId::from("T3"))));
}

#[test]
fn fire_output_side_xor_split_falls_through_to_default_branch() {
    let model = xor_fallthrough_spec();
    let net = model.root();
    let mut case = root_case(&model);
    let t1 = model.find_task(&TaskId::from("T1")).unwrap();

    // No "x" variable set, so neither T2's nor T3's predicate is satisfiable.
    fire_input_side(&mut case, net, t1, &model, 0).unwrap();
    fire_output_side(&mut case, net, t1, 0).unwrap();

    assert!(case.marking.is_marked(&Place::Task(TaskId::from("T4"))));
    assert!(!case.marking.is_marked(&Place::Task(TaskId::from("T2"))));
    assert!(!case.marking.is_marked(&Place::Task(TaskId::from("T3"))));
}

#[test]
fn fire_output_side_xor_split_honors_matching_predicate() {
    let model = xor_fallthrough_spec();
    let net = model.root();
    let mut case = root_case(&model);
    case.data.set_variable("x", "2");
    let t1 = model.find_task(&TaskId::from("T1")).unwrap();

    fire_input_side(&mut case, net, t1, &model, 0).unwrap();
    fire_output_side(&mut case, net, t1, 0).unwrap();

    assert!(case.marking.is_marked(&Place::Task(TaskId::from("T3"))));
    assert!(!case.marking.is_marked(&Place::Task(TaskId::from("T4"))));
}

#[test]
fn fire_input_side_static_mi_creates_count_expr_instances() {
    let model = mi_spec(1, 4, 2, "3");
    let net = model.root();
    let mut case = root_case(&model);
    let t = model.find_task(&TaskId::from("T")).unwrap();

    let events = fire_input_side(&mut case, net, t, &model, 0).unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(case.workitems_for_task(&TaskId::from("T")).len(), 3);
    assert_eq!(case.mi_groups[&TaskId::from("T")].instances.len(), 3);
}

#[test]
fn fire_input_side_static_mi_below_min_is_bounds_violation() {
    let model = mi_spec(2, 4, 2, "1");
    let net = model.root();
    let mut case = root_case(&model);
    let t = model.find_task(&TaskId::from("T")).unwrap();

    let err = fire_input_side(&mut case, net, t, &model, 0).unwrap_err();
    assert!(matches!(err, NetSemanticError::MiBoundsViolated { created: 1, min: 2, .. }));
}

#[test]
fn terminal_outcome_is_none_while_workitems_are_still_live() {
    let model = and_split_and_join_spec();
    let net = model.root();
    let mut case = root_case(&model);
    let t1 = model.find_task(&TaskId::from("T1")).unwrap();
    fire_input_side(&mut case, net, t1, &model, 0).unwrap();

    assert_eq!(terminal_outcome(&case, net), None);
}

#[test]
fn terminal_outcome_detects_completion_once_output_condition_is_marked() {
    let model = and_split_and_join_spec();
    let net = model.root();
    let mut case = root_case(&model);
    case.marking.add_token(Place::Condition(ConditionId::new("o")));

    let (kind, _) = terminal_outcome(&case, net).unwrap();
    assert_eq!(kind, yawl_core::EventKind::CaseCompleted);
}

#[test]
fn terminal_outcome_detects_deadlock_when_nothing_live_and_no_output_marked() {
    let model = and_split_and_join_spec();
    let net = model.root();
    let mut case = root_case(&model);
    // Tokens stuck on an intermediate place with no live workitem and no
    // output condition marked.
    case.marking.add_token(Place::Task(TaskId::from("T2")));

    let (kind, payload) = terminal_outcome(&case, net).unwrap();
    assert_eq!(kind, yawl_core::EventKind::CaseFailed);
    assert_eq!(payload["reason"], "deadlock");
}

#[test]
fn is_composite_reports_subnet_decompositions_only() {
    assert!(is_composite(&yawl_core::Decomposition::SubNet { net_id: NetId::new("child") }));
    assert!(!is_composite(&yawl_core::Decomposition::Atomic { binding: "p".into() }));
}
