use super::*;
use crate::spec::model::Flow;
use std::collections::HashMap;

fn place_task(id: &str) -> Place {
    Place::Task(TaskId::new(id))
}

fn net_with_flows(tasks: Vec<&str>, flows: Vec<(&str, &str)>) -> Net {
    Net {
        id: NetId::new("n"),
        input_conditions: vec![],
        output_conditions: vec![],
        conditions: vec![],
        tasks: tasks.into_iter().map(TaskId::new).collect(),
        flows: flows
            .into_iter()
            .enumerate()
            .map(|(i, (s, t))| Flow {
                source: place_task(s),
                target: place_task(t),
                predicate: None,
                order: i as u32,
            })
            .collect(),
        or_join_trigger_places: HashMap::new(),
    }
}

#[test]
fn predecessor_closure_stops_at_boundary_task() {
    // A -> J, B -> J, C -> B (J is the OR-join under test)
    let net = net_with_flows(vec!["A", "B", "C", "J"], vec![("A", "J"), ("B", "J"), ("C", "B")]);
    let closure = predecessor_closure(&net, &place_task("B"), &TaskId::new("J"));
    assert!(closure.contains(&place_task("C")));
    assert!(!closure.contains(&place_task("J")));
}

#[test]
fn predecessor_closure_terminates_on_cycle() {
    // A -> B -> A (cycle), A -> J
    let net = net_with_flows(vec!["A", "B", "J"], vec![("A", "B"), ("B", "A"), ("A", "J")]);
    let closure = predecessor_closure(&net, &place_task("A"), &TaskId::new("J"));
    // Should terminate (not hang) and contain B via the cycle.
    assert!(closure.contains(&place_task("B")));
}

#[test]
fn compute_trigger_places_only_covers_or_join_tasks() {
    let net = net_with_flows(vec!["A", "J"], vec![("A", "J")]);
    let mut joins = HashMap::new();
    joins.insert(TaskId::new("J"), JoinType::And);
    let triggers = compute_trigger_places(&net, &joins);
    assert!(triggers.is_empty());

    joins.insert(TaskId::new("J"), JoinType::Or);
    let triggers = compute_trigger_places(&net, &joins);
    assert!(triggers.contains_key(&TaskId::new("J")));
}
