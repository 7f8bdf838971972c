// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::*;
use crate::spec::model::{
    Condition, Decomposition, Flow, JoinType, Net, Place, SpecificationModel, SplitType, Task,
};
use crate::spec::{ConditionId, DecompositionId, NetId, SpecId, TaskId};

fn straight_line_spec() -> SpecificationModel {
    let net_id = NetId::new("root");
    let task_id = TaskId::from("T1");
    let decomp_id = DecompositionId::new("T1-binding");
    let i = ConditionId::new("i");
    let o = ConditionId::new("o");

    let net = Net {
        id: net_id.clone(),
        input_conditions: vec![i.clone()],
        output_conditions: vec![o.clone()],
        conditions: vec![Condition { id: i.clone() }, Condition { id: o.clone() }],
        tasks: vec![task_id.clone()],
        flows: vec![
            Flow { source: Place::Condition(i), target: Place::Task(task_id.clone()), predicate: None, order: 0 },
            Flow { source: Place::Task(task_id.clone()), target: Place::Condition(o), predicate: None, order: 0 },
        ],
        or_join_trigger_places: HashMap::new(),
    };

    let task = Task {
        id: task_id.clone(),
        join: JoinType::And,
        split: SplitType::And,
        mi: None,
        cancellation_set: vec![],
        remove_set: vec![],
        input_queries: vec![],
        output_queries: vec![],
        decomposition: decomp_id.clone(),
        skippable: false,
        sla_ms: None,
        retry_limit: 0,
    };

    let mut nets = HashMap::new();
    nets.insert(net_id.clone(), net);
    let mut tasks = HashMap::new();
    tasks.insert(task_id, task);
    let mut decompositions = HashMap::new();
    decompositions.insert(decomp_id, Decomposition::Atomic { binding: "participant".into() });

    SpecificationModel {
        spec_id: SpecId::new("straight-line", "1.0", "urn:test:straight-line"),
        root_net: net_id,
        nets,
        decompositions,
        tasks,
    }
}

#[test]
fn json_loader_admits_valid_specification() {
    let model = straight_line_spec();
    let bytes = serde_json::to_vec(&model).unwrap();
    let loaded = JsonSpecLoader.load(&bytes).unwrap();
    assert_eq!(loaded.spec_id, model.spec_id);
}

#[test]
fn json_loader_rejects_malformed_bytes() {
    let err = JsonSpecLoader.load(b"not json").unwrap_err();
    assert!(matches!(err, SpecDocumentError::Malformed(_)));
}

#[test]
fn json_loader_rejects_fatal_diagnostics() {
    let mut model = straight_line_spec();
    // Break the invariant: give the root net a dangling flow.
    model.nets.get_mut(&model.root_net.clone()).unwrap().flows.push(Flow {
        source: Place::Condition(ConditionId::new("ghost")),
        target: Place::Condition(ConditionId::new("o")),
        predicate: None,
        order: 1,
    });
    let bytes = serde_json::to_vec(&model).unwrap();
    let err = JsonSpecLoader.load(&bytes).unwrap_err();
    assert!(matches!(err, SpecDocumentError::Invalid(_)));
}
