// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::HashMap;

use crate::spec::model::{
    Condition, Decomposition, Flow, JoinType, MiBounds, Net, Place, SpecificationModel, SplitType,
    Task,
};
use crate::spec::{ConditionId, CreationMode, DecompositionId, NetId, SpecId, TaskId};

/// Scenario 1 from §8: `i -> T1 (AND/AND, no MI) -> o`.
pub fn straight_line_spec() -> SpecificationModel {
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
            Flow {
                source: Place::Condition(i),
                target: Place::Task(task_id.clone()),
                predicate: None,
                order: 0,
            },
            Flow {
                source: Place::Task(task_id.clone()),
                target: Place::Condition(o),
                predicate: None,
                order: 0,
            },
        ],
        or_join_trigger_places: HashMap::new(),
    };

    let task = atomic_task(task_id.clone(), JoinType::And, SplitType::And, decomp_id.clone());

    let mut model = assemble(net_id, vec![net], vec![(task_id, task)], vec![(decomp_id, Decomposition::Atomic { binding: "participant".into() })]);
    model.compute_or_join_triggers();
    model
}

/// Scenario 2 from §8: `i -> T1 (AND-split) -> {T2, T3} -> T4 (AND-join) -> o`.
pub fn and_split_and_join_spec() -> SpecificationModel {
    let net_id = NetId::new("root");
    let (t1, t2, t3, t4) = (TaskId::from("T1"), TaskId::from("T2"), TaskId::from("T3"), TaskId::from("T4"));
    let (i, o) = (ConditionId::new("i"), ConditionId::new("o"));

    let flows = vec![
        Flow { source: Place::Condition(i.clone()), target: Place::Task(t1.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t1.clone()), target: Place::Task(t2.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t1.clone()), target: Place::Task(t3.clone()), predicate: None, order: 1 },
        Flow { source: Place::Task(t2.clone()), target: Place::Task(t4.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t3.clone()), target: Place::Task(t4.clone()), predicate: None, order: 1 },
        Flow { source: Place::Task(t4.clone()), target: Place::Condition(o.clone()), predicate: None, order: 0 },
    ];

    let net = Net {
        id: net_id.clone(),
        input_conditions: vec![i.clone()],
        output_conditions: vec![o.clone()],
        conditions: vec![Condition { id: i }, Condition { id: o }],
        tasks: vec![t1.clone(), t2.clone(), t3.clone(), t4.clone()],
        flows,
        or_join_trigger_places: HashMap::new(),
    };

    let d1 = DecompositionId::new("d1");
    let d2 = DecompositionId::new("d2");
    let d3 = DecompositionId::new("d3");
    let d4 = DecompositionId::new("d4");

    let tasks = vec![
        (t1.clone(), atomic_task(t1, JoinType::And, SplitType::And, d1.clone())),
        (t2.clone(), atomic_task(t2, JoinType::And, SplitType::And, d2.clone())),
        (t3.clone(), atomic_task(t3, JoinType::And, SplitType::And, d3.clone())),
        (t4.clone(), atomic_task(t4, JoinType::And, SplitType::And, d4.clone())),
    ];
    let decomps = vec![
        (d1, Decomposition::Atomic { binding: "p1".into() }),
        (d2, Decomposition::Atomic { binding: "p2".into() }),
        (d3, Decomposition::Atomic { binding: "p3".into() }),
        (d4, Decomposition::Atomic { binding: "p4".into() }),
    ];

    let mut model = assemble(net_id, vec![net], tasks, decomps);
    model.compute_or_join_triggers();
    model
}

/// A multi-instance task spec: `i -> T(min=2,max=4,threshold=2) -> o`.
pub fn mi_spec(min: u32, max: u32, threshold: u32, count_expr: &str) -> SpecificationModel {
    let net_id = NetId::new("root");
    let task_id = TaskId::from("T");
    let decomp_id = DecompositionId::new("T-binding");
    let (i, o) = (ConditionId::new("i"), ConditionId::new("o"));

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

    let mut task = atomic_task(task_id.clone(), JoinType::And, SplitType::And, decomp_id.clone());
    task.mi = Some(MiBounds {
        min,
        max,
        threshold,
        creation: CreationMode::Static,
        count_expr: Some(count_expr.to_string()),
    });

    let mut model = assemble(
        net_id,
        vec![net],
        vec![(task_id, task)],
        vec![(decomp_id, Decomposition::Atomic { binding: "participant".into() })],
    );
    model.compute_or_join_triggers();
    model
}

/// Scenario 3 from §8: `i -> T1 -> {T2 if x=1, T3 if x=2, T4 default} -> o`.
/// `T1`'s XOR-split evaluates branch predicates against the case's `x`
/// variable in ordering-index order, falling through to `T4` (the
/// highest-ordered branch) when none match.
pub fn xor_fallthrough_spec() -> SpecificationModel {
    let net_id = NetId::new("root");
    let (t1, t2, t3, t4) = (TaskId::from("T1"), TaskId::from("T2"), TaskId::from("T3"), TaskId::from("T4"));
    let (i, o) = (ConditionId::new("i"), ConditionId::new("o"));

    let flows = vec![
        Flow { source: Place::Condition(i.clone()), target: Place::Task(t1.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t1.clone()), target: Place::Task(t2.clone()), predicate: Some("x = 1".into()), order: 0 },
        Flow { source: Place::Task(t1.clone()), target: Place::Task(t3.clone()), predicate: Some("x = 2".into()), order: 1 },
        Flow { source: Place::Task(t1.clone()), target: Place::Task(t4.clone()), predicate: None, order: 2 },
        Flow { source: Place::Task(t2.clone()), target: Place::Condition(o.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t3.clone()), target: Place::Condition(o.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t4.clone()), target: Place::Condition(o.clone()), predicate: None, order: 0 },
    ];

    let net = Net {
        id: net_id.clone(),
        input_conditions: vec![i.clone()],
        output_conditions: vec![o.clone()],
        conditions: vec![Condition { id: i }, Condition { id: o }],
        tasks: vec![t1.clone(), t2.clone(), t3.clone(), t4.clone()],
        flows,
        or_join_trigger_places: HashMap::new(),
    };

    let (d1, d2, d3, d4) =
        (DecompositionId::new("d1"), DecompositionId::new("d2"), DecompositionId::new("d3"), DecompositionId::new("d4"));
    let tasks = vec![
        (t1.clone(), atomic_task(t1, JoinType::And, SplitType::Xor, d1.clone())),
        (t2.clone(), atomic_task(t2, JoinType::And, SplitType::And, d2.clone())),
        (t3.clone(), atomic_task(t3, JoinType::And, SplitType::And, d3.clone())),
        (t4.clone(), atomic_task(t4, JoinType::And, SplitType::And, d4.clone())),
    ];
    let decomps = vec![
        (d1, Decomposition::Atomic { binding: "p1".into() }),
        (d2, Decomposition::Atomic { binding: "p2".into() }),
        (d3, Decomposition::Atomic { binding: "p3".into() }),
        (d4, Decomposition::Atomic { binding: "p4".into() }),
    ];

    let mut model = assemble(net_id, vec![net], tasks, decomps);
    model.compute_or_join_triggers();
    model
}

/// Scenario 5 from §8: parallel branches `B1`/`B2`; `Tcancel` at the top of
/// `B1` lists `B2`'s task in its cancellation set, so firing it withdraws
/// `B2`'s live work item and clears its token. `B2` drains to its own
/// output condition so the case still completes through `B1` alone.
pub fn cancellation_set_spec() -> SpecificationModel {
    let net_id = NetId::new("root");
    let (t0, tcancel, tb2) = (TaskId::from("T0"), TaskId::from("Tcancel"), TaskId::from("Tb2"));
    let (i, o, o2) = (ConditionId::new("i"), ConditionId::new("o"), ConditionId::new("o2"));

    let flows = vec![
        Flow { source: Place::Condition(i.clone()), target: Place::Task(t0.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t0.clone()), target: Place::Task(tcancel.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t0.clone()), target: Place::Task(tb2.clone()), predicate: None, order: 1 },
        Flow { source: Place::Task(tcancel.clone()), target: Place::Condition(o.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(tb2.clone()), target: Place::Condition(o2.clone()), predicate: None, order: 0 },
    ];

    let net = Net {
        id: net_id.clone(),
        input_conditions: vec![i.clone()],
        output_conditions: vec![o.clone(), o2.clone()],
        conditions: vec![Condition { id: i }, Condition { id: o }, Condition { id: o2 }],
        tasks: vec![t0.clone(), tcancel.clone(), tb2.clone()],
        flows,
        or_join_trigger_places: HashMap::new(),
    };

    let (d0, dc, d2) = (DecompositionId::new("d0"), DecompositionId::new("dc"), DecompositionId::new("d2"));
    let mut cancel_task = atomic_task(tcancel.clone(), JoinType::And, SplitType::And, dc.clone());
    cancel_task.cancellation_set = vec![Place::Task(tb2.clone())];

    let tasks = vec![
        (t0.clone(), atomic_task(t0, JoinType::And, SplitType::And, d0.clone())),
        (tcancel, cancel_task),
        (tb2.clone(), atomic_task(tb2, JoinType::And, SplitType::And, d2.clone())),
    ];
    let decomps = vec![
        (d0, Decomposition::Atomic { binding: "p0".into() }),
        (dc, Decomposition::Atomic { binding: "pc".into() }),
        (d2, Decomposition::Atomic { binding: "p2".into() }),
    ];

    let mut model = assemble(net_id, vec![net], tasks, decomps);
    model.compute_or_join_triggers();
    model
}

/// Scenario 6 from §8: `i -> T1 -> Tjoin(AND-join on two places, one fed by
/// T1, one never fed) -> o`. `Tjoin` is never AND-enabled once `T1`
/// completes, so the case quiesces deadlocked.
pub fn deadlock_spec() -> SpecificationModel {
    let net_id = NetId::new("root");
    let (t1, tjoin) = (TaskId::from("T1"), TaskId::from("Tjoin"));
    let (i, o, unreachable) = (ConditionId::new("i"), ConditionId::new("o"), ConditionId::new("unreachable"));

    let flows = vec![
        Flow { source: Place::Condition(i.clone()), target: Place::Task(t1.clone()), predicate: None, order: 0 },
        Flow { source: Place::Task(t1.clone()), target: Place::Task(tjoin.clone()), predicate: None, order: 0 },
        Flow { source: Place::Condition(unreachable.clone()), target: Place::Task(tjoin.clone()), predicate: None, order: 1 },
        Flow { source: Place::Task(tjoin.clone()), target: Place::Condition(o.clone()), predicate: None, order: 0 },
    ];

    let net = Net {
        id: net_id.clone(),
        input_conditions: vec![i.clone()],
        output_conditions: vec![o.clone()],
        conditions: vec![Condition { id: i }, Condition { id: o }, Condition { id: unreachable }],
        tasks: vec![t1.clone(), tjoin.clone()],
        flows,
        or_join_trigger_places: HashMap::new(),
    };

    let (d1, dj) = (DecompositionId::new("d1"), DecompositionId::new("dj"));
    let tasks = vec![
        (t1.clone(), atomic_task(t1, JoinType::And, SplitType::And, d1.clone())),
        (tjoin.clone(), atomic_task(tjoin, JoinType::And, SplitType::And, dj.clone())),
    ];
    let decomps = vec![
        (d1, Decomposition::Atomic { binding: "p1".into() }),
        (dj, Decomposition::Atomic { binding: "pj".into() }),
    ];

    let mut model = assemble(net_id, vec![net], tasks, decomps);
    model.compute_or_join_triggers();
    model
}

/// A composite-task descent spec (§4.5.4): `i -> Tcomposite -> o` in the
/// root net, where `Tcomposite` decomposes to sub-net `child` (`ci -> Tleaf
/// -> co`). Firing `Tcomposite` pushes a child case frame instead of
/// creating an ordinary work item.
pub fn composite_descent_spec() -> SpecificationModel {
    let root_id = NetId::new("root");
    let child_id = NetId::new("child");
    let (tcomp, tleaf) = (TaskId::from("Tcomposite"), TaskId::from("Tleaf"));
    let (i, o) = (ConditionId::new("i"), ConditionId::new("o"));
    let (ci, co) = (ConditionId::new("ci"), ConditionId::new("co"));

    let root_net = Net {
        id: root_id.clone(),
        input_conditions: vec![i.clone()],
        output_conditions: vec![o.clone()],
        conditions: vec![Condition { id: i.clone() }, Condition { id: o.clone() }],
        tasks: vec![tcomp.clone()],
        flows: vec![
            Flow { source: Place::Condition(i), target: Place::Task(tcomp.clone()), predicate: None, order: 0 },
            Flow { source: Place::Task(tcomp.clone()), target: Place::Condition(o), predicate: None, order: 0 },
        ],
        or_join_trigger_places: HashMap::new(),
    };

    let child_net = Net {
        id: child_id.clone(),
        input_conditions: vec![ci.clone()],
        output_conditions: vec![co.clone()],
        conditions: vec![Condition { id: ci.clone() }, Condition { id: co.clone() }],
        tasks: vec![tleaf.clone()],
        flows: vec![
            Flow { source: Place::Condition(ci), target: Place::Task(tleaf.clone()), predicate: None, order: 0 },
            Flow { source: Place::Task(tleaf.clone()), target: Place::Condition(co), predicate: None, order: 0 },
        ],
        or_join_trigger_places: HashMap::new(),
    };

    let (dcomp, dleaf) = (DecompositionId::new("d-composite"), DecompositionId::new("d-leaf"));
    let mut comp_task = atomic_task(tcomp.clone(), JoinType::And, SplitType::And, dcomp.clone());
    comp_task.decomposition = dcomp.clone();
    let leaf_task = atomic_task(tleaf.clone(), JoinType::And, SplitType::And, dleaf.clone());

    let mut model = assemble(
        root_id,
        vec![root_net, child_net],
        vec![(tcomp, comp_task), (tleaf, leaf_task)],
        vec![(dcomp, Decomposition::SubNet { net_id: child_id }), (dleaf, Decomposition::Atomic { binding: "leaf".into() })],
    );
    model.compute_or_join_triggers();
    model
}

fn atomic_task(
    id: TaskId,
    join: JoinType,
    split: SplitType,
    decomposition: DecompositionId,
) -> Task {
    Task {
        id,
        join,
        split,
        mi: None,
        cancellation_set: vec![],
        remove_set: vec![],
        input_queries: vec![],
        output_queries: vec![],
        decomposition,
        skippable: false,
        sla_ms: None,
        retry_limit: 0,
    }
}

fn assemble(
    root_net: NetId,
    nets: Vec<Net>,
    tasks: Vec<(TaskId, Task)>,
    decompositions: Vec<(DecompositionId, Decomposition)>,
) -> SpecificationModel {
    SpecificationModel {
        spec_id: SpecId::new("test-spec", "1.0", "urn:test:spec"),
        root_net,
        nets: nets.into_iter().map(|n| (n.id.clone(), n)).collect(),
        decompositions: decompositions.into_iter().collect(),
        tasks: tasks.into_iter().collect(),
    }
}
