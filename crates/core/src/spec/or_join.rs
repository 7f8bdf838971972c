// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Precompute OR-join "trigger places" at spec-load time (§4.5.1, §9).
//!
//! The non-local OR-join enablement predicate asks, for every unmarked
//! incoming place of a task, whether a token could still arrive there
//! without first consuming an already-marked incoming place of the same
//! task. Walking the dynamic marking at runtime to answer that is the
//! classic unbounded YAWL OR-join problem. Instead we precompute, once per
//! net, the *structural* predecessor closure of each incoming place that
//! does not route back through the OR-join task itself. At runtime this
//! turns the question into a marking-local lookup: a place is still
//! "awaited" iff some place in its precomputed closure currently holds a
//! token (see `yawl_runtime::runner::or_join_enabled`).

use std::collections::{HashMap, HashSet, VecDeque};

use super::model::{JoinType, Net, Place};
use super::TaskId;

/// For every OR-join task in `net` (join types looked up in `joins`), compute
/// the map from each of its incoming places to the set of places whose
/// marking could still deliver a token to it, excluding paths that loop back
/// through the task itself.
pub fn compute_trigger_places(
    net: &Net,
    joins: &HashMap<TaskId, JoinType>,
) -> HashMap<TaskId, HashMap<Place, Vec<Place>>> {
    let mut result = HashMap::new();

    for task_id in &net.tasks {
        if joins.get(task_id) != Some(&JoinType::Or) {
            continue;
        }
        let incoming = net.incoming_places(task_id);
        let mut per_place = HashMap::new();
        for place in &incoming {
            let closure = predecessor_closure(net, place, task_id);
            per_place.insert(place.clone(), closure);
        }
        result.insert(task_id.clone(), per_place);
    }

    result
}

/// Breadth-first walk of the reverse flow graph starting at `start`,
/// stopping at (not through) `boundary_task` and never revisiting a node,
/// which bounds the search on cyclic nets to at most `|places| + |tasks|`
/// steps as required by §4.5.1.
fn predecessor_closure(net: &Net, start: &Place, boundary_task: &TaskId) -> Vec<Place> {
    let mut seen: HashSet<Place> = HashSet::new();
    let mut queue: VecDeque<Place> = VecDeque::new();
    seen.insert(start.clone());
    queue.push_back(start.clone());
    let mut closure = Vec::new();

    while let Some(place) = queue.pop_front() {
        for flow in &net.flows {
            if flow.target != place {
                continue;
            }
            let upstream = &flow.source;
            if let Place::Task(t) = upstream {
                if t == boundary_task {
                    // Don't walk back through the OR-join task itself.
                    continue;
                }
            }
            if seen.insert(upstream.clone()) {
                closure.push(upstream.clone());
                queue.push_back(upstream.clone());
            }
        }
    }

    closure
}

#[cfg(test)]
#[path = "or_join_tests.rs"]
mod tests;
