// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task enablement (§4.5.1): deciding, from a net's join types and a case's
//! current marking, which tasks are ready to fire.

use yawl_core::spec::{JoinType, Net, Place, TaskId};

use crate::marking::Marking;

/// Whether `task` is enabled under `marking`, given its join type.
pub fn is_enabled(net: &Net, task: &TaskId, join: JoinType, marking: &Marking) -> bool {
    let incoming = net.incoming_places(task);
    if incoming.is_empty() {
        // A task with no incoming flows only occurs for a net's very first
        // task, fed directly by the input condition; absent any incoming
        // flow record at all this is a modeling error the loader's
        // validation pass already rejects, so treat it as never enabled
        // here rather than firing on every quiescence pass.
        return false;
    }
    match join {
        JoinType::And => and_enabled(&incoming, marking),
        JoinType::Xor => xor_enabled(&incoming, marking),
        JoinType::Or => or_enabled(net, task, &incoming, marking),
    }
}

/// AND-join: every incoming place must hold a token.
fn and_enabled(incoming: &[Place], marking: &Marking) -> bool {
    incoming.iter().all(|p| marking.is_marked(p))
}

/// XOR-join: exactly the arrival of a token at any one incoming place
/// enables the task; XOR-joined tasks structurally never need more than
/// one marked incoming place to proceed.
fn xor_enabled(incoming: &[Place], marking: &Marking) -> bool {
    incoming.iter().any(|p| marking.is_marked(p))
}

/// OR-join: at least one incoming place is marked, and none of the places
/// that could *still* deliver a token to another unmarked incoming place is
/// marked (§4.5.1, §9) — determined via the precomputed trigger places
/// rather than a live reachability search.
fn or_enabled(net: &Net, task: &TaskId, incoming: &[Place], marking: &Marking) -> bool {
    if !incoming.iter().any(|p| marking.is_marked(p)) {
        return false;
    }
    let Some(triggers) = net.or_join_trigger_places.get(task) else {
        return incoming.iter().all(|p| marking.is_marked(p));
    };
    for place in incoming {
        if marking.is_marked(place) {
            continue;
        }
        if let Some(upstream) = triggers.get(place) {
            if upstream.iter().any(|p| marking.is_marked(p)) {
                return false;
            }
        }
    }
    true
}

/// Every task in `net` currently enabled and not already mid-firing
/// (`exclude` reports tasks the caller considers busy — e.g. those with a
/// live work item or an unfired multi-instance group), in a deterministic
/// order used as the basis for round-robin fairness (§4.5.8).
pub fn enabled_tasks(
    net: &Net,
    joins: &dyn Fn(&TaskId) -> JoinType,
    marking: &Marking,
    exclude: impl Fn(&TaskId) -> bool,
) -> Vec<TaskId> {
    let mut tasks: Vec<TaskId> = net
        .tasks
        .iter()
        .filter(|t| !exclude(t))
        .filter(|t| is_enabled(net, t, joins(t), marking))
        .cloned()
        .collect();
    tasks.sort();
    tasks
}

#[cfg(test)]
#[path = "enablement_tests.rs"]
mod tests;
