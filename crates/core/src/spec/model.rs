// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The specification model's data types: nets, tasks, conditions, flows,
//! decompositions, and multi-instance bounds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ConditionId, DecompositionId, NetId, SpecId, TaskId};

/// How a task's incoming edges combine to decide enablement (§4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    And,
    Or,
    Xor,
}

/// How a task's outgoing edges combine after it completes (§4.5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitType {
    And,
    Or,
    Xor,
}

/// Multi-instance creation mode: whether the instance count is known at
/// fire time (`Static`) or may grow during execution (`Dynamic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationMode {
    Static,
    Dynamic,
}

/// Multi-instance bounds for a task (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiBounds {
    pub min: u32,
    pub max: u32,
    pub threshold: u32,
    pub creation: CreationMode,
    /// XPath expression evaluated against case data to determine the
    /// instance count for `Static` creation. Ignored for `Dynamic`.
    pub count_expr: Option<String>,
}

impl MiBounds {
    /// Structural well-formedness: `min <= threshold <= max`, `min >= 1`.
    pub fn is_well_formed(&self) -> bool {
        self.min >= 1 && self.min <= self.threshold && self.threshold <= self.max
    }
}

/// A node that can hold tokens: an explicit condition, or the implicit
/// place immediately downstream of a task when no condition mediates the
/// flow (§3: "marking... over conditions and implicit places between
/// tasks").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Place {
    Condition(ConditionId),
    Task(TaskId),
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Place::Condition(c) => write!(f, "cond:{c}"),
            Place::Task(t) => write!(f, "task-out:{t}"),
        }
    }
}

/// Error parsing a [`Place`] back from its [`Display`] form, used by case
/// recovery (§4.7) to reconstruct a marking from the last `NET_MARKING_CHANGED`
/// snapshot recorded for a case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed place string {0:?}")]
pub struct ParsePlaceError(pub String);

impl std::str::FromStr for Place {
    type Err = ParsePlaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("cond:") {
            Ok(Place::Condition(ConditionId::new(rest)))
        } else if let Some(rest) = s.strip_prefix("task-out:") {
            Ok(Place::Task(TaskId::new(rest)))
        } else {
            Err(ParsePlaceError(s.to_string()))
        }
    }
}

/// An XPath query mapping net data to/from a task's own data document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuery {
    /// XPath selecting the source value in the source document.
    pub select: String,
    /// Destination variable name in the target document.
    pub target: String,
}

/// A task's binding: either an atomic participant contract, or a reference
/// to a sub-net that is descended into when the task fires (§4.5.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decomposition {
    Atomic { binding: String },
    SubNet { net_id: NetId },
}

/// A task: join/split semantics, optional MI bounds, cancellation/remove
/// sets, data bindings, and a decomposition reference (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub join: JoinType,
    pub split: SplitType,
    pub mi: Option<MiBounds>,
    /// Places/tasks whose live tokens and work items are withdrawn when
    /// this task fires.
    pub cancellation_set: Vec<Place>,
    /// Places whose tokens are removed (without withdrawing work items)
    /// when this task fires.
    pub remove_set: Vec<Place>,
    pub input_queries: Vec<DataQuery>,
    pub output_queries: Vec<DataQuery>,
    pub decomposition: DecompositionId,
    pub skippable: bool,
    pub sla_ms: Option<u64>,
    pub retry_limit: u32,
}

/// An explicit condition (place) in a net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
}

/// A flow (edge) between two places, with an optional XPath predicate and
/// an ordering index used for XOR fallthrough and OR-join tie-breaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub source: Place,
    pub target: Place,
    pub predicate: Option<String>,
    pub order: u32,
}

/// A net: conditions, tasks, and the flows between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: NetId,
    pub input_conditions: Vec<ConditionId>,
    pub output_conditions: Vec<ConditionId>,
    pub conditions: Vec<Condition>,
    pub tasks: Vec<TaskId>,
    pub flows: Vec<Flow>,
    /// Precomputed at load time by [`super::or_join::compute_trigger_places`].
    /// Maps an OR-join task to, for each of its incoming places, the set of
    /// upstream places whose marking could still deliver a token to it.
    #[serde(default)]
    pub or_join_trigger_places: HashMap<TaskId, HashMap<Place, Vec<Place>>>,
}

impl Net {
    pub fn find_task(&self, id: &TaskId) -> Option<&TaskId> {
        self.tasks.iter().find(|t| *t == id)
    }

    pub fn incoming_flows<'a>(&'a self, task: &'a TaskId) -> impl Iterator<Item = &'a Flow> {
        self.flows.iter().filter(move |f| f.target == Place::Task(task.clone()))
    }

    pub fn outgoing_flows<'a>(&'a self, task: &'a TaskId) -> impl Iterator<Item = &'a Flow> {
        self.flows.iter().filter(move |f| f.source == Place::Task(task.clone()))
    }

    /// Incoming places of a task: the set of distinct places that feed it,
    /// used as the unit of enablement per §4.5.1.
    pub fn incoming_places(&self, task: &TaskId) -> Vec<Place> {
        let mut places: Vec<Place> = self.incoming_flows(task).map(|f| f.source.clone()).collect();
        places.sort();
        places.dedup();
        places
    }

    /// Outgoing places of a task in ordering-index order.
    pub fn outgoing_branches(&self, task: &TaskId) -> Vec<&Flow> {
        let mut flows: Vec<&Flow> = self.outgoing_flows(task).collect();
        flows.sort_by_key(|f| f.order);
        flows
    }
}

/// A fully loaded, validated, immutable specification: one root net plus
/// zero or more sub-nets, and the decomposition table they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationModel {
    pub spec_id: SpecId,
    pub root_net: NetId,
    pub nets: HashMap<NetId, Net>,
    pub decompositions: HashMap<DecompositionId, Decomposition>,
    pub tasks: HashMap<TaskId, Task>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

impl SpecificationModel {
    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn net(&self, id: &NetId) -> Option<&Net> {
        self.nets.get(id)
    }

    #[allow(clippy::expect_used)]
    pub fn root(&self) -> &Net {
        // Invariant: validate() rejects a model whose root_net is absent.
        self.nets.get(&self.root_net).expect("root net must exist after validation")
    }

    pub fn decomposition(&self, task: &TaskId) -> Option<&Decomposition> {
        let task = self.tasks.get(task)?;
        self.decompositions.get(&task.decomposition)
    }

    pub fn sub_net(&self, decomposition_id: &DecompositionId) -> Option<&Net> {
        match self.decompositions.get(decomposition_id)? {
            Decomposition::SubNet { net_id } => self.nets.get(net_id),
            Decomposition::Atomic { .. } => None,
        }
    }

    /// The net that owns a given task (a task id is unique across the
    /// specification, so this is a simple reverse lookup).
    pub fn net_owning_task(&self, task: &TaskId) -> Option<&Net> {
        self.nets.values().find(|n| n.tasks.contains(task))
    }

    pub fn input_conditions(&self, net: &NetId) -> &[ConditionId] {
        self.nets.get(net).map(|n| n.input_conditions.as_slice()).unwrap_or_default()
    }

    pub fn output_conditions(&self, net: &NetId) -> &[ConditionId] {
        self.nets.get(net).map(|n| n.output_conditions.as_slice()).unwrap_or_default()
    }

    /// Precompute OR-join trigger places for every net (§4.5.1, §9). Must be
    /// called once after the model is fully assembled, before it is handed
    /// to the net runner; `JsonSpecLoader` calls this before `validate()`.
    pub fn compute_or_join_triggers(&mut self) {
        let joins: HashMap<TaskId, JoinType> =
            self.tasks.iter().map(|(id, t)| (id.clone(), t.join)).collect();
        let net_ids: Vec<NetId> = self.nets.keys().cloned().collect();
        for net_id in net_ids {
            let triggers = {
                let net = &self.nets[&net_id];
                super::or_join::compute_trigger_places(net, &joins)
            };
            if let Some(net) = self.nets.get_mut(&net_id) {
                net.or_join_trigger_places = triggers;
            }
        }
    }
}
