// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single case's live state (§3): marking, work items, case data, status,
//! and multi-instance bookkeeping. One [`CaseRuntime`] is owned exclusively
//! by its case (§4.5.7); the registry is the only thing that may hand out a
//! mutable reference, always under the case's lock.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use yawl_core::spec::{NetId, Place, TaskId};
use yawl_core::{CaseDocument, CaseId, WorkitemId};

use crate::marking::Marking;
use crate::workitem::WorkItem;

/// A case's status (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Active,
    Suspended,
    Completed,
    Cancelled,
    Failed,
}

impl CaseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Cancelled | CaseStatus::Failed)
    }
}

/// Bookkeeping for one live multi-instance task firing (§4.5.5). A task may
/// have at most one in-flight group at a time in this implementation: it
/// will not refire until the current group's output side has fired
/// (`fired == true`) and every instance has reached a terminal state. This
/// resolves an ambiguity the distilled spec leaves open about pipelined
/// re-firing of the same MI task before its prior instances drain; see
/// DESIGN.md.
#[derive(Debug, Clone)]
pub struct MiGroup {
    pub min: u32,
    pub max: u32,
    pub threshold: u32,
    pub instances: Vec<WorkitemId>,
    /// Count of instances that reached `Completed` through ordinary
    /// completion. Instances withdrawn by a cancellation set do **not**
    /// increment this counter (§9 open question, resolved as directed:
    /// withdrawn-by-cancellation items do not count toward the threshold).
    pub completed: u32,
    /// Whether the output side has already fired for this group. Further
    /// completions of stragglers after this point are accepted (recorded)
    /// but do not refire the output side.
    pub fired: bool,
}

impl MiGroup {
    pub fn all_terminal(&self, workitems: &HashMap<WorkitemId, WorkItem>) -> bool {
        self.instances.iter().all(|id| workitems.get(id).map(|w| w.status.is_terminal()).unwrap_or(true))
    }

    pub fn ready_to_fire(&self, workitems: &HashMap<WorkitemId, WorkItem>) -> bool {
        !self.fired && (self.completed >= self.threshold || self.all_terminal(workitems))
    }
}

/// A composite task fired but not yet resolved into a child case (§4.5.4):
/// recorded by `fire_input_side` and drained by the registry, which mints
/// the child case and tracks the parent binding.
#[derive(Debug, Clone)]
pub struct PendingComposite {
    pub task_id: TaskId,
    pub sub_net: NetId,
    pub input: CaseDocument,
    /// The parent's composite work item (§4.5.4, §9 design note on cyclic
    /// ownership): never entered into `CaseRuntime::workitems` since no
    /// participant ever checks it out, but carried alongside the child case
    /// so the runner can find its way back to `task_id` when the child
    /// completes.
    pub workitem_id: WorkitemId,
}

/// One case's full live state.
pub struct CaseRuntime {
    pub case_id: CaseId,
    /// The net this case's marking is defined over: the specification's
    /// root net for a top-level case, or the decomposed sub-net for a
    /// child case created by composite task descent (§4.5.4).
    pub net_id: NetId,
    pub status: CaseStatus,
    pub marking: Marking,
    pub data: CaseDocument,
    pub workitems: HashMap<WorkitemId, WorkItem>,
    pub mi_groups: HashMap<TaskId, MiGroup>,
    /// Round-robin fairness cursor over task ids (§4.5.8): the task id to
    /// resume scanning from on the next quiescence iteration.
    pub fairness_cursor: Option<TaskId>,
    /// Monotonic counter minting instance suffixes and child case indices
    /// for this case.
    pub next_ordinal: u32,
    /// Composite tasks fired this quiescence run, awaiting the registry to
    /// mint their child case (§4.5.4).
    pub pending_composites: Vec<PendingComposite>,
    /// For a sub-case: the parent case and the composite work item whose
    /// completion is bound to this case reaching a terminal state.
    pub parent: Option<(CaseId, WorkitemId)>,
}

impl CaseRuntime {
    pub fn new(case_id: CaseId, net_id: NetId, data: CaseDocument) -> Self {
        Self {
            case_id,
            net_id,
            status: CaseStatus::Active,
            marking: Marking::new(),
            data,
            workitems: HashMap::new(),
            mi_groups: HashMap::new(),
            fairness_cursor: None,
            next_ordinal: 0,
            pending_composites: Vec::new(),
            parent: None,
        }
    }

    /// Build a child case for a composite-task descent, bound back to the
    /// parent's composite work item.
    pub fn new_child(
        case_id: CaseId,
        net_id: NetId,
        data: CaseDocument,
        parent: CaseId,
        parent_workitem: WorkitemId,
    ) -> Self {
        let mut case = Self::new(case_id, net_id, data);
        case.parent = Some((parent, parent_workitem));
        case
    }

    pub fn next_instance_suffix(&mut self) -> u32 {
        self.next_ordinal += 1;
        self.next_ordinal
    }

    pub fn has_live_workitems_for_task(&self, task_id: &TaskId) -> bool {
        self.workitems.values().any(|w| w.id.task_id == *task_id && w.status.is_live())
    }

    pub fn live_workitem_count(&self) -> usize {
        self.workitems.values().filter(|w| w.status.is_live()).count()
    }

    pub fn workitems_for_task(&self, task_id: &TaskId) -> Vec<&WorkItem> {
        self.workitems.values().filter(|w| w.id.task_id == *task_id).collect()
    }

    pub fn live_workitems_in_places(&self, places: &[Place]) -> Vec<WorkitemId> {
        let task_ids: Vec<&TaskId> = places
            .iter()
            .filter_map(|p| match p {
                Place::Task(t) => Some(t),
                Place::Condition(_) => None,
            })
            .collect();
        self.workitems
            .values()
            .filter(|w| w.status.is_live() && task_ids.iter().any(|t| **t == w.id.task_id))
            .map(|w| w.id.clone())
            .collect()
    }

    pub fn insert_workitem(&mut self, item: WorkItem) {
        self.workitems.insert(item.id.clone(), item);
    }

    /// Withdraw a live work item. No-op (returns `false`) if it is already
    /// terminal or absent.
    pub fn withdraw_workitem(&mut self, id: &WorkitemId) -> bool {
        match self.workitems.get_mut(id) {
            Some(w) if w.status.is_live() => w.withdraw().is_ok(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "case_tests.rs"]
mod tests;
