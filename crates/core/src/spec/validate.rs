// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Load-time validation (§4.1): a specification is admitted to the engine
//! only if every diagnostic it produces is non-fatal.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::model::{Decomposition, Place, SpecificationModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Fatal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Dotted path identifying the offending element, e.g. `net.root.task.T1`.
    pub path: String,
}

impl Diagnostic {
    fn fatal(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Fatal, message: message.into(), path: path.into() }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into(), path: path.into() }
    }
}

impl SpecificationModel {
    /// Validate structural invariants from §3/§4.1. Returns every diagnostic
    /// found; the caller must refuse to admit the spec if any are `Fatal`.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        if !self.nets.contains_key(&self.root_net) {
            diags.push(Diagnostic::fatal("root_net", format!("root net {} not found", self.root_net)));
            return diags;
        }

        for net in self.nets.values() {
            self.validate_net(net, &mut diags);
        }

        self.validate_decomposition_dag(&mut diags);

        diags
    }

    fn validate_net(&self, net: &super::model::Net, diags: &mut Vec<Diagnostic>) {
        let path_prefix = format!("net.{}", net.id);

        // Every flow endpoint must exist.
        for flow in &net.flows {
            for place in [&flow.source, &flow.target] {
                if !self.place_exists(net, place) {
                    diags.push(Diagnostic::fatal(
                        format!("{path_prefix}.flow"),
                        format!("flow references missing place {place}"),
                    ));
                }
            }
        }

        // Input conditions have no incoming flows; output conditions have no
        // outgoing flows.
        for cond in &net.input_conditions {
            let place = Place::Condition(cond.clone());
            if net.flows.iter().any(|f| f.target == place) {
                diags.push(Diagnostic::fatal(
                    format!("{path_prefix}.condition.{cond}"),
                    "input condition has an incoming flow",
                ));
            }
        }
        for cond in &net.output_conditions {
            let place = Place::Condition(cond.clone());
            if net.flows.iter().any(|f| f.source == place) {
                diags.push(Diagnostic::fatal(
                    format!("{path_prefix}.condition.{cond}"),
                    "output condition has an outgoing flow",
                ));
            }
        }

        // Every task has >=1 incoming flow and >=1 outgoing flow.
        for task_id in &net.tasks {
            let incoming = net.incoming_places(task_id);
            if incoming.is_empty() {
                diags.push(Diagnostic::fatal(
                    format!("{path_prefix}.task.{task_id}"),
                    "task has no incoming flow",
                ));
            }
            if net.outgoing_flows(task_id).next().is_none() {
                diags.push(Diagnostic::fatal(
                    format!("{path_prefix}.task.{task_id}"),
                    "task has no outgoing flow",
                ));
            }

            let Some(task) = self.tasks.get(task_id) else {
                diags.push(Diagnostic::fatal(
                    format!("{path_prefix}.task.{task_id}"),
                    "task referenced by net but missing from task table",
                ));
                continue;
            };

            // XOR-join ties are broken by ordering index: every incoming
            // flow must carry a distinct order for a deterministic tie-break.
            if task.join == super::model::JoinType::Xor {
                let mut orders: Vec<u32> =
                    net.incoming_flows(task_id).map(|f| f.order).collect();
                orders.sort_unstable();
                let before = orders.len();
                orders.dedup();
                if orders.len() != before {
                    diags.push(Diagnostic::fatal(
                        format!("{path_prefix}.task.{task_id}"),
                        "XOR-join incoming flows must have distinct ordering indices",
                    ));
                }
            }

            // XOR/OR-split fallthrough ordering must be well-defined.
            if matches!(task.split, super::model::SplitType::Xor | super::model::SplitType::Or) {
                let mut orders: Vec<u32> = net.outgoing_flows(task_id).map(|f| f.order).collect();
                orders.sort_unstable();
                let before = orders.len();
                orders.dedup();
                if orders.len() != before {
                    diags.push(Diagnostic::fatal(
                        format!("{path_prefix}.task.{task_id}"),
                        "XOR/OR-split outgoing flows must have distinct ordering indices",
                    ));
                }
            }

            if let Some(mi) = &task.mi {
                if !mi.is_well_formed() {
                    diags.push(Diagnostic::fatal(
                        format!("{path_prefix}.task.{task_id}"),
                        format!(
                            "MI bounds not well-formed: min={} threshold={} max={}",
                            mi.min, mi.threshold, mi.max
                        ),
                    ));
                }
                if mi.creation == super::model::CreationMode::Static && mi.count_expr.is_none() {
                    diags.push(Diagnostic::warning(
                        format!("{path_prefix}.task.{task_id}"),
                        "static MI task has no count expression; defaults to min",
                    ));
                }
            }

            match self.decompositions.get(&task.decomposition) {
                None => diags.push(Diagnostic::fatal(
                    format!("{path_prefix}.task.{task_id}"),
                    format!("unknown decomposition {}", task.decomposition),
                )),
                Some(Decomposition::SubNet { net_id }) if !self.nets.contains_key(net_id) => {
                    diags.push(Diagnostic::fatal(
                        format!("{path_prefix}.task.{task_id}"),
                        format!("decomposition references missing sub-net {net_id}"),
                    ));
                }
                Some(_) => {}
            }
        }
    }

    fn place_exists(&self, net: &super::model::Net, place: &Place) -> bool {
        match place {
            Place::Condition(c) => {
                net.conditions.iter().any(|cond| &cond.id == c)
                    || net.input_conditions.contains(c)
                    || net.output_conditions.contains(c)
            }
            Place::Task(t) => net.tasks.contains(t),
        }
    }

    /// Sub-net decomposition references must form a DAG (no recursive
    /// decomposition), checked with a depth-bounded DFS over the net graph.
    /// Depth is bounded by the net count so a cycle terminates the search
    /// instead of recursing forever.
    fn validate_decomposition_dag(&self, diags: &mut Vec<Diagnostic>) {
        let mut done: HashSet<super::NetId> = HashSet::new();
        for net_id in self.nets.keys() {
            if !done.contains(net_id) {
                let mut path = Vec::new();
                self.visit_decomposition(net_id, &mut path, &mut done, diags);
            }
        }
    }

    fn visit_decomposition(
        &self,
        net_id: &super::NetId,
        path: &mut Vec<super::NetId>,
        done: &mut HashSet<super::NetId>,
        diags: &mut Vec<Diagnostic>,
    ) {
        if path.contains(net_id) {
            diags.push(Diagnostic::fatal(
                format!("net.{net_id}"),
                format!("recursive sub-net decomposition through {net_id}"),
            ));
            return;
        }
        if done.contains(net_id) || path.len() > self.nets.len() {
            return;
        }
        path.push(net_id.clone());
        if let Some(net) = self.nets.get(net_id) {
            for task_id in &net.tasks {
                if let Some(task) = self.tasks.get(task_id) {
                    if let Some(Decomposition::SubNet { net_id: child }) =
                        self.decompositions.get(&task.decomposition)
                    {
                        self.visit_decomposition(child, path, done, diags);
                    }
                }
            }
        }
        path.pop();
        done.insert(net_id.clone());
    }
}
