// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task firing (§4.5.2-§4.5.5): consuming input tokens, applying
//! cancellation/remove sets, creating work items (atomic or multi-instance),
//! and — once a task's output is ready — producing output tokens per its
//! split type.

use yawl_core::spec::{CreationMode, Decomposition, JoinType, Net, Place, SplitType, Task, TaskId};
use yawl_core::{CaseId, EventKind, EventRecord, NetSemanticError, SpecificationModel, WorkitemId};

use crate::case::{CaseRuntime, MiGroup, PendingComposite};
use crate::workitem::WorkItem;

/// The input side of firing a task (§4.5.2): consume its incoming places
/// per join type, apply cancellation/remove sets, and create the resulting
/// work item(s) — or, for a composite task, queue a pending sub-case
/// descent (§4.5.4). Returns the events produced (`WORKITEM_ENABLED` per
/// new item) or a semantic error if MI bounds could not be satisfied.
pub fn fire_input_side(
    case: &mut CaseRuntime,
    net: &Net,
    task: &Task,
    spec: &SpecificationModel,
    now_ms: u64,
) -> Result<Vec<EventRecord>, NetSemanticError> {
    consume_incoming(net, task, case);
    apply_cancellation_and_remove_sets(net, task, case);

    if let Some(decomposition) = spec.decomposition(&task.id) {
        if let Decomposition::SubNet { net_id } = decomposition {
            let workitem_id = WorkitemId::new(case.case_id.clone(), task.id.clone());
            case.pending_composites.push(PendingComposite {
                task_id: task.id.clone(),
                sub_net: net_id.clone(),
                input: task_input_document(case, task),
                workitem_id,
            });
            return Ok(vec![]);
        }
    }

    if let Some(mi) = &task.mi {
        fire_mi_instances(case, task, mi, now_ms)
    } else {
        let id = WorkitemId::new(case.case_id.clone(), task.id.clone());
        let item = WorkItem::new_enabled(
            id.clone(),
            task_input_document(case, task),
            task.skippable,
            task.sla_ms,
            task.retry_limit,
            now_ms,
        );
        case.insert_workitem(item);
        Ok(vec![enabled_event(&id, now_ms)])
    }
}

/// Whether a task's decomposition descends into a sub-net (§4.5.4) rather
/// than binding an atomic participant task.
pub fn is_composite(decomposition: &Decomposition) -> bool {
    matches!(decomposition, Decomposition::SubNet { .. })
}

fn task_input_document(case: &CaseRuntime, task: &Task) -> yawl_core::CaseDocument {
    case.data.extract_task_input(&task.input_queries)
}

fn consume_incoming(net: &Net, task: &Task, case: &mut CaseRuntime) {
    let incoming = net.incoming_places(&task.id);
    match task.join {
        JoinType::And => {
            for place in &incoming {
                case.marking.remove_token(place);
            }
        }
        JoinType::Xor => {
            // Exactly one incoming place carries the triggering token;
            // consume the first marked one found.
            if let Some(place) = incoming.iter().find(|p| case.marking.is_marked(p)) {
                case.marking.remove_token(place);
            }
        }
        JoinType::Or => {
            // OR-join consumes every incoming place currently marked (it
            // does not wait for places no longer reachable).
            for place in &incoming {
                case.marking.remove_token(place);
            }
        }
    }
}

/// Apply a task's cancellation and remove sets (§4.5.2 step 2), using the
/// work-item map as it stood *before* this firing's own work items are
/// created — so a task listing itself in its own cancellation set never
/// withdraws the instance currently being fired.
fn apply_cancellation_and_remove_sets(net: &Net, task: &Task, case: &mut CaseRuntime) {
    for place in task.cancellation_set.iter().chain(task.remove_set.iter()) {
        case.marking.clear_place(place);
    }
    let withdrawable = case.live_workitems_in_places(&task.cancellation_set);
    for id in withdrawable {
        case.withdraw_workitem(&id);
        if let Some(group) = case.mi_groups.get_mut(&id.task_id) {
            group.instances.retain(|i| *i != id);
        }
    }
    let _ = net;
}

fn fire_mi_instances(
    case: &mut CaseRuntime,
    task: &Task,
    mi: &yawl_core::spec::MiBounds,
    now_ms: u64,
) -> Result<Vec<EventRecord>, NetSemanticError> {
    let requested = match mi.creation {
        CreationMode::Static => {
            let expr = mi.count_expr.as_deref().unwrap_or("1");
            let n = yawl_xpath::evaluate_number(&case.data, expr)
                .map_err(|e| NetSemanticError::PredicateFailed(e.to_string()))?;
            n.round().clamp(0.0, u32::MAX as f64) as u32
        }
        CreationMode::Dynamic => mi.min,
    };
    let count = requested.clamp(mi.min, mi.max);
    if count < mi.min {
        return Err(NetSemanticError::MiBoundsViolated {
            case_id: case.case_id.clone(),
            task_id: task.id.as_str().to_string(),
            created: count,
            min: mi.min,
        });
    }

    let input = task_input_document(case, task);
    let mut events = Vec::with_capacity(count as usize);
    let mut instances = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let suffix = case.next_instance_suffix();
        let id = WorkitemId::instance(case.case_id.clone(), task.id.clone(), suffix);
        let item = WorkItem::new_enabled(
            id.clone(),
            input.clone(),
            task.skippable,
            task.sla_ms,
            task.retry_limit,
            now_ms,
        );
        case.insert_workitem(item);
        events.push(enabled_event(&id, now_ms));
        instances.push(id);
    }

    case.mi_groups.insert(
        task.id.clone(),
        MiGroup { min: mi.min, max: mi.max, threshold: mi.threshold, instances, completed: 0, fired: false },
    );
    Ok(events)
}

fn enabled_event(id: &WorkitemId, now_ms: u64) -> EventRecord {
    EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemEnabled,
        serde_json::json!({ "workitem_id": id.to_string() }),
    )
}

/// The output side of firing a task (§4.5.3), run once its work item (or,
/// for an MI task, its group) has reached a terminal decision. Evaluates
/// split semantics against current case data and deposits tokens in the
/// chosen downstream place(s).
pub fn fire_output_side(
    case: &mut CaseRuntime,
    net: &Net,
    task: &Task,
    now_ms: u64,
) -> Result<Vec<EventRecord>, NetSemanticError> {
    let branches = net.outgoing_branches(&task.id);
    if branches.is_empty() {
        return Ok(vec![]);
    }
    // Guarded above: `branches` is non-empty from here on, so the
    // highest-ordered branch is always available as the structural default.
    let default_target = branches[branches.len() - 1].target.clone();

    let targets: Vec<Place> = match task.split {
        SplitType::And => branches.iter().map(|f| f.target.clone()).collect(),
        SplitType::Xor => {
            let mut chosen = None;
            for flow in &branches {
                if let Some(pred) = &flow.predicate {
                    if yawl_xpath::evaluate_bool(&case.data, pred)
                        .map_err(|e| NetSemanticError::PredicateFailed(e.to_string()))?
                    {
                        chosen = Some(flow.target.clone());
                        break;
                    }
                } else {
                    chosen = Some(flow.target.clone());
                    break;
                }
            }
            // No predicate satisfied: fall through to the highest-ordered
            // branch, the structural default (§4.5.3, §9).
            vec![chosen.unwrap_or(default_target)]
        }
        SplitType::Or => {
            let mut chosen = Vec::new();
            for flow in &branches {
                let satisfied = match &flow.predicate {
                    Some(pred) => yawl_xpath::evaluate_bool(&case.data, pred)
                        .map_err(|e| NetSemanticError::PredicateFailed(e.to_string()))?,
                    None => true,
                };
                if satisfied {
                    chosen.push(flow.target.clone());
                }
            }
            if chosen.is_empty() {
                chosen.push(default_target);
            }
            chosen
        }
    };

    for target in &targets {
        case.marking.add_token(target.clone());
    }

    Ok(vec![EventRecord::for_case(
        now_ms,
        case.case_id.clone(),
        EventKind::NetMarkingChanged,
        serde_json::json!({
            "task_id": task.id.as_str(),
            "marking": marking_payload(case),
        }),
    )])
}

fn marking_payload(case: &CaseRuntime) -> Vec<serde_json::Value> {
    case.marking
        .snapshot()
        .into_iter()
        .map(|(place, n)| serde_json::json!({ "place": place.to_string(), "tokens": n }))
        .collect()
}

/// Whether a case's run has reached completion or deadlock (§4.5.6), given
/// that its quiescence loop has no further enabled tasks to fire.
pub fn terminal_outcome(case: &CaseRuntime, net: &Net) -> Option<(EventKind, serde_json::Value)> {
    let output_marked = net.output_conditions.iter().any(|c| case.marking.is_marked(&Place::Condition(c.clone())));
    if output_marked {
        return Some((EventKind::CaseCompleted, serde_json::json!({})));
    }
    if case.marking.is_empty() && case.live_workitem_count() == 0 {
        // Nothing left at all and no output reached: a net with no input
        // conditions and no remaining work simply has nothing further to
        // do; this is only reached for a case that never held tokens,
        // which the launch path prevents, so in practice this arm is not
        // taken for a root case.
        return None;
    }
    if case.live_workitem_count() == 0 {
        let marking: Vec<String> = case.marking.snapshot().into_iter().map(|(p, _)| p.to_string()).collect();
        return Some((
            EventKind::CaseFailed,
            serde_json::json!({ "reason": "deadlock", "marking": marking }),
        ));
    }
    None
}

pub fn deadlock_error(case_id: &CaseId, net: &Net, case: &CaseRuntime) -> NetSemanticError {
    let _ = net;
    NetSemanticError::Deadlock {
        case_id: case_id.clone(),
        marking: case.marking.snapshot().into_iter().map(|(p, _)| p.to_string()).collect(),
    }
}

#[cfg(test)]
#[path = "firing_tests.rs"]
mod tests;
