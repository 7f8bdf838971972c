// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The net runner's driving loop (C5, §4.5): ties `enablement`, `firing`,
//! and `workitem` together into one case's actual lifecycle — quiescence
//! runs, participant-facing work-item transitions, and composite-task
//! descent/return. Every public entry point here is what the registry (C7)
//! calls under a case's exclusive lock; nothing in this module acquires
//! locks itself.

use yawl_core::spec::{JoinType, Task, TaskId};
use yawl_core::{
    CaseDocument, ConflictError, EventKind, EventRecord, NetSemanticError, NotFoundError,
    SpecificationModel, WorkitemId,
};

use crate::case::{CaseRuntime, CaseStatus, PendingComposite};
use crate::enablement;
use crate::firing;
use crate::workitem::WorkitemStatus;

/// Aggregate error for the runner's participant-facing entry points,
/// narrower than [`yawl_core::EngineError`] since auth, session, and log
/// durability are the registry's concern, not the runner's.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    NetSemantic(#[from] NetSemanticError),
}

/// Everything a driving-loop call produced: events to append, in order, an
/// optional terminal outcome for the case, and any composite-task descents
/// the registry must resolve into child cases (§4.5.4).
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub events: Vec<EventRecord>,
    pub terminal: Option<EventKind>,
    pub pending_composites: Vec<PendingComposite>,
}

/// Run a case's marking to quiescence (§4.5): fire every currently-enabled
/// task's input side, re-checking enablement after each firing, until no
/// task is enabled; then decide whether the case has completed or
/// deadlocked (§4.5.6).
///
/// Starvation-freedom (§4.5.8): every task enabled in a pass fires that
/// same pass rather than only the first one found, so no enabled task is
/// ever passed over. `case.fairness_cursor` additionally rotates the order
/// tasks are considered in from one quiescence run to the next, so that if
/// firing order ever has an observable side effect, two consecutive runs
/// never favour the same task first.
pub fn run_to_quiescence(
    case: &mut CaseRuntime,
    spec: &SpecificationModel,
    now_ms: u64,
) -> Result<RunOutcome, NetSemanticError> {
    let mut events = Vec::new();
    let net = spec
        .net(&case.net_id)
        .ok_or_else(|| NetSemanticError::Deadlock { case_id: case.case_id.clone(), marking: vec![] })?;

    loop {
        let joins = |t: &TaskId| spec.find_task(t).map(|task| task.join).unwrap_or(JoinType::And);
        let enabled = enablement::enabled_tasks(net, &joins, &case.marking, |t| is_busy(case, t));
        if enabled.is_empty() {
            break;
        }
        let ordered = rotate_from_cursor(enabled, &case.fairness_cursor);
        for task_id in &ordered {
            let Some(task) = spec.find_task(task_id) else { continue };
            // Re-check: an earlier firing this same pass may already have
            // consumed the token this task needed (e.g. two XOR-joined
            // tasks sharing an upstream OR-split branch).
            if !enablement::is_enabled(net, task_id, task.join, &case.marking) || is_busy(case, task_id) {
                continue;
            }
            events.extend(firing::fire_input_side(case, net, task, spec, now_ms)?);
        }
        case.fairness_cursor = ordered.last().cloned();
    }

    let outcome = firing::terminal_outcome(case, net);
    let terminal = outcome.as_ref().map(|(kind, _)| *kind);
    if let Some((kind, payload)) = outcome {
        case.status = match kind {
            EventKind::CaseCompleted => CaseStatus::Completed,
            EventKind::CaseFailed => CaseStatus::Failed,
            _ => case.status,
        };
        events.push(EventRecord::for_case(now_ms, case.case_id.clone(), kind, payload));
    }

    Ok(RunOutcome { events, terminal, pending_composites: std::mem::take(&mut case.pending_composites) })
}

/// A task is not reconsidered for firing while it already has live work
/// (an in-flight MI group, or an atomic instance still outstanding): this
/// implementation creates at most one work item per atomic task enablement
/// and at most one MI group per task at a time, so a cyclic net must let
/// the current wave drain before the same task fires again. See DESIGN.md.
fn is_busy(case: &CaseRuntime, task_id: &TaskId) -> bool {
    if case.has_live_workitems_for_task(task_id) {
        return true;
    }
    match case.mi_groups.get(task_id) {
        Some(group) => !(group.fired && group.all_terminal(&case.workitems)),
        None => false,
    }
}

fn rotate_from_cursor(mut tasks: Vec<TaskId>, cursor: &Option<TaskId>) -> Vec<TaskId> {
    let Some(cursor) = cursor else { return tasks };
    if let Some(pos) = tasks.iter().position(|t| t > cursor) {
        tasks.rotate_left(pos);
    }
    tasks
}

fn find_task<'a>(spec: &'a SpecificationModel, id: &WorkitemId) -> Result<&'a Task, NotFoundError> {
    spec.find_task(&id.task_id).ok_or_else(|| NotFoundError::Workitem(id.clone()))
}

/// `checkout` (§6): claim an enabled work item for `owner`. No durable
/// event is recorded for the Offered/Allocated/Started leg of this
/// transition (§8 scenario 1 counts five events for a single-task case and
/// none of them is this one) — ownership is local, in-memory state until
/// the item's outcome (completion, skip, failure, withdrawal) is decided.
pub fn checkout(
    case: &mut CaseRuntime,
    id: &WorkitemId,
    owner: &str,
    now_ms: u64,
) -> Result<(), RunnerError> {
    let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
    item.checkout(owner, now_ms).map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    Ok(())
}

/// `checkin` (§6): complete a started work item with `output`, merge its
/// output into case data, and — once its task (or, for an MI task, its
/// group) is ready — fire the output side and run the case back to
/// quiescence.
pub fn checkin(
    case: &mut CaseRuntime,
    spec: &SpecificationModel,
    id: &WorkitemId,
    output: CaseDocument,
    now_ms: u64,
) -> Result<RunOutcome, RunnerError> {
    let task = find_task(spec, id)?;
    let attempt = {
        let item = case.workitems.get(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
        if item.status == WorkitemStatus::Completed {
            return Err(ConflictError::DuplicateCheckin(id.clone()).into());
        }
        item.attempt
    };

    {
        let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
        item.complete(output.clone(), now_ms).map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    }

    let merge_key = format!("{id}#{attempt}");
    case.data.merge_task_output(&task.output_queries, &output, &merge_key);

    // The output snapshot travels in the event payload, not just the
    // workitem id: recovery (yawl-daemon) rebuilds a case by re-running
    // this same `checkin` against a fresh `CaseRuntime`, and the
    // participant-supplied output document has no other durable home.
    let mut events = vec![EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemCompleted,
        serde_json::json!({ "workitem_id": id.to_string(), "output": output.to_snapshot(), "attempt": attempt }),
    )];

    let ready = match case.mi_groups.get_mut(&task.id) {
        Some(group) => {
            group.completed += 1;
            group.ready_to_fire(&case.workitems)
        }
        None => true,
    };

    if !ready {
        return Ok(RunOutcome { events, terminal: None, pending_composites: vec![] });
    }

    if let Some(group) = case.mi_groups.get_mut(&task.id) {
        group.fired = true;
        let stragglers: Vec<WorkitemId> = group
            .instances
            .iter()
            .filter(|i| case.workitems.get(*i).map(|w| w.status.is_live()).unwrap_or(false))
            .cloned()
            .collect();
        for straggler in stragglers {
            if case.withdraw_workitem(&straggler) {
                events.push(EventRecord::for_workitem(
                    now_ms,
                    &straggler,
                    EventKind::WorkitemWithdrawn,
                    serde_json::json!({ "workitem_id": straggler.to_string(), "reason": "mi_threshold_reached" }),
                ));
            }
        }
    }

    let net = spec.net(&case.net_id).ok_or_else(|| NotFoundError::Case(case.case_id.clone()))?;
    events.extend(firing::fire_output_side(case, net, task, now_ms)?);

    let mut outcome = run_to_quiescence(case, spec, now_ms)?;
    events.append(&mut outcome.events);
    Ok(RunOutcome { events, terminal: outcome.terminal, pending_composites: outcome.pending_composites })
}

/// `skip` (§4.6, §6): bypass a skippable work item without producing task
/// output, then proceed exactly as a checkin would for the purposes of
/// output-side firing.
pub fn skip(
    case: &mut CaseRuntime,
    spec: &SpecificationModel,
    id: &WorkitemId,
    now_ms: u64,
) -> Result<RunOutcome, RunnerError> {
    let task = find_task(spec, id)?;
    {
        let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
        item.skip().map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    }
    let mut events = vec![EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemSkipped,
        serde_json::json!({ "workitem_id": id.to_string() }),
    )];

    let ready = match case.mi_groups.get_mut(&task.id) {
        Some(group) => group.ready_to_fire(&case.workitems),
        None => true,
    };
    if !ready {
        return Ok(RunOutcome { events, terminal: None, pending_composites: vec![] });
    }
    if let Some(group) = case.mi_groups.get_mut(&task.id) {
        group.fired = true;
    }

    let net = spec.net(&case.net_id).ok_or_else(|| NotFoundError::Case(case.case_id.clone()))?;
    events.extend(firing::fire_output_side(case, net, task, now_ms)?);
    let mut outcome = run_to_quiescence(case, spec, now_ms)?;
    events.append(&mut outcome.events);
    Ok(RunOutcome { events, terminal: outcome.terminal, pending_composites: outcome.pending_composites })
}

/// `fail` (§4.6, §6): mark a started work item failed. The caller (the
/// registry) is responsible for invoking Interface X and acting on its
/// decision via [`retry`], [`reroute`], or escalation; this only records
/// the failure itself.
pub fn fail(
    case: &mut CaseRuntime,
    id: &WorkitemId,
    reason: impl Into<String>,
    now_ms: u64,
) -> Result<EventRecord, RunnerError> {
    let reason = reason.into();
    let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
    item.fail(reason.clone(), now_ms).map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    Ok(EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemFailed,
        serde_json::json!({ "workitem_id": id.to_string(), "reason": reason }),
    ))
}

/// Retry a failed work item per an Interface X decision (§4.6, §7): resets
/// it to `Enabled` so the next quiescence-adjacent checkout can pick it up
/// again. Rejected once the task's retry limit is exhausted.
pub fn retry(case: &mut CaseRuntime, id: &WorkitemId, now_ms: u64) -> Result<EventRecord, RunnerError> {
    let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
    item.retry(now_ms).map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    Ok(EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemEnabled,
        serde_json::json!({ "workitem_id": id.to_string(), "reason": "retry" }),
    ))
}

/// Reroute a failed work item per an Interface X decision (§4.6, §9): only
/// meaningful for a skippable task, since rerouting means discarding this
/// instance and letting the net proceed as if it had been skipped. For a
/// non-skippable task the open question is resolved as directed: the
/// reroute request is ignored and the failure is left to escalate.
pub fn reroute(
    case: &mut CaseRuntime,
    spec: &SpecificationModel,
    id: &WorkitemId,
    now_ms: u64,
) -> Result<RunOutcome, RunnerError> {
    let task = find_task(spec, id)?;
    if !task.skippable {
        return Ok(RunOutcome::default());
    }
    let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
    if item.status != WorkitemStatus::Failed {
        return Err(ConflictError::InvalidTransition(id.clone()).into());
    }
    // Rerouting discards this (failed) instance regardless of its retry
    // count, unlike `retry`; force it live again so `skip` applies.
    item.status = WorkitemStatus::Enabled;
    skip(case, spec, id, now_ms)
}

/// Suspend a started work item (§4.6). Purely a state transition; the net
/// runner does not otherwise react to suspension.
pub fn suspend_workitem(case: &mut CaseRuntime, id: &WorkitemId, now_ms: u64) -> Result<EventRecord, RunnerError> {
    let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
    item.suspend().map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    Ok(EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemSuspended,
        serde_json::json!({ "workitem_id": id.to_string() }),
    ))
}

pub fn resume_workitem(case: &mut CaseRuntime, id: &WorkitemId, now_ms: u64) -> Result<EventRecord, RunnerError> {
    let item = case.workitems.get_mut(id).ok_or_else(|| NotFoundError::Workitem(id.clone()))?;
    item.resume().map_err(|_| ConflictError::InvalidTransition(id.clone()))?;
    Ok(EventRecord::for_workitem(
        now_ms,
        id,
        EventKind::WorkitemResumed,
        serde_json::json!({ "workitem_id": id.to_string() }),
    ))
}

/// Resolve a child case reaching a terminal state back into its parent's
/// composite work item (§4.5.4): fire the composite task's output side and
/// run the parent back to quiescence. No-op (returns `Ok(None)`) if the
/// child did not complete successfully — a cancelled or failed child case
/// propagates as a failure of the parent's composite task instead, which
/// the registry surfaces via [`fail`] on the synthetic parent binding.
pub fn complete_child_case(
    parent: &mut CaseRuntime,
    spec: &SpecificationModel,
    task_id: &TaskId,
    now_ms: u64,
) -> Result<RunOutcome, RunnerError> {
    let task = spec.find_task(task_id).ok_or_else(|| NotFoundError::Workitem(WorkitemId::new(parent.case_id.clone(), task_id.clone())))?;
    let net = spec.net(&parent.net_id).ok_or_else(|| NotFoundError::Case(parent.case_id.clone()))?;
    let mut events = firing::fire_output_side(parent, net, task, now_ms)?;
    let mut outcome = run_to_quiescence(parent, spec, now_ms)?;
    events.append(&mut outcome.events);
    Ok(RunOutcome { events, terminal: outcome.terminal, pending_composites: outcome.pending_composites })
}

/// Cancel an entire case (§4.3, §6): withdraw every live work item, clear
/// the marking, and transition to `Cancelled`. Terminal; no further
/// quiescence run follows.
pub fn cancel_case(case: &mut CaseRuntime, now_ms: u64) -> Vec<EventRecord> {
    let mut events = Vec::new();
    let live: Vec<WorkitemId> =
        case.workitems.values().filter(|w| w.status.is_live()).map(|w| w.id.clone()).collect();
    for id in live {
        if case.withdraw_workitem(&id) {
            events.push(EventRecord::for_workitem(
                now_ms,
                &id,
                EventKind::WorkitemWithdrawn,
                serde_json::json!({ "workitem_id": id.to_string(), "reason": "case_cancelled" }),
            ));
        }
    }
    for place in case.marking.snapshot() {
        case.marking.clear_place(&place.0);
    }
    case.status = CaseStatus::Cancelled;
    events.push(EventRecord::for_case(now_ms, case.case_id.clone(), EventKind::CaseCancelled, serde_json::json!({})));
    events
}

pub fn suspend_case(case: &mut CaseRuntime, now_ms: u64) -> EventRecord {
    case.status = CaseStatus::Suspended;
    EventRecord::for_case(now_ms, case.case_id.clone(), EventKind::CaseSuspended, serde_json::json!({}))
}

pub fn resume_case(case: &mut CaseRuntime, now_ms: u64) -> EventRecord {
    case.status = CaseStatus::Active;
    EventRecord::for_case(now_ms, case.case_id.clone(), EventKind::CaseResumed, serde_json::json!({}))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
