// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The case registry (C7): the daemon's single point of contact with the
//! kernel. Owns the event log, the materialized read projection, every
//! loaded specification, and every live case's [`CaseRuntime`] behind its
//! own exclusive lock. Every Interface A/B/X handler in [`crate::http`]
//! goes through here; nothing outside this module ever touches a
//! [`CaseRuntime`] directly.
//!
//! Concurrency (§5): each case has its own `parking_lot::Mutex`. A caller
//! that cannot acquire it within [`Config::case_lock_timeout`] gets
//! [`BusyError`] rather than blocking indefinitely — the operation that
//! already holds the lock is never aborted to make room for a new one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use yawl_adapters::ExceptionHandler;
use yawl_core::spec::{LegacySpecRef, Place, SpecId, SpecificationModel};
use yawl_core::{
    BusyError, CaseDocument, CaseId, ConflictError, EngineError, EventKind, EventRecord,
    JsonSpecLoader, LogError, NotFoundError, SpecDocumentError, SpecLoader, ValidationError,
    WorkitemId,
};
use yawl_runtime::{self as runtime, CaseRuntime, CaseStatus, PendingComposite, WorkItem};
use yawl_storage::{MaterializedState, Wal};
use yawl_wire::{CaseSummary, ExceptionDecision, FailureCallback, MarkingEntryWire, TimeoutCallback, WorkitemFilter, WorkitemSummary};

use crate::announcer::Announcer;
use crate::error::from_runner_error;

struct CaseEntry {
    case_id: CaseId,
    spec_id: SpecId,
    runtime: Mutex<CaseRuntime>,
}

/// A loaded specification summary, as surfaced by `GET /a/specifications`.
pub struct LoadedSpec {
    pub spec_id: SpecId,
    pub active_cases: usize,
}

/// The case registry. One instance per daemon process, shared behind an
/// `Arc` by every HTTP handler and the timeout sweeper.
pub struct CaseRegistry {
    wal: Mutex<Wal>,
    materialized: Mutex<MaterializedState>,
    specs: RwLock<HashMap<SpecId, Arc<SpecificationModel>>>,
    cases: RwLock<HashMap<CaseId, Arc<CaseEntry>>>,
    /// First-seen terminal timestamp per case, for the retirement sweep
    /// (§4.7 "Retire"). Absent entries are either still active or already
    /// evicted.
    terminal_since: Mutex<HashMap<CaseId, u64>>,
    next_case_seq: AtomicU64,
    announcer: Arc<Announcer>,
    exception_handler: Arc<dyn ExceptionHandler>,
    case_lock_timeout: Duration,
    retire_grace: Duration,
    loader: JsonSpecLoader,
    degraded: std::sync::atomic::AtomicBool,
}

impl CaseRegistry {
    pub fn new(
        wal: Wal,
        materialized: MaterializedState,
        announcer: Arc<Announcer>,
        exception_handler: Arc<dyn ExceptionHandler>,
        case_lock_timeout: Duration,
        retire_grace: Duration,
    ) -> Self {
        Self {
            wal: Mutex::new(wal),
            materialized: Mutex::new(materialized),
            specs: RwLock::new(HashMap::new()),
            cases: RwLock::new(HashMap::new()),
            terminal_since: Mutex::new(HashMap::new()),
            next_case_seq: AtomicU64::new(0),
            announcer,
            exception_handler,
            case_lock_timeout,
            retire_grace,
            loader: JsonSpecLoader,
            degraded: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Seed `next_case_seq` from recovery so freshly minted case ids never
    /// collide with one replayed from the log.
    pub fn seed_case_seq(&self, highest: u64) {
        self.next_case_seq.fetch_max(highest, Ordering::SeqCst);
    }

    /// Insert an already-reconstructed case (used by [`crate::recovery`]
    /// only; live traffic always goes through [`CaseRegistry::launch_case`]
    /// or [`CaseRegistry::launch_child_case`]).
    pub fn restore_case(&self, case_id: CaseId, spec_id: SpecId, runtime: CaseRuntime) {
        self.cases.write().insert(case_id.clone(), Arc::new(CaseEntry { case_id, spec_id, runtime: Mutex::new(runtime) }));
    }

    pub fn restore_specification(&self, model: SpecificationModel) {
        self.specs.write().insert(model.spec_id.clone(), Arc::new(model));
    }

    // ---------------------------------------------------------------
    // commit: the only path that appends to the WAL and fans out to
    // subscribers.
    // ---------------------------------------------------------------

    fn commit(&self, events: Vec<EventRecord>) -> Result<(), EngineError> {
        if events.is_empty() {
            return Ok(());
        }
        if self.degraded.load(Ordering::SeqCst) {
            return Err(EngineError::Log(LogError::AppendFailed("engine is in degraded read-only mode".into())));
        }
        let mut wal = self.wal.lock();
        let mut materialized = self.materialized.lock();
        for event in &events {
            let seq = match wal.append(event) {
                Ok(seq) => seq,
                Err(err) => {
                    self.degraded.store(true, Ordering::SeqCst);
                    return Err(EngineError::Log(err.into()));
                }
            };
            let mut recorded = event.clone();
            recorded.seq = seq;
            materialized.apply(&recorded);
            self.note_if_terminal(&recorded);
            self.announcer.publish(&recorded);
        }
        if wal.needs_flush() {
            if let Err(err) = wal.flush() {
                self.degraded.store(true, Ordering::SeqCst);
                return Err(EngineError::Log(err.into()));
            }
        }
        Ok(())
    }

    fn note_if_terminal(&self, record: &EventRecord) {
        let terminal = matches!(record.kind, EventKind::CaseCompleted | EventKind::CaseCancelled | EventKind::CaseFailed);
        if !terminal {
            return;
        }
        if let Some(case_id) = &record.case_id {
            self.terminal_since.lock().entry(case_id.clone()).or_insert(record.ts_ms);
        }
    }

    /// Evict live [`CaseRuntime`]s whose terminal grace window has elapsed
    /// (§4.7 "Retire"). Their status stays queryable afterwards through
    /// [`MaterializedState`] via [`CaseRegistry::case_status`].
    pub fn retire_expired(&self, now_ms: u64) {
        let expired: Vec<CaseId> = self
            .terminal_since
            .lock()
            .iter()
            .filter(|(_, since)| now_ms.saturating_sub(**since) >= self.retire_grace.as_millis() as u64)
            .map(|(id, _)| id.clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        let mut cases = self.cases.write();
        let mut since = self.terminal_since.lock();
        for id in expired {
            cases.remove(&id);
            since.remove(&id);
        }
    }

    // ---------------------------------------------------------------
    // case-lock access
    // ---------------------------------------------------------------

    fn get_case(&self, case_id: &CaseId) -> Result<Arc<CaseEntry>, EngineError> {
        self.cases
            .read()
            .get(case_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(NotFoundError::Case(case_id.clone())))
    }

    fn spec_for(&self, entry: &CaseEntry) -> Result<Arc<SpecificationModel>, EngineError> {
        self.specs
            .read()
            .get(&entry.spec_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(NotFoundError::Specification(entry.spec_id.clone())))
    }

    fn lock_case<'a>(&self, entry: &'a CaseEntry) -> Result<MutexGuard<'a, CaseRuntime>, EngineError> {
        entry.runtime.try_lock_for(self.case_lock_timeout).ok_or_else(|| {
            EngineError::Busy(BusyError { case_id: entry.case_id.clone(), waited_ms: self.case_lock_timeout.as_millis() as u64 })
        })
    }

    // ---------------------------------------------------------------
    // Interface A: specification management
    // ---------------------------------------------------------------

    pub fn load_specification(&self, bytes: &[u8], now_ms: u64) -> Result<SpecId, EngineError> {
        let model = self.loader.load(bytes).map_err(|err| match err {
            SpecDocumentError::Malformed(e) => ValidationError::MalformedRequest(e.to_string()),
            SpecDocumentError::Invalid(diags) => ValidationError::Specification(diags),
        })?;
        let spec_id = model.spec_id.clone();
        let payload = serde_json::to_value(&model).map_err(|e| ValidationError::MalformedRequest(e.to_string()))?;
        let event = EventRecord::draft(now_ms, None, EventKind::SpecificationLoaded, payload);
        self.specs.write().insert(spec_id.clone(), Arc::new(model));
        self.commit(vec![event])?;
        Ok(spec_id)
    }

    pub fn unload_specification(&self, spec_id: &SpecId, now_ms: u64) -> Result<(), EngineError> {
        let active = self.active_cases_for(spec_id);
        if active > 0 {
            return Err(ConflictError::SpecificationInUse(spec_id.clone()).into());
        }
        if !self.specs.read().contains_key(spec_id) {
            return Err(ConflictError::SpecificationNotLoaded(spec_id.clone()).into());
        }
        let event = EventRecord::draft(
            now_ms,
            None,
            EventKind::SpecificationUnloaded,
            serde_json::to_value(spec_id).unwrap_or_default(),
        );
        self.commit(vec![event])?;
        self.specs.write().remove(spec_id);
        Ok(())
    }

    fn active_cases_for(&self, spec_id: &SpecId) -> usize {
        self.cases
            .read()
            .values()
            .filter(|entry| &entry.spec_id == spec_id)
            .filter(|entry| match entry.runtime.try_lock() {
                Some(guard) => !guard.status.is_terminal(),
                // Can't confirm it's terminal right now; treat as active so
                // unload doesn't race a concurrent operation on it.
                None => true,
            })
            .count()
    }

    pub fn list_specifications(&self) -> Vec<LoadedSpec> {
        self.specs
            .read()
            .keys()
            .map(|id| LoadedSpec { spec_id: id.clone(), active_cases: self.active_cases_for(id) })
            .collect()
    }

    fn resolve_spec(&self, identifier: &str, version: &str, uri: &str) -> Result<Arc<SpecificationModel>, EngineError> {
        let specs = self.specs.read();
        if !version.is_empty() || !uri.is_empty() {
            let id = SpecId::new(identifier, version, uri);
            return specs
                .get(&id)
                .cloned()
                .ok_or_else(|| NotFoundError::Specification(id).into());
        }
        let legacy = LegacySpecRef { identifier: identifier.to_string() };
        specs
            .values()
            .find(|model| model.spec_id.matches_legacy(&legacy))
            .cloned()
            .ok_or_else(|| NotFoundError::Specification(SpecId::new(identifier, "", "")).into())
    }

    // ---------------------------------------------------------------
    // Interface B: case launch, status, and composite descent
    // ---------------------------------------------------------------

    pub fn launch_case(
        &self,
        spec_identifier: &str,
        spec_version: &str,
        spec_uri: &str,
        initial_data: HashMap<String, String>,
        now_ms: u64,
    ) -> Result<CaseId, EngineError> {
        let spec = self.resolve_spec(spec_identifier, spec_version, spec_uri)?;
        let case_id = CaseId::new((self.next_case_seq.fetch_add(1, Ordering::SeqCst) + 1).to_string());

        let mut data = CaseDocument::empty();
        for (key, value) in &initial_data {
            data.set_variable(key, value);
        }

        let mut case = CaseRuntime::new(case_id.clone(), spec.root_net.clone(), data);
        for condition_id in &spec.root().input_conditions {
            case.marking.add_token(Place::Condition(condition_id.clone()));
        }

        let started = EventRecord::for_case(
            now_ms,
            case_id.clone(),
            EventKind::CaseStarted,
            serde_json::json!({
                "spec_identifier": spec.spec_id.identifier,
                "spec_version": spec.spec_id.version,
                "spec_uri": spec.spec_id.uri,
                "net_id": spec.root_net.as_str(),
                "initial_data": initial_data,
            }),
        );

        let outcome = runtime::run_to_quiescence(&mut case, &spec, now_ms)?;
        let mut events = vec![started];
        events.extend(outcome.events);

        self.cases.write().insert(
            case_id.clone(),
            Arc::new(CaseEntry { case_id: case_id.clone(), spec_id: spec.spec_id.clone(), runtime: Mutex::new(case) }),
        );

        self.process_outcome(case_id.clone(), spec, events, outcome.terminal, outcome.pending_composites, None, now_ms)?;
        Ok(case_id)
    }

    /// Resolve a driving-loop result: commit its events, descend every
    /// fresh composite-task firing into a child case, and — if the case
    /// just reached a terminal state and is itself a sub-case — propagate
    /// that outcome up to its parent.
    fn process_outcome(
        &self,
        case_id: CaseId,
        spec: Arc<SpecificationModel>,
        events: Vec<EventRecord>,
        terminal: Option<EventKind>,
        pending: Vec<PendingComposite>,
        parent: Option<(CaseId, WorkitemId)>,
        now_ms: u64,
    ) -> Result<(), EngineError> {
        self.commit(events)?;

        for composite in pending {
            self.launch_child_case(case_id.clone(), composite, spec.clone(), now_ms)?;
        }

        if let (Some(kind), Some((parent_id, workitem_id))) = (terminal, parent) {
            self.propagate_to_parent(parent_id, workitem_id, kind, now_ms)?;
        }
        Ok(())
    }

    fn launch_child_case(
        &self,
        parent_id: CaseId,
        composite: PendingComposite,
        spec: Arc<SpecificationModel>,
        now_ms: u64,
    ) -> Result<(), EngineError> {
        let ordinal = {
            let entry = self.get_case(&parent_id)?;
            let mut guard = self.lock_case(&entry)?;
            guard.next_instance_suffix()
        };
        let child_id = parent_id.child(ordinal);

        let net = spec
            .net(&composite.sub_net)
            .ok_or_else(|| EngineError::NotFound(NotFoundError::Case(child_id.clone())))?;
        let mut child =
            CaseRuntime::new_child(child_id.clone(), composite.sub_net.clone(), composite.input.clone(), parent_id.clone(), composite.workitem_id.clone());
        for condition_id in &net.input_conditions {
            child.marking.add_token(Place::Condition(condition_id.clone()));
        }

        let started = EventRecord::for_case(
            now_ms,
            child_id.clone(),
            EventKind::CaseStarted,
            serde_json::json!({
                "net_id": composite.sub_net.as_str(),
                "parent_case_id": parent_id.to_string(),
                "parent_workitem_id": composite.workitem_id.to_string(),
            }),
        );

        let outcome = runtime::run_to_quiescence(&mut child, &spec, now_ms)?;
        let mut events = vec![started];
        events.extend(outcome.events);

        self.cases.write().insert(
            child_id.clone(),
            Arc::new(CaseEntry { case_id: child_id.clone(), spec_id: spec.spec_id.clone(), runtime: Mutex::new(child) }),
        );

        self.process_outcome(
            child_id,
            spec,
            events,
            outcome.terminal,
            outcome.pending_composites,
            Some((parent_id, composite.workitem_id)),
            now_ms,
        )
    }

    /// A child case reached a terminal state: fire the parent's composite
    /// task's output side on completion, or fail the parent case outright
    /// on cancellation/failure (§4.5.4, §9 — this workspace does not model
    /// compensation, so a failed or cancelled child case has no partial
    /// recovery path and takes its parent down with it).
    fn propagate_to_parent(
        &self,
        parent_id: CaseId,
        workitem_id: WorkitemId,
        child_terminal: EventKind,
        now_ms: u64,
    ) -> Result<(), EngineError> {
        let entry = self.get_case(&parent_id)?;
        let spec = self.spec_for(&entry)?;

        match child_terminal {
            EventKind::CaseCompleted => {
                let mut guard = self.lock_case(&entry)?;
                let outcome = runtime::complete_child_case(&mut guard, &spec, &workitem_id.task_id, now_ms).map_err(from_runner_error)?;
                let grandparent = guard.parent.clone();
                drop(guard);
                self.process_outcome(parent_id, spec, outcome.events, outcome.terminal, outcome.pending_composites, grandparent, now_ms)
            }
            EventKind::CaseFailed | EventKind::CaseCancelled => {
                let mut guard = self.lock_case(&entry)?;
                if guard.status.is_terminal() {
                    return Ok(());
                }
                guard.status = CaseStatus::Failed;
                let grandparent = guard.parent.clone();
                drop(guard);
                let event = EventRecord::for_case(
                    now_ms,
                    parent_id.clone(),
                    EventKind::CaseFailed,
                    serde_json::json!({ "reason": "composite_task_child_case_failed", "task_id": workitem_id.task_id.as_str() }),
                );
                self.process_outcome(parent_id, spec, vec![event], Some(EventKind::CaseFailed), vec![], grandparent, now_ms)
            }
            _ => Ok(()),
        }
    }

    /// `GET /b/cases/{id}` (§6). Falls back to the marking-free
    /// materialized projection for a case already evicted by
    /// [`CaseRegistry::retire_expired`] but still inside its grace window.
    pub fn case_status(&self, case_id: &CaseId) -> Result<CaseSummary, EngineError> {
        if let Ok(entry) = self.get_case(case_id) {
            let guard = self.lock_case(&entry)?;
            let marking = guard
                .marking
                .snapshot()
                .into_iter()
                .map(|(place, tokens)| MarkingEntryWire { place: place.to_string(), tokens })
                .collect();
            return Ok(CaseSummary { case_id: case_id.clone(), status: guard.status, marking });
        }
        let materialized = self.materialized.lock();
        let snapshot = materialized.case(case_id).ok_or_else(|| NotFoundError::Case(case_id.clone()))?;
        Ok(CaseSummary { case_id: case_id.clone(), status: status_from_snapshot(snapshot.status), marking: Vec::new() })
    }

    pub fn list_workitems(&self, filter: &WorkitemFilter) -> Vec<WorkitemSummary> {
        let cases = self.cases.read();
        let mut out = Vec::new();
        for entry in cases.values() {
            let Some(guard) = entry.runtime.try_lock() else { continue };
            for workitem in guard.workitems.values() {
                if filter.matches(workitem) {
                    out.push(WorkitemSummary::from_workitem(workitem));
                }
            }
        }
        out
    }

    // ---------------------------------------------------------------
    // Interface B: work-item transitions
    // ---------------------------------------------------------------

    pub fn checkout(&self, case_id: &CaseId, workitem_id: &WorkitemId, owner: &str, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        runtime::checkout(&mut guard, workitem_id, owner, now_ms).map_err(from_runner_error)
    }

    pub fn checkin(&self, case_id: CaseId, workitem_id: WorkitemId, output: HashMap<String, String>, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(&case_id)?;
        let spec = self.spec_for(&entry)?;
        let output_doc = CaseDocument::from_snapshot(&serde_json::json!(output));
        let mut guard = self.lock_case(&entry)?;
        let outcome = runtime::checkin(&mut guard, &spec, &workitem_id, output_doc, now_ms).map_err(from_runner_error)?;
        let parent = guard.parent.clone();
        drop(guard);
        self.process_outcome(case_id, spec, outcome.events, outcome.terminal, outcome.pending_composites, parent, now_ms)
    }

    pub fn skip(&self, case_id: CaseId, workitem_id: WorkitemId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(&case_id)?;
        let spec = self.spec_for(&entry)?;
        let mut guard = self.lock_case(&entry)?;
        let outcome = runtime::skip(&mut guard, &spec, &workitem_id, now_ms).map_err(from_runner_error)?;
        let parent = guard.parent.clone();
        drop(guard);
        self.process_outcome(case_id, spec, outcome.events, outcome.terminal, outcome.pending_composites, parent, now_ms)
    }

    /// `POST /b/workitems/{id}/fail` (§6): record the failure, dispatch it
    /// to Interface X, and apply the decision. Dispatch happens after the
    /// case lock is released (§5: "work-item state changes never block on
    /// external participants").
    pub async fn fail(&self, case_id: CaseId, workitem_id: WorkitemId, reason: String, now_ms: u64) -> Result<(), EngineError> {
        let (attempt, retry_limit) = self.record_failure(&case_id, &workitem_id, &reason, now_ms)?;
        let callback = FailureCallback {
            case_id: case_id.to_string(),
            workitem_id: workitem_id.to_string(),
            task_id: workitem_id.task_id.to_string(),
            reason,
            attempt,
            retry_limit,
        };
        let decision = decision_or_escalate(self.exception_handler.on_failure(callback).await);
        self.apply_exception_decision(case_id, workitem_id, decision, now_ms).await
    }

    fn record_failure(&self, case_id: &CaseId, workitem_id: &WorkitemId, reason: &str, now_ms: u64) -> Result<(u32, u32), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let event = runtime::fail(&mut guard, workitem_id, reason.to_string(), now_ms).map_err(from_runner_error)?;
        let item = guard.workitems.get(workitem_id).ok_or_else(|| NotFoundError::Workitem(workitem_id.clone()))?;
        let info = (item.attempt, item.retry_limit);
        drop(guard);
        self.commit(vec![event])?;
        Ok(info)
    }

    async fn apply_exception_decision(&self, case_id: CaseId, workitem_id: WorkitemId, decision: ExceptionDecision, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(&case_id)?;
        let spec = self.spec_for(&entry)?;
        match decision {
            ExceptionDecision::Retry => {
                let mut guard = self.lock_case(&entry)?;
                match runtime::retry(&mut guard, &workitem_id, now_ms) {
                    Ok(event) => {
                        drop(guard);
                        self.commit(vec![event])
                    }
                    // Retry limit exhausted: leave it Failed (equivalent to
                    // escalation) rather than surface an error the caller
                    // never requested.
                    Err(_) => Ok(()),
                }
            }
            ExceptionDecision::Reroute => {
                let mut guard = self.lock_case(&entry)?;
                let outcome = runtime::reroute(&mut guard, &spec, &workitem_id, now_ms).map_err(from_runner_error)?;
                let parent = guard.parent.clone();
                drop(guard);
                self.process_outcome(case_id, spec, outcome.events, outcome.terminal, outcome.pending_composites, parent, now_ms)
            }
            ExceptionDecision::Escalate => {
                // Leaving the item Failed may have starved the case of any
                // other live work; re-run quiescence so a resulting
                // deadlock is still detected and recorded.
                let mut guard = self.lock_case(&entry)?;
                let outcome = runtime::run_to_quiescence(&mut guard, &spec, now_ms)?;
                let parent = guard.parent.clone();
                drop(guard);
                self.process_outcome(case_id, spec, outcome.events, outcome.terminal, outcome.pending_composites, parent, now_ms)
            }
        }
    }

    /// Invoked by the background SLA sweeper (§4.6): record the timeout,
    /// dispatch it to Interface X, and apply the decision exactly as
    /// [`CaseRegistry::fail`] does.
    pub async fn handle_sla_timeout(&self, case_id: CaseId, workitem_id: WorkitemId, now_ms: u64) -> Result<(), EngineError> {
        let (sla_ms, started_at_ms) = {
            let entry = self.get_case(&case_id)?;
            let guard = self.lock_case(&entry)?;
            let item = guard.workitems.get(&workitem_id).ok_or_else(|| NotFoundError::Workitem(workitem_id.clone()))?;
            if item.status != yawl_runtime::WorkitemStatus::Started {
                return Ok(()); // already resolved since the sweep was scheduled
            }
            (item.sla_ms.unwrap_or(0), item.started_at_ms.unwrap_or(now_ms))
        };

        let timed_out = EventRecord::for_workitem(
            now_ms,
            &workitem_id,
            EventKind::WorkitemTimedOut,
            serde_json::json!({ "workitem_id": workitem_id.to_string(), "sla_ms": sla_ms }),
        );
        self.commit(vec![timed_out])?;

        let (attempt, retry_limit) = self.record_failure(&case_id, &workitem_id, "sla_timeout exceeded", now_ms)?;
        let callback = TimeoutCallback {
            case_id: case_id.to_string(),
            workitem_id: workitem_id.to_string(),
            task_id: workitem_id.task_id.to_string(),
            started_at_ms,
            sla_ms,
        };
        let _ = (attempt, retry_limit);
        let decision = decision_or_escalate(self.exception_handler.on_timeout(callback).await);
        self.apply_exception_decision(case_id, workitem_id, decision, now_ms).await
    }

    pub fn retry(&self, case_id: CaseId, workitem_id: WorkitemId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(&case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let event = runtime::retry(&mut guard, &workitem_id, now_ms).map_err(from_runner_error)?;
        drop(guard);
        self.commit(vec![event])
    }

    pub fn reroute(&self, case_id: CaseId, workitem_id: WorkitemId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(&case_id)?;
        let spec = self.spec_for(&entry)?;
        let mut guard = self.lock_case(&entry)?;
        let outcome = runtime::reroute(&mut guard, &spec, &workitem_id, now_ms).map_err(from_runner_error)?;
        let parent = guard.parent.clone();
        drop(guard);
        self.process_outcome(case_id, spec, outcome.events, outcome.terminal, outcome.pending_composites, parent, now_ms)
    }

    pub fn suspend_workitem(&self, case_id: &CaseId, workitem_id: &WorkitemId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let event = runtime::suspend_workitem(&mut guard, workitem_id, now_ms).map_err(from_runner_error)?;
        drop(guard);
        self.commit(vec![event])
    }

    pub fn resume_workitem(&self, case_id: &CaseId, workitem_id: &WorkitemId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let event = runtime::resume_workitem(&mut guard, workitem_id, now_ms).map_err(from_runner_error)?;
        drop(guard);
        self.commit(vec![event])
    }

    // ---------------------------------------------------------------
    // Interface B: case-level control
    // ---------------------------------------------------------------

    pub fn suspend_case(&self, case_id: &CaseId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let event = runtime::suspend_case(&mut guard, now_ms);
        drop(guard);
        self.commit(vec![event])
    }

    pub fn resume_case(&self, case_id: &CaseId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let event = runtime::resume_case(&mut guard, now_ms);
        drop(guard);
        self.commit(vec![event])
    }

    pub fn cancel_case(&self, case_id: &CaseId, now_ms: u64) -> Result<(), EngineError> {
        let entry = self.get_case(case_id)?;
        let mut guard = self.lock_case(&entry)?;
        let events = runtime::cancel_case(&mut guard, now_ms);
        let parent = guard.parent.clone();
        drop(guard);
        self.commit(events)?;
        if let Some((parent_id, workitem_id)) = parent {
            self.propagate_to_parent(parent_id, workitem_id, EventKind::CaseCancelled, now_ms)?;
        }
        Ok(())
    }

    /// `GET /e/events` (§4.9, §6): register a new Interface E subscriber.
    pub fn subscribe(&self, from_sequence: u64, case_id: Option<CaseId>) -> tokio::sync::mpsc::Receiver<EventRecord> {
        self.announcer.subscribe(from_sequence, case_id)
    }

    /// Every work item currently `Started`, for the SLA sweeper.
    pub fn started_workitems(&self) -> Vec<(CaseId, WorkItem)> {
        let cases = self.cases.read();
        let mut out = Vec::new();
        for entry in cases.values() {
            let Some(guard) = entry.runtime.try_lock() else { continue };
            for workitem in guard.workitems.values() {
                if workitem.status == yawl_runtime::WorkitemStatus::Started {
                    out.push((entry.case_id.clone(), workitem.clone()));
                }
            }
        }
        out
    }
}

fn decision_or_escalate(result: Result<ExceptionDecision, yawl_core::ExceptionHandlerError>) -> ExceptionDecision {
    match result {
        Ok(decision) => decision,
        Err(err) => {
            tracing::warn!(error = %err, "exception handler unreachable or malformed; escalating");
            ExceptionDecision::Escalate
        }
    }
}

fn status_from_snapshot(status: yawl_storage::CaseStatusSnapshot) -> CaseStatus {
    match status {
        yawl_storage::CaseStatusSnapshot::Active => CaseStatus::Active,
        yawl_storage::CaseStatusSnapshot::Suspended => CaseStatus::Suspended,
        yawl_storage::CaseStatusSnapshot::Completed => CaseStatus::Completed,
        yawl_storage::CaseStatusSnapshot::Cancelled => CaseStatus::Cancelled,
        yawl_storage::CaseStatusSnapshot::Failed => CaseStatus::Failed,
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
