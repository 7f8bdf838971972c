// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized read projection over the event log (§4.7 "Retire": keep a
//! terminal case's record queryable for a grace window after its full
//! runtime has been evicted from the registry).
//!
//! This is a cheap, marking-free summary — case status and per-workitem
//! status — built by folding [`yawl_core::EventKind`] facts in sequence
//! order. It is *not* the authoritative recovery mechanism for the net
//! runner (that lives in `yawl-runtime`, which needs the full
//! specification model to interpret a case's marking); this projection
//! only needs to answer `GET /b/cases/{id}`-shaped questions after the
//! runtime object itself is gone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use yawl_core::{CaseId, EventKind, EventRecord, WorkitemId};

use crate::wal::WalEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatusSnapshot {
    Active,
    Suspended,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkitemStatusSnapshot {
    Enabled,
    Offered,
    Allocated,
    Started,
    Suspended,
    Completed,
    Skipped,
    Failed,
    Withdrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSnapshot {
    pub status: CaseStatusSnapshot,
    pub workitems: HashMap<WorkitemId, WorkitemStatusSnapshot>,
    /// Sequence number of the last event folded into this snapshot.
    pub last_seq: u64,
}

impl CaseSnapshot {
    fn new() -> Self {
        Self { status: CaseStatusSnapshot::Active, workitems: HashMap::new(), last_seq: 0 }
    }
}

/// Folds a sequence of [`EventRecord`]s into per-case status summaries.
/// Applying the same entries twice in the same order is a no-op beyond the
/// first application (§8 "Replay determinism"): the projection only ever
/// moves a case/workitem forward through its state machine.
#[derive(Debug, Default)]
pub struct MaterializedState {
    cases: HashMap<CaseId, CaseSnapshot>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay every entry from an [`crate::EventLog`] to build a fresh
    /// projection, e.g. at engine startup (§4.7 "Recover").
    pub fn replay(entries: &[WalEntry]) -> Self {
        let mut state = Self::new();
        for entry in entries {
            state.apply(&entry.record);
        }
        state
    }

    pub fn case(&self, id: &CaseId) -> Option<&CaseSnapshot> {
        self.cases.get(id)
    }

    pub fn apply(&mut self, record: &EventRecord) {
        let Some(case_id) = &record.case_id else {
            return;
        };
        if !record.kind.is_case_scoped() {
            return;
        }
        let entry = self.cases.entry(case_id.clone()).or_insert_with(CaseSnapshot::new);
        if record.seq != 0 && record.seq <= entry.last_seq {
            return; // already folded; replay-idempotent
        }
        entry.last_seq = record.seq;

        match record.kind {
            EventKind::CaseStarted => entry.status = CaseStatusSnapshot::Active,
            EventKind::CaseSuspended => entry.status = CaseStatusSnapshot::Suspended,
            EventKind::CaseResumed => entry.status = CaseStatusSnapshot::Active,
            EventKind::CaseCompleted => entry.status = CaseStatusSnapshot::Completed,
            EventKind::CaseCancelled => entry.status = CaseStatusSnapshot::Cancelled,
            EventKind::CaseFailed => entry.status = CaseStatusSnapshot::Failed,
            EventKind::WorkitemEnabled => {
                if let Some(id) = workitem_id(record) {
                    entry.workitems.insert(id, WorkitemStatusSnapshot::Enabled);
                }
            }
            EventKind::WorkitemOffered => set_workitem(entry, record, WorkitemStatusSnapshot::Offered),
            EventKind::WorkitemAllocated => {
                set_workitem(entry, record, WorkitemStatusSnapshot::Allocated)
            }
            EventKind::WorkitemStarted => set_workitem(entry, record, WorkitemStatusSnapshot::Started),
            EventKind::WorkitemSuspended => {
                set_workitem(entry, record, WorkitemStatusSnapshot::Suspended)
            }
            EventKind::WorkitemResumed => set_workitem(entry, record, WorkitemStatusSnapshot::Started),
            EventKind::WorkitemCompleted => {
                set_workitem(entry, record, WorkitemStatusSnapshot::Completed)
            }
            EventKind::WorkitemSkipped => set_workitem(entry, record, WorkitemStatusSnapshot::Skipped),
            EventKind::WorkitemFailed => set_workitem(entry, record, WorkitemStatusSnapshot::Failed),
            EventKind::WorkitemWithdrawn => {
                set_workitem(entry, record, WorkitemStatusSnapshot::Withdrawn)
            }
            _ => {}
        }
    }
}

fn workitem_id(record: &EventRecord) -> Option<WorkitemId> {
    record.payload.get("workitem_id")?.as_str()?.parse().ok()
}

fn set_workitem(entry: &mut CaseSnapshot, record: &EventRecord, status: WorkitemStatusSnapshot) {
    if let Some(id) = workitem_id(record) {
        entry.workitems.insert(id, status);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
