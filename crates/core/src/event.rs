// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event records (§3, §4.4): the append-only, durable, ordered facts that
//! are the source of truth for every case's state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{CaseId, WorkitemId};

/// The fixed enumeration of state-mutating facts the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SpecificationLoaded,
    SpecificationUnloaded,
    CaseStarted,
    CaseCompleted,
    CaseCancelled,
    CaseSuspended,
    CaseResumed,
    CaseFailed,
    WorkitemEnabled,
    WorkitemOffered,
    WorkitemAllocated,
    WorkitemStarted,
    WorkitemCompleted,
    WorkitemSkipped,
    WorkitemFailed,
    WorkitemWithdrawn,
    WorkitemSuspended,
    WorkitemResumed,
    WorkitemTimedOut,
    NetMarkingChanged,
    /// Distinguished event emitted when a [`crate::error::LogError`] forces
    /// the engine into degraded read-only mode (§7).
    SystemDegraded,
    /// Emitted when an Interface E subscriber's bounded backlog overflows
    /// and events were dropped for it (§4.9).
    SubscriberDropped,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SpecificationLoaded => "specification_loaded",
            EventKind::SpecificationUnloaded => "specification_unloaded",
            EventKind::CaseStarted => "case_started",
            EventKind::CaseCompleted => "case_completed",
            EventKind::CaseCancelled => "case_cancelled",
            EventKind::CaseSuspended => "case_suspended",
            EventKind::CaseResumed => "case_resumed",
            EventKind::CaseFailed => "case_failed",
            EventKind::WorkitemEnabled => "workitem_enabled",
            EventKind::WorkitemOffered => "workitem_offered",
            EventKind::WorkitemAllocated => "workitem_allocated",
            EventKind::WorkitemStarted => "workitem_started",
            EventKind::WorkitemCompleted => "workitem_completed",
            EventKind::WorkitemSkipped => "workitem_skipped",
            EventKind::WorkitemFailed => "workitem_failed",
            EventKind::WorkitemWithdrawn => "workitem_withdrawn",
            EventKind::WorkitemSuspended => "workitem_suspended",
            EventKind::WorkitemResumed => "workitem_resumed",
            EventKind::WorkitemTimedOut => "workitem_timed_out",
            EventKind::NetMarkingChanged => "net_marking_changed",
            EventKind::SystemDegraded => "system_degraded",
            EventKind::SubscriberDropped => "subscriber_dropped",
        }
    }

    /// Whether this event kind is scoped to a single case (used by the
    /// announcer's per-case FIFO filtering).
    pub fn is_case_scoped(&self) -> bool {
        !matches!(
            self,
            EventKind::SpecificationLoaded
                | EventKind::SpecificationUnloaded
                | EventKind::SystemDegraded
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only fact (§3, §4.4). `seq` is globally monotonic per engine
/// instance with no gaps; `case_id` is `None` only for engine-wide events
/// (spec load/unload, system degradation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub ts_ms: u64,
    pub case_id: Option<CaseId>,
    pub kind: EventKind,
    pub payload: Value,
}

impl EventRecord {
    /// Construct a record with `seq` left at 0; the log assigns the real
    /// sequence number atomically on `append` (§4.4).
    pub fn draft(ts_ms: u64, case_id: Option<CaseId>, kind: EventKind, payload: Value) -> Self {
        Self { seq: 0, ts_ms, case_id, kind, payload }
    }

    pub fn for_case(ts_ms: u64, case_id: CaseId, kind: EventKind, payload: Value) -> Self {
        Self::draft(ts_ms, Some(case_id), kind, payload)
    }

    pub fn for_workitem(ts_ms: u64, id: &WorkitemId, kind: EventKind, payload: Value) -> Self {
        Self::draft(ts_ms, Some(id.case_id.clone()), kind, payload)
    }

    /// A short one-line summary for structured log fields, matching the
    /// teacher's `Event::log_summary` convention.
    pub fn log_summary(&self) -> String {
        match &self.case_id {
            Some(case_id) => format!("{}[{}]", self.kind, case_id),
            None => self.kind.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
