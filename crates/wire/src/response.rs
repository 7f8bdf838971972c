// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound response bodies for Interfaces A and B (§6).

use serde::{Deserialize, Serialize};
use yawl_core::spec::{Diagnostic, Severity};
use yawl_core::{CaseId, WorkitemId};
use yawl_runtime::{CaseStatus, WorkitemStatus};

/// `POST /b/connect` response: the session token and when it expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub token: String,
    pub expires_at_ms: u64,
}

/// `POST /a/specifications` response: the spec was admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecLoadedResponse {
    pub identifier: String,
    pub version: String,
    pub uri: String,
}

/// Wire mirror of [`yawl_core::spec::Severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityWire {
    Fatal,
    Warning,
}

impl From<Severity> for SeverityWire {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Fatal => SeverityWire::Fatal,
            Severity::Warning => SeverityWire::Warning,
        }
    }
}

/// Wire mirror of [`yawl_core::spec::Diagnostic`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticWire {
    pub severity: SeverityWire,
    pub message: String,
    pub path: String,
}

impl From<&Diagnostic> for DiagnosticWire {
    fn from(d: &Diagnostic) -> Self {
        Self { severity: d.severity.into(), message: d.message.clone(), path: d.path.clone() }
    }
}

/// `POST /a/specifications` error body when validation rejects the spec
/// (§4.1, §7): every diagnostic produced, not just the first fatal one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailureResponse {
    pub diagnostics: Vec<DiagnosticWire>,
}

/// A loaded specification, as listed by `GET /a/specifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecSummary {
    pub identifier: String,
    pub version: String,
    pub uri: String,
    pub active_cases: usize,
}

/// Wire mirror of [`yawl_core::spec::Place`], rendered as its display form
/// so clients don't need to parse the condition/task-output distinction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkingEntryWire {
    pub place: String,
    pub tokens: u32,
}

/// `GET /b/cases/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSummary {
    pub case_id: CaseId,
    pub status: CaseStatus,
    pub marking: Vec<MarkingEntryWire>,
}

/// One entry of `GET /b/workitems`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkitemSummary {
    pub id: String,
    pub case_id: CaseId,
    pub task_id: String,
    pub status: WorkitemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub enabled_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

impl WorkitemSummary {
    pub fn from_workitem(w: &yawl_runtime::WorkItem) -> Self {
        Self {
            id: w.id.to_string(),
            case_id: w.id.case_id.clone(),
            task_id: w.id.task_id.to_string(),
            status: w.status,
            owner: w.owner.clone(),
            enabled_at_ms: w.enabled_at_ms,
            started_at_ms: w.started_at_ms,
            completed_at_ms: w.completed_at_ms,
        }
    }
}

/// Query-string filter for `GET /b/workitems` (§6): every field optional,
/// narrowing the result set when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkitemFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkitemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl WorkitemFilter {
    /// Whether `workitem` passes every field this filter specifies.
    pub fn matches(&self, workitem: &yawl_runtime::WorkItem) -> bool {
        if let Some(case_id) = &self.case_id {
            if workitem.id.case_id.as_str() != case_id {
                return false;
            }
        }
        if let Some(task_id) = &self.task_id {
            if workitem.id.task_id.as_str() != task_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if workitem.status != status {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if workitem.owner.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }
        true
    }
}
