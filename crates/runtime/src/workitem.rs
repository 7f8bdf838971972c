// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-item lifecycle (C6, §4.6): the per-task state machine governing
//! interaction between the net runner and external participants.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use yawl_core::{CaseDocument, WorkitemId};

/// One state in the work-item lifecycle (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkitemStatus {
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

impl WorkitemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkitemStatus::Completed
                | WorkitemStatus::Failed
                | WorkitemStatus::Skipped
                | WorkitemStatus::Withdrawn
        )
    }

    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

/// A transition that is not permitted from the work item's current state
/// (§4.6). Maps onto [`yawl_core::ConflictError::InvalidTransition`] at the
/// call site.
#[derive(Debug, Error)]
#[error("workitem {id} cannot transition from {from:?} via {attempted}")]
pub struct TransitionError {
    pub id: WorkitemId,
    pub from: WorkitemStatus,
    pub attempted: &'static str,
}

/// A live work item: one enablement of an atomic task, or one instance of
/// a multi-instance task (§3).
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: WorkitemId,
    pub status: WorkitemStatus,
    pub owner: Option<String>,
    pub input: CaseDocument,
    pub output: Option<CaseDocument>,
    pub enabled_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    pub skippable: bool,
    pub sla_ms: Option<u64>,
    pub retry_limit: u32,
    pub attempt: u32,
    pub fail_reason: Option<String>,
}

impl WorkItem {
    pub fn new_enabled(
        id: WorkitemId,
        input: CaseDocument,
        skippable: bool,
        sla_ms: Option<u64>,
        retry_limit: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            status: WorkitemStatus::Enabled,
            owner: None,
            input,
            output: None,
            enabled_at_ms: now_ms,
            started_at_ms: None,
            completed_at_ms: None,
            skippable,
            sla_ms,
            retry_limit,
            attempt: 0,
            fail_reason: None,
        }
    }

    fn err(&self, attempted: &'static str) -> TransitionError {
        TransitionError { id: self.id.clone(), from: self.status, attempted }
    }

    pub fn offer(&mut self) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Enabled {
            return Err(self.err("offer"));
        }
        self.status = WorkitemStatus::Offered;
        Ok(())
    }

    pub fn allocate(&mut self, owner: impl Into<String>) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Offered {
            return Err(self.err("allocate"));
        }
        self.owner = Some(owner.into());
        self.status = WorkitemStatus::Allocated;
        Ok(())
    }

    pub fn start(&mut self, owner: &str, now_ms: u64) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Allocated {
            return Err(self.err("start"));
        }
        if self.owner.as_deref() != Some(owner) {
            return Err(self.err("start"));
        }
        self.status = WorkitemStatus::Started;
        self.started_at_ms = Some(now_ms);
        Ok(())
    }

    /// `checkout` (§6): Enabled -> Offered -> Allocated -> Started in one
    /// client-facing call, assigning ownership to `owner`. Rejected if the
    /// item is not `Enabled` (already claimed by someone else, or not a
    /// state that accepts checkout).
    pub fn checkout(&mut self, owner: impl Into<String>, now_ms: u64) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Enabled {
            return Err(self.err("checkout"));
        }
        let owner = owner.into();
        self.offer()?;
        self.allocate(owner.clone())?;
        self.start(&owner, now_ms)
    }

    /// `checkin` (§6): Started -> Completed, recording output. Idempotent:
    /// a repeated checkin with identical output is detected by the caller
    /// via [`yawl_core::CaseDocument`]'s merge-key tracking and surfaced as
    /// `ConflictError::DuplicateCheckin` rather than a second transition.
    pub fn complete(&mut self, output: CaseDocument, now_ms: u64) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Started {
            return Err(self.err("complete"));
        }
        self.output = Some(output);
        self.status = WorkitemStatus::Completed;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }

    /// Skip is permitted from any live, non-started-completion state as
    /// long as the task is marked skippable (§4.6); rejected otherwise.
    pub fn skip(&mut self) -> Result<(), TransitionError> {
        if !self.skippable || self.status.is_terminal() {
            return Err(self.err("skip"));
        }
        self.status = WorkitemStatus::Skipped;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>, now_ms: u64) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Started {
            return Err(self.err("fail"));
        }
        self.fail_reason = Some(reason.into());
        self.status = WorkitemStatus::Failed;
        self.completed_at_ms = Some(now_ms);
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Started {
            return Err(self.err("suspend"));
        }
        self.status = WorkitemStatus::Suspended;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Suspended {
            return Err(self.err("resume"));
        }
        self.status = WorkitemStatus::Started;
        Ok(())
    }

    /// Withdraw due to cancellation-set application or MI threshold
    /// completion (§4.5.2, §4.5.5). Only live items can be withdrawn.
    pub fn withdraw(&mut self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(self.err("withdraw"));
        }
        self.status = WorkitemStatus::Withdrawn;
        Ok(())
    }

    /// Reset a failed item back to `Enabled` for a retry decision from
    /// Interface X (§4.6), bumping the attempt counter. Rejected once the
    /// per-task retry limit is reached.
    pub fn retry(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        if self.status != WorkitemStatus::Failed {
            return Err(self.err("retry"));
        }
        if self.attempt >= self.retry_limit {
            return Err(self.err("retry"));
        }
        self.attempt += 1;
        self.owner = None;
        self.fail_reason = None;
        self.status = WorkitemStatus::Enabled;
        self.enabled_at_ms = now_ms;
        self.started_at_ms = None;
        self.completed_at_ms = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "workitem_tests.rs"]
mod tests;
