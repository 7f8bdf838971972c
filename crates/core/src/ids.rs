// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Case and work-item identifiers (§3).
//!
//! `CaseId` is a plain dotted string rather than an [`crate::id::IdBuf`]
//! newtype: sub-case ids are formed by appending `.{index}` to a parent id
//! (§4.5.4), so the type needs string concatenation, not just opaque
//! equality.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spec::TaskId;

/// A running case's identifier. Minted at launch as a bare monotonic
/// counter rendered as a string (`"1"`, `"2"`, ...); sub-case children
/// extend the parent with a dot-separated suffix (`"1.1"`, `"1.2"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a sub-case id for the `index`-th composite-task descent
    /// within this case (§4.5.4, e.g. parent `42` -> child `42.1`).
    pub fn child(&self, index: u32) -> CaseId {
        CaseId(format!("{}.{}", self.0, index))
    }

    /// The parent case id, if this is a sub-case id.
    pub fn parent(&self) -> Option<CaseId> {
        self.0.rsplit_once('.').map(|(parent, _)| CaseId(parent.to_string()))
    }

    pub fn is_sub_case(&self) -> bool {
        self.0.contains('.')
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CaseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for CaseId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Distinguishes sibling instances of a multi-instance task (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceSuffix(pub u32);

impl fmt::Display for InstanceSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one work item: the case and task it belongs to, plus an
/// optional instance suffix for multi-instance tasks (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkitemId {
    pub case_id: CaseId,
    pub task_id: TaskId,
    pub instance: Option<InstanceSuffix>,
}

impl WorkitemId {
    pub fn new(case_id: CaseId, task_id: TaskId) -> Self {
        Self { case_id, task_id, instance: None }
    }

    pub fn instance(case_id: CaseId, task_id: TaskId, instance: u32) -> Self {
        Self { case_id, task_id, instance: Some(InstanceSuffix(instance)) }
    }
}

impl fmt::Display for WorkitemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(i) => write!(f, "{}:{}#{}", self.case_id, self.task_id, i),
            None => write!(f, "{}:{}", self.case_id, self.task_id),
        }
    }
}

/// Parse the `Display` form back into structured parts. Every durable event
/// payload carries a work item's id this way (`EventRecord::for_workitem`
/// callers use `id.to_string()`, not the struct shape), so this is how
/// readers of the log — the materialized projection, recovery replay —
/// recover a [`WorkitemId`] from a payload.
impl std::str::FromStr for WorkitemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (case_part, rest) = s.split_once(':').ok_or_else(|| format!("invalid workitem id: {s}"))?;
        match rest.split_once('#') {
            Some((task_part, suffix)) => {
                let suffix: u32 =
                    suffix.parse().map_err(|_| format!("invalid instance suffix in workitem id: {s}"))?;
                Ok(WorkitemId::instance(CaseId::new(case_part), task_part.into(), suffix))
            }
            None => Ok(WorkitemId::new(CaseId::new(case_part), rest.into())),
        }
    }
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
