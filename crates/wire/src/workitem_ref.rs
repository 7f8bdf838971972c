// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the `{id}` path segment Interface B's workitem routes take
//! (§6: `/b/workitems/{id}/checkout` and friends) back into a structured
//! [`yawl_core::WorkitemId`]. The wire form is `WorkitemId`'s `Display`
//! output: `{case_id}:{task_id}` or `{case_id}:{task_id}#{instance}`.

use thiserror::Error;
use yawl_core::spec::TaskId;
use yawl_core::{CaseId, WorkitemId};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed workitem reference {0:?}")]
pub struct WorkitemRefError(pub String);

pub fn parse_workitem_ref(raw: &str) -> Result<WorkitemId, WorkitemRefError> {
    let (head, instance) = match raw.rsplit_once('#') {
        Some((head, suffix)) => {
            let n = suffix.parse::<u32>().map_err(|_| WorkitemRefError(raw.to_string()))?;
            (head, Some(n))
        }
        None => (raw, None),
    };
    let (case_id, task_id) = head.split_once(':').ok_or_else(|| WorkitemRefError(raw.to_string()))?;
    if case_id.is_empty() || task_id.is_empty() {
        return Err(WorkitemRefError(raw.to_string()));
    }
    Ok(WorkitemId {
        case_id: CaseId::new(case_id),
        task_id: TaskId::new(task_id),
        instance: instance.map(yawl_core::ids::InstanceSuffix),
    })
}
