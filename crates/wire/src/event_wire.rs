// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interface E (§4.9, §6): the shape an [`yawl_core::EventRecord`] takes
//! once it leaves the engine over SSE. `seq` doubles as the SSE `id` field
//! so a reconnecting subscriber can resume with `Last-Event-ID`.

use serde::{Deserialize, Serialize};
use yawl_core::EventRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub seq: u64,
    pub ts_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub kind: String,
    pub payload: serde_json::Value,
}

impl From<&EventRecord> for EventEnvelope {
    fn from(record: &EventRecord) -> Self {
        Self {
            seq: record.seq,
            ts_ms: record.ts_ms,
            case_id: record.case_id.as_ref().map(|c| c.to_string()),
            kind: record.kind.as_str().to_string(),
            payload: record.payload.clone(),
        }
    }
}
