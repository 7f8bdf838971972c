// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interface X (§4.8, §6): the engine's outbound callback to an exception
//! handler on work-item timeout or failure, and the decision it returns.

use serde::{Deserialize, Serialize};

/// Outbound `POST` body when a started work item exceeds its `sla_ms`
/// (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutCallback {
    pub case_id: String,
    pub workitem_id: String,
    pub task_id: String,
    pub started_at_ms: u64,
    pub sla_ms: u64,
}

/// Outbound `POST` body when a started work item is marked failed (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureCallback {
    pub case_id: String,
    pub workitem_id: String,
    pub task_id: String,
    pub reason: String,
    pub attempt: u32,
    pub retry_limit: u32,
}

/// The exception handler's decision, returned as the callback's response
/// body (§4.8, §7). The policy default when the handler is unreachable or
/// returns anything else is [`ExceptionDecision::Escalate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum ExceptionDecision {
    Retry,
    Reroute,
    Escalate,
}

impl Default for ExceptionDecision {
    fn default() -> Self {
        ExceptionDecision::Escalate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_defaults_to_escalate() {
        assert_eq!(ExceptionDecision::default(), ExceptionDecision::Escalate);
    }

    #[test]
    fn decision_round_trips_through_json() {
        let json = r#"{"decision": "retry"}"#;
        let decision: ExceptionDecision = serde_json::from_str(json).unwrap();
        assert_eq!(decision, ExceptionDecision::Retry);
    }
}
