// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound request bodies for Interfaces A and B (§6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use yawl_core::Scope;

/// `POST /b/connect`: establish a session for `principal_id` with the
/// requested scopes. `restricted_tasks` narrows an `agent`-scoped session
/// to the task names it may act on (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub principal_id: String,
    pub scopes: Vec<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted_tasks: Option<Vec<String>>,
}

/// `POST /b/cases`: launch a new case against a loaded specification
/// (§6, §4.3). `spec_version`/`spec_uri` may be omitted to fall back to a
/// legacy identifier-only match (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchCaseRequest {
    pub spec_identifier: String,
    #[serde(default)]
    pub spec_version: String,
    #[serde(default)]
    pub spec_uri: String,
    #[serde(default)]
    pub initial_data: HashMap<String, String>,
}

/// `POST /b/workitems/{id}/checkin`: complete a started work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRequest {
    pub output: HashMap<String, String>,
}

/// `POST /b/workitems/{id}/fail`: record a started work item's failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailRequest {
    pub reason: String,
}

/// `POST /b/cases/{id}/cancel`: cancel a case, with an optional operator
/// note carried only for the audit trail (not interpreted by the engine).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelReasonRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
