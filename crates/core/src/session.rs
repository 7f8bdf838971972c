// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session handles and authorisation scopes (§3, §6).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Session TTL per §6: 30 minutes, extended on use.
pub const SESSION_TTL_MS: u64 = 30 * 60 * 1000;

/// An authorisation scope claimed on a session handle (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Admin,
    Designer,
    Operator,
    Monitor,
    Agent,
}

impl Scope {
    /// The set of scopes this scope implies, per §6's lattice:
    /// `admin ⊇ designer ∪ operator ⊇ monitor`; `agent` is its own scope,
    /// restricted elsewhere to the principal's assigned task names.
    pub fn implies(&self) -> &'static [Scope] {
        match self {
            Scope::Admin => &[Scope::Admin, Scope::Designer, Scope::Operator, Scope::Monitor],
            Scope::Designer => &[Scope::Designer, Scope::Monitor],
            Scope::Operator => &[Scope::Operator, Scope::Monitor],
            Scope::Monitor => &[Scope::Monitor],
            Scope::Agent => &[Scope::Agent],
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scope::Admin => "admin",
            Scope::Designer => "designer",
            Scope::Operator => "operator",
            Scope::Monitor => "monitor",
            Scope::Agent => "agent",
        };
        write!(f, "{s}")
    }
}

/// The scopes granted to a session, expanded through [`Scope::implies`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet(HashSet<Scope>);

impl ScopeSet {
    pub fn new(granted: impl IntoIterator<Item = Scope>) -> Self {
        let mut expanded = HashSet::new();
        for scope in granted {
            expanded.extend(scope.implies().iter().copied());
        }
        Self(expanded)
    }

    pub fn has(&self, scope: Scope) -> bool {
        self.0.contains(&scope)
    }
}

/// The identity principal behind a session: who is calling, and — for an
/// `agent` scope — which task names they are restricted to (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted_tasks: Option<Vec<String>>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), restricted_tasks: None }
    }

    pub fn restricted_to(id: impl Into<String>, tasks: Vec<String>) -> Self {
        Self { id: id.into(), restricted_tasks: Some(tasks) }
    }

    /// Whether this principal (typically an `agent`-scoped one) may act on
    /// the named task.
    pub fn may_act_on_task(&self, task_name: &str) -> bool {
        match &self.restricted_tasks {
            None => true,
            Some(tasks) => tasks.iter().any(|t| t == task_name),
        }
    }
}

/// An authenticated, TTL-bounded handle returned by `POST /b/connect` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub token: String,
    pub principal: Principal,
    pub scopes: ScopeSet,
    pub expires_at_ms: u64,
}

impl SessionHandle {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Extend the TTL on use, per §6.
    pub fn extend(&mut self, now_ms: u64) {
        self.expires_at_ms = now_ms + SESSION_TTL_MS;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
