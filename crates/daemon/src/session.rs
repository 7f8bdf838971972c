// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session handling for `POST /b/connect` (§6): credential verification via
//! an [`AuthProvider`], session minting, and RBAC scope checks at the HTTP
//! boundary.

use std::collections::HashMap;

use parking_lot::Mutex;
use yawl_adapters::AuthProvider;
use yawl_core::{AuthError, Principal, Scope, ScopeSet, SessionHandle};

pub struct SessionStore {
    auth: Box<dyn AuthProvider>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new(auth: Box<dyn AuthProvider>) -> Self {
        Self { auth, sessions: Mutex::new(HashMap::new()) }
    }

    /// Verify `presented` against `principal_id`, then mint and store a new
    /// session handle with the requested scopes (§6).
    pub async fn connect(
        &self,
        principal_id: String,
        presented: Option<&str>,
        scopes: Vec<Scope>,
        restricted_tasks: Option<Vec<String>>,
        now_ms: u64,
    ) -> Result<SessionHandle, AuthError> {
        self.auth.verify(&principal_id, presented).await?;
        let principal = match restricted_tasks {
            Some(tasks) => Principal::restricted_to(principal_id, tasks),
            None => Principal::new(principal_id),
        };
        let token = format!("tok-{}", nanoid::nanoid!(24));
        let handle = SessionHandle {
            token: token.clone(),
            principal,
            scopes: ScopeSet::new(scopes),
            expires_at_ms: now_ms + yawl_core::SESSION_TTL_MS,
        };
        self.sessions.lock().insert(token, handle.clone());
        Ok(handle)
    }

    /// Look up a session by its bearer token, extending its TTL on use
    /// (§6). Expired or unknown tokens are evicted and rejected.
    pub fn authenticate(&self, token: &str, now_ms: u64) -> Result<SessionHandle, AuthError> {
        let mut sessions = self.sessions.lock();
        let Some(handle) = sessions.get_mut(token) else {
            return Err(AuthError::MissingSession);
        };
        if handle.is_expired(now_ms) {
            let expires_at_ms = handle.expires_at_ms;
            sessions.remove(token);
            return Err(AuthError::SessionExpired { expires_at_ms });
        }
        handle.extend(now_ms);
        Ok(handle.clone())
    }

    /// Check that `handle` carries `required`, mapping a shortfall onto
    /// [`AuthError::InsufficientScope`] (§6).
    pub fn require(handle: &SessionHandle, required: Scope, required_name: &'static str) -> Result<(), AuthError> {
        if handle.scopes.has(required) {
            Ok(())
        } else {
            Err(AuthError::InsufficientScope { required: required_name })
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
