// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authentication for `POST /b/connect` (§6): verifying the credential a
//! caller presents before the registry mints a [`yawl_core::SessionHandle`]
//! for the requested principal and scopes. Scope/RBAC enforcement itself
//! lives in `yawl-daemon`; this only answers "is this caller who it claims
//! to be."

use async_trait::async_trait;
use yawl_core::AuthError;

#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// Verify a presented credential (e.g. a bearer token from the
    /// `Authorization` header) for `principal_id`. `None` means no
    /// credential was presented at all.
    async fn verify(&self, principal_id: &str, presented: Option<&str>) -> Result<(), AuthError>;
}

/// Checks the presented credential against one fixed shared secret,
/// independent of which principal is connecting. Suitable for local
/// development and the test harness; a production deployment swaps this
/// for a real identity provider without changing the trait's call sites.
#[derive(Clone, Debug)]
pub struct StaticTokenAuthProvider {
    token: String,
}

impl StaticTokenAuthProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuthProvider {
    async fn verify(&self, _principal_id: &str, presented: Option<&str>) -> Result<(), AuthError> {
        match presented {
            Some(token) if token == self.token => Ok(()),
            _ => Err(AuthError::MissingSession),
        }
    }
}

/// Accepts every caller without checking a credential at all. This is a
/// real, production-reachable provider: the daemon's own `Config::from_env`
/// wires it in whenever `YAWL_AUTH_TOKEN` is unset, matching
/// local-development use where there is no identity provider to verify
/// against.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuthProvider;

#[async_trait]
impl AuthProvider for NoAuthProvider {
    async fn verify(&self, _principal_id: &str, _presented: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use async_trait::async_trait;
    use yawl_core::AuthError;

    use super::AuthProvider;

    /// Accepts every caller. Used by integration tests that exercise the
    /// engine without modeling an identity provider at all.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct AllowAllAuthProvider;

    #[async_trait]
    impl AuthProvider for AllowAllAuthProvider {
        async fn verify(&self, _principal_id: &str, _presented: Option<&str>) -> Result<(), AuthError> {
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::AllowAllAuthProvider;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
