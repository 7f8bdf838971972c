use yawl_adapters::AllowAllAuthProvider;
use yawl_core::Scope;

use super::*;

#[tokio::test]
async fn connect_mints_a_session_with_requested_scopes() {
    let store = SessionStore::new(Box::new(AllowAllAuthProvider));
    let handle = store.connect("alice".into(), None, vec![Scope::Operator], None, 1_000).await.unwrap();
    assert!(handle.scopes.has(Scope::Operator));
    assert!(handle.scopes.has(Scope::Monitor));
    assert_eq!(handle.expires_at_ms, 1_000 + yawl_core::SESSION_TTL_MS);
}

#[tokio::test]
async fn authenticate_extends_ttl_on_use() {
    let store = SessionStore::new(Box::new(AllowAllAuthProvider));
    let handle = store.connect("alice".into(), None, vec![Scope::Monitor], None, 1_000).await.unwrap();
    let refreshed = store.authenticate(&handle.token, 2_000).unwrap();
    assert_eq!(refreshed.expires_at_ms, 2_000 + yawl_core::SESSION_TTL_MS);
}

#[tokio::test]
async fn authenticate_rejects_expired_session() {
    let store = SessionStore::new(Box::new(AllowAllAuthProvider));
    let handle = store.connect("alice".into(), None, vec![Scope::Monitor], None, 0).await.unwrap();
    let err = store.authenticate(&handle.token, yawl_core::SESSION_TTL_MS + 1).unwrap_err();
    assert!(matches!(err, yawl_core::AuthError::SessionExpired { .. }));
}

#[tokio::test]
async fn authenticate_rejects_unknown_token() {
    let store = SessionStore::new(Box::new(AllowAllAuthProvider));
    let err = store.authenticate("nope", 0).unwrap_err();
    assert!(matches!(err, yawl_core::AuthError::MissingSession));
}

#[tokio::test]
async fn require_rejects_missing_scope() {
    let store = SessionStore::new(Box::new(AllowAllAuthProvider));
    let handle = store.connect("bob".into(), None, vec![Scope::Monitor], None, 0).await.unwrap();
    let err = SessionStore::require(&handle, Scope::Admin, "admin").unwrap_err();
    assert!(matches!(err, yawl_core::AuthError::InsufficientScope { .. }));
}
