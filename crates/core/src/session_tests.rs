// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn admin_scope_implies_designer_operator_monitor() {
    let scopes = ScopeSet::new([Scope::Admin]);
    assert!(scopes.has(Scope::Admin));
    assert!(scopes.has(Scope::Designer));
    assert!(scopes.has(Scope::Operator));
    assert!(scopes.has(Scope::Monitor));
    assert!(!scopes.has(Scope::Agent));
}

#[test]
fn operator_scope_implies_monitor_only() {
    let scopes = ScopeSet::new([Scope::Operator]);
    assert!(scopes.has(Scope::Operator));
    assert!(scopes.has(Scope::Monitor));
    assert!(!scopes.has(Scope::Designer));
    assert!(!scopes.has(Scope::Admin));
}

#[test]
fn agent_scope_does_not_imply_operator() {
    let scopes = ScopeSet::new([Scope::Agent]);
    assert!(scopes.has(Scope::Agent));
    assert!(!scopes.has(Scope::Operator));
}

#[test]
fn unrestricted_principal_may_act_on_any_task() {
    let p = Principal::new("alice");
    assert!(p.may_act_on_task("T1"));
}

#[test]
fn restricted_agent_principal_limited_to_assigned_tasks() {
    let p = Principal::restricted_to("agent-1", vec!["T1".into(), "T2".into()]);
    assert!(p.may_act_on_task("T1"));
    assert!(!p.may_act_on_task("T3"));
}

#[test]
fn session_expiry_and_extension() {
    let mut session = SessionHandle {
        token: "tok".into(),
        principal: Principal::new("alice"),
        scopes: ScopeSet::new([Scope::Operator]),
        expires_at_ms: 1_000,
    };
    assert!(session.is_expired(1_000));
    assert!(!session.is_expired(999));

    session.extend(2_000);
    assert_eq!(session.expires_at_ms, 2_000 + SESSION_TTL_MS);
}
