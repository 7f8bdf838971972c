// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn set_and_get_roundtrip() {
    let mut doc = CaseDocument::empty();
    doc.set_variable("x", "7");
    assert_eq!(doc.get_variable("x"), Some("7".to_string()));
}

#[test]
fn missing_variable_is_none() {
    let doc = CaseDocument::empty();
    assert_eq!(doc.get_variable("missing"), None);
}

#[test]
fn set_variable_replaces_existing_value() {
    let mut doc = CaseDocument::empty();
    doc.set_variable("x", "1");
    doc.set_variable("x", "2");
    assert_eq!(doc.get_variable("x"), Some("2".to_string()));
    assert_eq!(doc.variable_names().iter().filter(|n| *n == "x").count(), 1);
}

#[test]
fn extract_task_input_applies_input_queries() {
    let mut case_doc = CaseDocument::empty();
    case_doc.set_variable("amount", "100");
    let queries = vec![DataQuery { select: "amount".into(), target: "input_amount".into() }];
    let task_doc = case_doc.extract_task_input(&queries);
    assert_eq!(task_doc.get_variable("input_amount"), Some("100".to_string()));
}

#[test]
fn merge_task_output_is_idempotent_per_attempt() {
    let mut case_doc = CaseDocument::empty();
    let mut task_doc = CaseDocument::empty();
    task_doc.set_variable("result", "ok");
    let queries = vec![DataQuery { select: "result".into(), target: "status".into() }];

    let first = case_doc.merge_task_output(&queries, &task_doc, "wi-1:attempt-0");
    assert!(first);
    assert_eq!(case_doc.get_variable("status"), Some("ok".to_string()));

    case_doc.set_variable("status", "tampered");
    let second = case_doc.merge_task_output(&queries, &task_doc, "wi-1:attempt-0");
    assert!(!second);
    assert_eq!(case_doc.get_variable("status"), Some("tampered".to_string()));
}

#[test]
fn snapshot_roundtrip_preserves_variables() {
    let mut doc = CaseDocument::empty();
    doc.set_variable("amount", "100");
    doc.set_variable("status", "ok");

    let snapshot = doc.to_snapshot();
    let restored = CaseDocument::from_snapshot(&snapshot);

    assert_eq!(restored.get_variable("amount"), Some("100".to_string()));
    assert_eq!(restored.get_variable("status"), Some("ok".to_string()));
}

#[test]
fn snapshot_of_non_object_value_yields_empty_document() {
    let restored = CaseDocument::from_snapshot(&serde_json::json!(null));
    assert!(restored.variable_names().is_empty());
}

#[test]
fn merge_with_different_attempt_key_applies_again() {
    let mut case_doc = CaseDocument::empty();
    let mut task_doc = CaseDocument::empty();
    task_doc.set_variable("result", "ok");
    let queries = vec![DataQuery { select: "result".into(), target: "status".into() }];

    assert!(case_doc.merge_task_output(&queries, &task_doc, "wi-1:attempt-0"));
    assert!(case_doc.merge_task_output(&queries, &task_doc, "wi-1:attempt-1"));
}
