// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn draft_record_carries_zero_seq_until_appended() {
    let rec = EventRecord::draft(1_000, Some(CaseId::new("1")), EventKind::CaseStarted, json!({}));
    assert_eq!(rec.seq, 0);
}

#[test]
fn engine_wide_events_are_not_case_scoped() {
    assert!(!EventKind::SpecificationLoaded.is_case_scoped());
    assert!(!EventKind::SystemDegraded.is_case_scoped());
    assert!(EventKind::CaseStarted.is_case_scoped());
    assert!(EventKind::WorkitemEnabled.is_case_scoped());
}

#[test]
fn log_summary_includes_case_id_when_present() {
    let rec = EventRecord::for_case(0, CaseId::new("7"), EventKind::CaseCompleted, json!({}));
    assert_eq!(rec.log_summary(), "case_completed[7]");

    let no_case = EventRecord::draft(0, None, EventKind::SpecificationLoaded, json!({}));
    assert_eq!(no_case.log_summary(), "specification_loaded");
}

#[test]
fn event_kind_round_trips_through_json() {
    let kind = EventKind::WorkitemWithdrawn;
    let s = serde_json::to_string(&kind).unwrap();
    assert_eq!(s, "\"workitem_withdrawn\"");
    let back: EventKind = serde_json::from_str(&s).unwrap();
    assert_eq!(back, kind);
}
