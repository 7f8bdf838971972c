// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::str::FromStr;

use super::*;

#[test]
fn place_display_roundtrips_through_parse_for_condition() {
    let place = Place::Condition(ConditionId::new("i"));
    let rendered = place.to_string();
    assert_eq!(Place::from_str(&rendered).unwrap(), place);
}

#[test]
fn place_display_roundtrips_through_parse_for_task() {
    let place = Place::Task(TaskId::new("T1"));
    let rendered = place.to_string();
    assert_eq!(Place::from_str(&rendered).unwrap(), place);
}

#[test]
fn place_parse_rejects_unknown_prefix() {
    assert!(Place::from_str("bogus:x").is_err());
}
