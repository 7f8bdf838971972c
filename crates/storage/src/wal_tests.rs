// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use tempfile::tempdir;
use yawl_core::{CaseId, EventKind, EventRecord};

use super::*;

fn record(case: &str, kind: EventKind) -> EventRecord {
    EventRecord::draft(1_000, Some(CaseId::new(case)), kind, json!({}))
}

#[test]
fn append_assigns_monotonic_sequence_numbers_starting_at_one() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path, 0).expect("open");

    let s1 = wal.append(&record("1", EventKind::CaseStarted)).expect("append");
    let s2 = wal.append(&record("1", EventKind::WorkitemEnabled)).expect("append");
    let s3 = wal.append(&record("2", EventKind::CaseStarted)).expect("append");

    assert_eq!((s1, s2, s3), (1, 2, 3));
    assert_eq!(wal.write_seq(), 3);
}

#[test]
fn reopen_resumes_sequence_from_last_written_entry() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    {
        let mut wal = Wal::open(&path, 0).expect("open");
        wal.append(&record("1", EventKind::CaseStarted)).expect("append");
        wal.append(&record("1", EventKind::CaseCompleted)).expect("append");
        wal.flush().expect("flush");
    }

    let wal = Wal::open(&path, 0).expect("reopen");
    assert_eq!(wal.write_seq(), 2);
}

#[test]
fn entries_after_returns_in_sequence_order() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path, 0).expect("open");
    for _ in 0..5 {
        wal.append(&record("1", EventKind::NetMarkingChanged)).expect("append");
    }
    wal.flush().expect("flush");

    let entries = wal.entries_after(2).expect("entries_after");
    let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![3, 4, 5]);
}

#[test]
fn next_unprocessed_advances_past_already_processed_entries() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path, 1).expect("open with processed_seq=1");
    wal.append(&record("1", EventKind::CaseStarted)).expect("append"); // seq 1, already processed
    wal.append(&record("1", EventKind::WorkitemEnabled)).expect("append"); // seq 2
    wal.flush().expect("flush");

    let next = wal.next_unprocessed().expect("read").expect("some entry");
    assert_eq!(next.seq, 2);
    assert!(wal.next_unprocessed().expect("read").is_none());
}

#[test]
fn mark_processed_only_advances_forward() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path, 0).expect("open");
    wal.mark_processed(5);
    wal.mark_processed(2);
    assert_eq!(wal.processed_seq(), 5);
}

#[test]
fn corrupt_tail_is_dropped_and_backed_up_on_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    {
        let mut wal = Wal::open(&path, 0).expect("open");
        wal.append(&record("1", EventKind::CaseStarted)).expect("append");
        wal.flush().expect("flush");
    }
    // Append a garbage trailing line directly, simulating a crash mid-write.
    use std::io::Write;
    let mut f = OpenOptions::new().append(true).open(&path).expect("open for corrupt append");
    writeln!(f, "{{not valid json").expect("write garbage");
    f.sync_data().expect("sync");

    let wal = Wal::open(&path, 0).expect("reopen despite corruption");
    assert_eq!(wal.write_seq(), 1, "valid prefix is preserved");
    assert!(path.with_extension("bak").exists(), "corrupt file rotated to .bak");
}

#[test]
fn truncate_before_compacts_while_preserving_later_entries() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path, 0).expect("open");
    for _ in 0..4 {
        wal.append(&record("1", EventKind::NetMarkingChanged)).expect("append");
    }
    wal.flush().expect("flush");

    wal.truncate_before(3).expect("truncate");
    let remaining = wal.entries_after(0).expect("entries_after");
    let seqs: Vec<u64> = remaining.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![3, 4]);

    // The writer handle survives truncation and keeps assigning new sequence numbers.
    let s5 = wal.append(&record("1", EventKind::CaseCompleted)).expect("append after truncate");
    assert_eq!(s5, 5);
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        /// §8: sequence numbers assigned by `append` are strictly monotonic
        /// and gap-free regardless of how many records are appended.
        #[test]
        fn append_sequence_is_always_monotonic_and_gapless(n in 1usize..50) {
            let dir = tempdir().expect("tempdir");
            let path = dir.path().join("events.jsonl");
            let mut wal = Wal::open(&path, 0).expect("open");

            let mut seqs = Vec::with_capacity(n);
            for i in 0..n {
                seqs.push(wal.append(&record("1", if i % 2 == 0 { EventKind::NetMarkingChanged } else { EventKind::WorkitemEnabled })).expect("append"));
            }

            let expected: Vec<u64> = (1..=n as u64).collect();
            prop_assert_eq!(seqs, expected);
        }

        /// §8: replaying a log via `entries_after(0)` after a fresh reopen
        /// always reproduces the exact sequence written, independent of how
        /// many entries were appended or how the log was flushed along the
        /// way.
        #[test]
        fn replay_after_reopen_reproduces_every_appended_entry(n in 1usize..50, flush_every in 1usize..10) {
            let dir = tempdir().expect("tempdir");
            let path = dir.path().join("events.jsonl");
            {
                let mut wal = Wal::open(&path, 0).expect("open");
                for i in 0..n {
                    wal.append(&record("1", EventKind::NetMarkingChanged)).expect("append");
                    if i % flush_every == 0 {
                        wal.flush().expect("flush");
                    }
                }
                wal.flush().expect("final flush");
            }

            let wal = Wal::open(&path, 0).expect("reopen");
            let replayed = wal.entries_after(0).expect("entries_after");
            let seqs: Vec<u64> = replayed.iter().map(|e| e.seq).collect();
            let expected: Vec<u64> = (1..=n as u64).collect();
            prop_assert_eq!(seqs, expected);
            prop_assert_eq!(wal.write_seq(), n as u64);
        }
    }
}

#[test]
fn needs_flush_trips_on_pending_threshold() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("events.jsonl");
    let mut wal = Wal::open(&path, 0).expect("open");
    assert!(!wal.needs_flush());
    for _ in 0..FLUSH_THRESHOLD {
        wal.append(&record("1", EventKind::NetMarkingChanged)).expect("append");
    }
    assert!(wal.needs_flush());
    wal.flush().expect("flush");
    assert!(!wal.needs_flush());
}
