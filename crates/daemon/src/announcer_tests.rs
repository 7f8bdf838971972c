use yawl_core::{CaseId, EventKind, EventRecord};

use super::*;

fn event(seq: u64, case: &str, kind: EventKind) -> EventRecord {
    let mut record = EventRecord::for_case(1, CaseId::new(case), kind, serde_json::json!({}));
    record.seq = seq;
    record
}

#[tokio::test]
async fn subscriber_receives_events_at_or_after_from_sequence() {
    let announcer = Announcer::new();
    let mut rx = announcer.subscribe(2, None);
    announcer.publish(&event(1, "1", EventKind::CaseStarted));
    announcer.publish(&event(2, "1", EventKind::WorkitemEnabled));
    let received = rx.try_recv().unwrap();
    assert_eq!(received.seq, 2);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn case_filtered_subscriber_ignores_other_cases() {
    let announcer = Announcer::new();
    let mut rx = announcer.subscribe(0, Some(CaseId::new("1")));
    announcer.publish(&event(1, "2", EventKind::CaseStarted));
    announcer.publish(&event(2, "1", EventKind::CaseStarted));
    let received = rx.try_recv().unwrap();
    assert_eq!(received.case_id, Some(CaseId::new("1")));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn closed_receiver_is_dropped_from_subscriber_list() {
    let announcer = Announcer::new();
    let rx = announcer.subscribe(0, None);
    drop(rx);
    announcer.publish(&event(1, "1", EventKind::CaseStarted));
    assert_eq!(announcer.subscribers.lock().len(), 0);
}
