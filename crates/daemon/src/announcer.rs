// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interface E (§4.9): fan-out of appended events to subscribers. Every
//! subscriber gets its own bounded channel; a slow subscriber's backlog
//! overflowing never blocks the engine from making progress — the oldest
//! unread events are dropped for that subscriber and a synthetic
//! `SubscriberDropped` event is queued in their place.

use tokio::sync::mpsc;
use yawl_core::{EventKind, EventRecord};

const SUBSCRIBER_BACKLOG: usize = 256;

struct Subscriber {
    tx: mpsc::Sender<EventRecord>,
    from_sequence: u64,
    case_id: Option<yawl_core::CaseId>,
}

/// Fans out appended events to every live subscriber (§4.9). Holds no lock
/// shared with case mutation: [`Announcer::publish`] is a best-effort,
/// non-blocking send per subscriber.
#[derive(Default)]
pub struct Announcer {
    subscribers: parking_lot::Mutex<Vec<Subscriber>>,
}

impl Announcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber, resuming at or after `from_sequence`
    /// (§6's `from-sequence=N`), optionally filtered to one case.
    pub fn subscribe(&self, from_sequence: u64, case_id: Option<yawl_core::CaseId>) -> mpsc::Receiver<EventRecord> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BACKLOG);
        self.subscribers.lock().push(Subscriber { tx, from_sequence, case_id });
        rx
    }

    /// Publish one newly-appended event to every matching, still-live
    /// subscriber. Never awaits and never blocks on a full channel: a
    /// subscriber whose backlog is full is dropped, with its gap recorded
    /// via a synthetic [`EventKind::SubscriberDropped`] sent on the next
    /// successful send.
    pub fn publish(&self, record: &EventRecord) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain_mut(|sub| {
            if record.seq < sub.from_sequence {
                return true;
            }
            if let Some(want) = &sub.case_id {
                if record.case_id.as_ref() != Some(want) {
                    return true;
                }
            }
            match sub.tx.try_send(record.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    let dropped = EventRecord::draft(
                        record.ts_ms,
                        record.case_id.clone(),
                        EventKind::SubscriberDropped,
                        serde_json::json!({ "last_seq_before_drop": record.seq }),
                    );
                    // Best-effort: if even this doesn't fit, the subscriber
                    // is simply gone until it reconnects with a fresher
                    // `from-sequence`.
                    let _ = sub.tx.try_send(dropped);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

#[cfg(test)]
#[path = "announcer_tests.rs"]
mod tests;
