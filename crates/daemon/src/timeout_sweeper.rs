// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background SLA sweep (§4.6, §9): a task's `sla_ms`, if set, is not
//! enforced by any timer owned by the work item itself — nothing fires a
//! callback the instant a deadline passes. Instead this loop wakes
//! periodically, asks the registry which started work items have
//! overrun their SLA, and routes each one through
//! [`CaseRegistry::handle_sla_timeout`] exactly as a participant-reported
//! failure would be.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::registry::CaseRegistry;

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Spawn the sweep loop on the current tokio runtime. Returns the task
/// handle so [`crate::lifecycle`] can abort it on shutdown.
pub fn spawn(registry: Arc<CaseRegistry>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sweep_once(&registry).await;
        }
    })
}

async fn sweep_once(registry: &CaseRegistry) {
    let now = now_ms();
    for (case_id, workitem) in registry.started_workitems() {
        let Some(sla_ms) = workitem.sla_ms else { continue };
        let Some(started_at_ms) = workitem.started_at_ms else { continue };
        if now.saturating_sub(started_at_ms) < sla_ms {
            continue;
        }
        if let Err(err) = registry.handle_sla_timeout(case_id.clone(), workitem.id.clone(), now).await {
            warn!(case_id = %case_id, workitem_id = %workitem.id, error = %err, "sla timeout handling failed");
        }
    }
    registry.retire_expired(now);
}

#[cfg(test)]
#[path = "timeout_sweeper_tests.rs"]
mod tests;
