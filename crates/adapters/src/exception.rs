// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interface X client (§4.8, §6): the outbound side of the engine's
//! exception-handler callback. The registry calls this after recording a
//! work-item timeout or failure; the handler's decision tells it whether
//! to [`yawl_runtime::retry`], [`yawl_runtime::reroute`], or escalate
//! (leave the item failed for an operator).

use async_trait::async_trait;
use yawl_core::ExceptionHandlerError;
use yawl_wire::{ExceptionDecision, FailureCallback, TimeoutCallback};

/// A callback target an exception can be dispatched to. Implementations
/// must not block the case lock: the registry always calls this after
/// releasing it (§5 "work-item state changes never block on external
/// participants").
#[async_trait]
pub trait ExceptionHandler: Send + Sync + 'static {
    async fn on_timeout(&self, callback: TimeoutCallback) -> Result<ExceptionDecision, ExceptionHandlerError>;

    async fn on_failure(&self, callback: FailureCallback) -> Result<ExceptionDecision, ExceptionHandlerError>;
}

/// Posts the callback to a configured HTTP endpoint and parses its JSON
/// response as an [`ExceptionDecision`] (§4.8). Any transport error or
/// non-2xx status is [`ExceptionHandlerError::Unreachable`]; a 2xx body
/// that fails to parse is [`ExceptionHandlerError::MalformedDecision`] —
/// both fall back to `Escalate` at the call site (§7 policy default).
#[derive(Clone, Debug)]
pub struct HttpExceptionHandler {
    client: reqwest::Client,
    timeout_url: String,
    failure_url: String,
}

impl HttpExceptionHandler {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        let base = base_url.as_ref().trim_end_matches('/');
        Self {
            client: reqwest::Client::new(),
            timeout_url: format!("{base}/x/timeout"),
            failure_url: format!("{base}/x/failure"),
        }
    }

    async fn post(&self, url: &str, body: impl serde::Serialize) -> Result<ExceptionDecision, ExceptionHandlerError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExceptionHandlerError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExceptionHandlerError::Unreachable(format!(
                "exception handler returned status {}",
                response.status()
            )));
        }

        response
            .json::<ExceptionDecision>()
            .await
            .map_err(|e| ExceptionHandlerError::MalformedDecision(e.to_string()))
    }
}

#[async_trait]
impl ExceptionHandler for HttpExceptionHandler {
    async fn on_timeout(&self, callback: TimeoutCallback) -> Result<ExceptionDecision, ExceptionHandlerError> {
        tracing::info!(case_id = %callback.case_id, workitem_id = %callback.workitem_id, "dispatching timeout to exception handler");
        self.post(&self.timeout_url, callback).await
    }

    async fn on_failure(&self, callback: FailureCallback) -> Result<ExceptionDecision, ExceptionHandlerError> {
        tracing::info!(case_id = %callback.case_id, workitem_id = %callback.workitem_id, "dispatching failure to exception handler");
        self.post(&self.failure_url, callback).await
    }
}

/// No callback target is configured at all. Every timeout and failure is
/// reported `Unreachable`, which the registry's `decision_or_escalate`
/// turns into an immediate `Escalate` (§7's policy default when no
/// exception handler can be reached).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExceptionHandler;

#[async_trait]
impl ExceptionHandler for NoExceptionHandler {
    async fn on_timeout(&self, _callback: TimeoutCallback) -> Result<ExceptionDecision, ExceptionHandlerError> {
        Err(ExceptionHandlerError::Unreachable("no exception handler configured".into()))
    }

    async fn on_failure(&self, _callback: FailureCallback) -> Result<ExceptionDecision, ExceptionHandlerError> {
        Err(ExceptionHandlerError::Unreachable("no exception handler configured".into()))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use yawl_core::ExceptionHandlerError;
    use yawl_wire::{ExceptionDecision, FailureCallback, TimeoutCallback};

    use super::ExceptionHandler;

    /// Always returns the configured decision, recording every callback it
    /// received for assertion.
    #[derive(Clone)]
    pub struct FakeExceptionHandler {
        decision: ExceptionDecision,
        timeouts: Arc<Mutex<Vec<TimeoutCallback>>>,
        failures: Arc<Mutex<Vec<FailureCallback>>>,
    }

    impl FakeExceptionHandler {
        pub fn always(decision: ExceptionDecision) -> Self {
            Self { decision, timeouts: Arc::new(Mutex::new(Vec::new())), failures: Arc::new(Mutex::new(Vec::new())) }
        }

        pub fn timeouts(&self) -> Vec<TimeoutCallback> {
            self.timeouts.lock().clone()
        }

        pub fn failures(&self) -> Vec<FailureCallback> {
            self.failures.lock().clone()
        }
    }

    #[async_trait]
    impl ExceptionHandler for FakeExceptionHandler {
        async fn on_timeout(&self, callback: TimeoutCallback) -> Result<ExceptionDecision, ExceptionHandlerError> {
            self.timeouts.lock().push(callback);
            Ok(self.decision)
        }

        async fn on_failure(&self, callback: FailureCallback) -> Result<ExceptionDecision, ExceptionHandlerError> {
            self.failures.lock().push(callback);
            Ok(self.decision)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeExceptionHandler;

#[cfg(test)]
#[path = "exception_tests.rs"]
mod tests;
