// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interfaces A, B, E, and X's server side (§4.8, §6): axum routes that do
//! nothing but extract/authenticate a [`SessionHandle`], check a scope,
//! build one [`CaseRegistry`] call, and map its `Result` onto an HTTP
//! status and JSON body. No workflow logic lives here — see
//! [`crate::registry`] and `yawl_runtime` for that.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use yawl_core::{CaseId, EngineError, Scope, SessionHandle};
use yawl_wire::{
    parse_workitem_ref, CancelReasonRequest, CheckinRequest, ConnectRequest, ConnectResponse,
    EventEnvelope, FailRequest, LaunchCaseRequest, SpecLoadedResponse, SpecSummary,
    ValidationFailureResponse, WorkitemFilter,
};

use crate::error::{kind_for, status_for, to_response};
use crate::registry::CaseRegistry;
use crate::session::SessionStore;

/// Shared state every handler closes over.
pub struct AppState {
    pub registry: Arc<CaseRegistry>,
    pub sessions: Arc<SessionStore>,
}

fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Build the full Interface A/B/E router. `POST /b/connect` is the only
/// unauthenticated route; every other handler requires
/// [`AuthenticatedSession`] to extract successfully first.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/b/connect", post(connect))
        .route("/a/specifications", post(load_specification).get(list_specifications))
        .route("/a/specifications/:identifier", delete(unload_specification))
        .route("/b/cases", post(launch_case))
        .route("/b/cases/:case_id", get(case_status).delete(cancel_case))
        .route("/b/cases/:case_id/suspend", post(suspend_case))
        .route("/b/cases/:case_id/resume", post(resume_case))
        .route("/b/workitems", get(list_workitems))
        .route("/b/workitems/:id/checkout", post(checkout_workitem))
        .route("/b/workitems/:id/checkin", post(checkin_workitem))
        .route("/b/workitems/:id/skip", post(skip_workitem))
        .route("/b/workitems/:id/fail", post(fail_workitem))
        .route("/b/workitems/:id/suspend", post(suspend_workitem))
        .route("/b/workitems/:id/resume", post(resume_workitem))
        .route("/e/events", get(event_stream))
        .with_state(state)
}

/// A session already authenticated and TTL-extended, extracted from the
/// `Authorization: Bearer <token>` header (§6). Handlers that need a scope
/// beyond "any valid session" call [`SessionStore::require`] themselves.
struct AuthenticatedSession(SessionHandle);

impl FromRequestParts<Arc<AppState>> for AuthenticatedSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError(EngineError::Auth(yawl_core::AuthError::MissingSession)))?;
        let handle = state.sessions.authenticate(token, now_ms()).map_err(EngineError::Auth)?;
        Ok(Self(handle))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

/// Wraps [`EngineError`] as an axum `Response`, per §7's HTTP mapping.
struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(to_response(&self.0));
        if status == StatusCode::SERVICE_UNAVAILABLE {
            (status, [(axum::http::header::RETRY_AFTER, "1")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

fn require(handle: &SessionHandle, scope: Scope, name: &'static str) -> Result<(), ApiError> {
    SessionStore::require(handle, scope, name).map_err(|e| ApiError(EngineError::Auth(e)))
}

// ---------------------------------------------------------------------
// Interface B: connect
// ---------------------------------------------------------------------

async fn connect(State(state): State<Arc<AppState>>, Json(req): Json<ConnectRequest>) -> Result<Json<ConnectResponse>, ApiError> {
    let handle = state
        .sessions
        .connect(req.principal_id, None, req.scopes, req.restricted_tasks, now_ms())
        .await
        .map_err(EngineError::Auth)?;
    Ok(Json(ConnectResponse { token: handle.token, expires_at_ms: handle.expires_at_ms }))
}

// ---------------------------------------------------------------------
// Interface A: specification management
// ---------------------------------------------------------------------

async fn load_specification(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    body: Bytes,
) -> Result<Json<SpecLoadedResponse>, Response> {
    require(&session, Scope::Designer, "designer").map_err(IntoResponse::into_response)?;
    match state.registry.load_specification(&body, now_ms()) {
        Ok(spec_id) => Ok(Json(SpecLoadedResponse { identifier: spec_id.identifier, version: spec_id.version, uri: spec_id.uri })),
        Err(EngineError::Validation(yawl_core::ValidationError::Specification(diags))) => {
            let body = ValidationFailureResponse { diagnostics: diags.iter().map(Into::into).collect() };
            Err((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
        Err(err) => Err(ApiError(err).into_response()),
    }
}

async fn unload_specification(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(identifier): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Designer, "designer")?;
    let version = query.get("version").cloned().unwrap_or_default();
    let uri = query.get("uri").cloned().unwrap_or_default();
    let spec_id = yawl_core::SpecId::new(identifier, version, uri);
    state.registry.unload_specification(&spec_id, now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_specifications(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Result<Json<Vec<SpecSummary>>, ApiError> {
    require(&session, Scope::Monitor, "monitor")?;
    let summaries = state
        .registry
        .list_specifications()
        .into_iter()
        .map(|s| SpecSummary { identifier: s.spec_id.identifier, version: s.spec_id.version, uri: s.spec_id.uri, active_cases: s.active_cases })
        .collect();
    Ok(Json(summaries))
}

// ---------------------------------------------------------------------
// Interface B: case launch, status, control
// ---------------------------------------------------------------------

async fn launch_case(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Json(req): Json<LaunchCaseRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    let case_id = state.registry.launch_case(&req.spec_identifier, &req.spec_version, &req.spec_uri, req.initial_data, now_ms())?;
    Ok(Json(serde_json::json!({ "case_id": case_id.to_string() })))
}

async fn case_status(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(case_id): Path<String>,
) -> Result<Json<yawl_wire::CaseSummary>, ApiError> {
    require(&session, Scope::Monitor, "monitor")?;
    let summary = state.registry.case_status(&CaseId::new(case_id))?;
    Ok(Json(summary))
}

async fn cancel_case(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(case_id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    // Reason is carried for the audit trail only; a malformed or empty body
    // is not an error (§6: the request may omit it entirely).
    let _: CancelReasonRequest = if body.is_empty() { CancelReasonRequest::default() } else { serde_json::from_slice(&body).unwrap_or_default() };
    state.registry.cancel_case(&CaseId::new(case_id), now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn suspend_case(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(case_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    state.registry.suspend_case(&CaseId::new(case_id), now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resume_case(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(case_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    state.registry.resume_case(&CaseId::new(case_id), now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------
// Interface B: work-item transitions
// ---------------------------------------------------------------------

async fn list_workitems(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Query(filter): Query<WorkitemFilter>,
) -> Result<Json<Vec<yawl_wire::WorkitemSummary>>, ApiError> {
    require(&session, Scope::Monitor, "monitor")?;
    Ok(Json(state.registry.list_workitems(&filter)))
}

fn require_task_access(session: &SessionHandle, task_id: &str) -> Result<(), ApiError> {
    if session.principal.may_act_on_task(task_id) {
        Ok(())
    } else {
        Err(ApiError(EngineError::Auth(yawl_core::AuthError::InsufficientScope { required: "agent restricted to this task" })))
    }
}

async fn checkout_workitem(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Agent, "agent")?;
    let workitem_id = parse_workitem_ref(&id).map_err(|e| ApiError(EngineError::Validation(yawl_core::ValidationError::MalformedRequest(e.to_string()))))?;
    require_task_access(&session, workitem_id.task_id.as_str())?;
    state.registry.checkout(&workitem_id.case_id, &workitem_id, &session.principal.id, now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checkin_workitem(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<String>,
    Json(req): Json<CheckinRequest>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Agent, "agent")?;
    let workitem_id = parse_workitem_ref(&id).map_err(|e| ApiError(EngineError::Validation(yawl_core::ValidationError::MalformedRequest(e.to_string()))))?;
    require_task_access(&session, workitem_id.task_id.as_str())?;
    state.registry.checkin(workitem_id.case_id.clone(), workitem_id, req.output, now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn skip_workitem(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    let workitem_id = parse_workitem_ref(&id).map_err(|e| ApiError(EngineError::Validation(yawl_core::ValidationError::MalformedRequest(e.to_string()))))?;
    state.registry.skip(workitem_id.case_id.clone(), workitem_id, now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fail_workitem(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<String>,
    Json(req): Json<FailRequest>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Agent, "agent")?;
    let workitem_id = parse_workitem_ref(&id).map_err(|e| ApiError(EngineError::Validation(yawl_core::ValidationError::MalformedRequest(e.to_string()))))?;
    require_task_access(&session, workitem_id.task_id.as_str())?;
    state.registry.fail(workitem_id.case_id.clone(), workitem_id, req.reason, now_ms()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn suspend_workitem(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    let workitem_id = parse_workitem_ref(&id).map_err(|e| ApiError(EngineError::Validation(yawl_core::ValidationError::MalformedRequest(e.to_string()))))?;
    state.registry.suspend_workitem(&workitem_id.case_id, &workitem_id, now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resume_workitem(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require(&session, Scope::Operator, "operator")?;
    let workitem_id = parse_workitem_ref(&id).map_err(|e| ApiError(EngineError::Validation(yawl_core::ValidationError::MalformedRequest(e.to_string()))))?;
    state.registry.resume_workitem(&workitem_id.case_id, &workitem_id, now_ms())?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------
// Interface E: event stream
// ---------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct EventStreamQuery {
    #[serde(default, rename = "from-sequence")]
    from_sequence: u64,
    #[serde(default)]
    case_id: Option<String>,
}

/// `GET /e/events` (§4.9, §6): subscribes to the announcer and streams
/// every matching event as an SSE frame, `seq` doubling as the frame id so
/// a client that reconnects can resume with `Last-Event-ID`.
async fn event_stream(
    State(state): State<Arc<AppState>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Query(query): Query<EventStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    require(&session, Scope::Monitor, "monitor")?;
    let case_id = query.case_id.map(CaseId::new);
    let rx = state.registry.subscribe(query.from_sequence, case_id);
    let stream = ReceiverStream::new(rx).map(|record| {
        let envelope = EventEnvelope::from(&record);
        let event = SseEvent::default().id(envelope.seq.to_string()).json_data(&envelope).unwrap_or_else(|_| SseEvent::default());
        Ok(event)
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
