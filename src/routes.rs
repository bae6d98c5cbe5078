//! REST endpoints: one-shot submission and server-side wizard sessions.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::dispatch::SubmissionOutcome;
use crate::error::WizardError;
use crate::form::validation::step_errors;
use crate::form::{
    FieldName, FormRecord, SessionStore, ToggleItem, WizardSession, WizardSnapshot, WizardStep,
};

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub sessions: Arc<SessionStore>,
}

/// Build the onboarding router. CORS is open; the form is served from a
/// different origin.
pub fn onboarding_routes(sessions: Arc<SessionStore>) -> Router {
    let state = OnboardingRouteState { sessions };

    Router::new()
        .route("/health", get(health))
        .route("/api/submit-onboarding", post(submit_onboarding))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/fields", put(set_field))
        .route("/api/sessions/{id}/toggle", post(toggle))
        .route("/api/sessions/{id}/next", post(next_step))
        .route("/api/sessions/{id}/back", post(back_step))
        .route("/api/sessions/{id}/confirm", post(confirm))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "swipe-onboarding"
    }))
}

// ── One-shot submission ─────────────────────────────────────────────────

/// POST /api/submit-onboarding
///
/// Validates the whole record, then dispatches it once.
async fn submit_onboarding(
    State(state): State<OnboardingRouteState>,
    Json(record): Json<FormRecord>,
) -> Response {
    let dispatcher = state.sessions.dispatcher();

    let errors: Vec<String> = WizardStep::ALL
        .into_iter()
        .flat_map(|step| step_errors(step, &record, dispatcher.rules()))
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"success": false, "errors": errors})),
        )
            .into_response();
    }

    let outcome = dispatcher.submit(record).await;
    outcome_response(&outcome, None)
}

// ── Wizard sessions ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SetFieldRequest {
    field: String,
    #[serde(default)]
    value: Value,
}

async fn create_session(State(state): State<OnboardingRouteState>) -> Response {
    let session = state.sessions.create().await;
    let snapshot = session.snapshot().await;
    (
        StatusCode::CREATED,
        Json(json!({"id": session.id, "createdAt": session.created_at, "session": snapshot})),
    )
        .into_response()
}

async fn get_session(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<String>,
) -> Response {
    match lookup(&state, &id).await {
        Ok(session) => Json(session.snapshot().await).into_response(),
        Err(resp) => resp,
    }
}

/// PUT /api/sessions/{id}/fields
///
/// `value` may be a string, a boolean (for the yes/no question) or a number.
async fn set_field(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<String>,
    Json(body): Json<SetFieldRequest>,
) -> Response {
    let session = match lookup(&state, &id).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(field) = FieldName::parse(&body.field) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Unknown field '{}'", body.field),
        );
    };
    let value = match body.value {
        Value::String(s) => s,
        Value::Bool(true) => "si".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        _ => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Field '{field}' expects a text value"),
            );
        }
    };

    wizard_response(session.update(|w| w.set_field(field, value)).await)
}

/// POST /api/sessions/{id}/toggle with `{"objective": ...}` or `{"platform": ...}`.
async fn toggle(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<String>,
    Json(item): Json<ToggleItem>,
) -> Response {
    match lookup(&state, &id).await {
        Ok(session) => wizard_response(session.update(|w| w.toggle(item)).await),
        Err(resp) => resp,
    }
}

async fn next_step(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    match lookup(&state, &id).await {
        Ok(session) => wizard_response(session.update(|w| w.next().map(|_| ())).await),
        Err(resp) => resp,
    }
}

async fn back_step(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    match lookup(&state, &id).await {
        Ok(session) => wizard_response(session.update(|w| w.back().map(|_| ())).await),
        Err(resp) => resp,
    }
}

/// POST /api/sessions/{id}/confirm
///
/// Holds the request open for the single dispatch attempt.
async fn confirm(State(state): State<OnboardingRouteState>, Path(id): Path<String>) -> Response {
    let session = match lookup(&state, &id).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    match session.confirm().await {
        Ok((outcome, snapshot)) => outcome_response(&outcome, serde_json::to_value(snapshot).ok()),
        Err(e) => wizard_error_response(&e),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

async fn lookup(state: &OnboardingRouteState, id: &str) -> Result<Arc<WizardSession>, Response> {
    let Ok(id) = Uuid::parse_str(id) else {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid session ID"));
    };
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Session not found"))
}

/// Map an outcome to a response. Downstream reasons never leave the server.
fn outcome_response(outcome: &SubmissionOutcome, session: Option<Value>) -> Response {
    let status = match outcome {
        SubmissionOutcome::Accepted { .. } => StatusCode::OK,
        SubmissionOutcome::Rejected { .. } => StatusCode::BAD_GATEWAY,
        SubmissionOutcome::TransportFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };

    let mut body = json!({
        "success": outcome.is_accepted(),
        "message": outcome.user_message(),
    });
    if let Some(id) = outcome.id() {
        body["taskId"] = json!(id);
    }
    if let Some(session) = session {
        body["session"] = session;
    }
    (status, Json(body)).into_response()
}

fn wizard_response(result: Result<WizardSnapshot, WizardError>) -> Response {
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => wizard_error_response(&e),
    }
}

fn wizard_error_response(err: &WizardError) -> Response {
    let status = match err {
        WizardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::InvalidAction { .. }
        | WizardError::SubmissionInFlight
        | WizardError::AlreadySubmitted => StatusCode::CONFLICT,
    };
    error_response(status, err.to_string())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"success": false, "error": message.into()})),
    )
        .into_response()
}
