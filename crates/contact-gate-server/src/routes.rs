// crates/contact-gate-server/src/routes.rs
// ============================================================================
// Module: Contact Routes
// Description: HTTP handlers for submissions, schema, and CAPTCHA settings.
// Purpose: Decode untrusted request bodies and hand them to the pipeline.
// Dependencies: axum, contact-gate-core, serde_json, tokio, url
// ============================================================================

//! ## Overview
//! `POST /api/contact` accepts JSON or urlencoded form bodies and always
//! answers with the [`ContactResponse`] shape. Transport-level problems
//! (oversized bodies, unsupported media types) are the only non-200 answers.
//! Every pipeline call runs under an overall deadline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use contact_gate_config::CaptchaMode;
use contact_gate_config::ContactGateConfig;
use contact_gate_core::CONTACT_SCHEMA;
use contact_gate_core::ContactResponse;
use contact_gate_core::PipelineResult;
use contact_gate_core::PipelineStage;
use contact_gate_core::RawSubmission;
use contact_gate_core::SubmissionAuditEvent;
use contact_gate_core::SubmissionPipeline;
use contact_gate_core::audit::SubmissionAuditEventParams;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

// ============================================================================
// SECTION: Routes
// ============================================================================

/// Submission endpoint.
pub const CONTACT_PATH: &str = "/api/contact";
/// Validation schema endpoint.
pub const SCHEMA_PATH: &str = "/api/contact/schema";
/// Public CAPTCHA settings endpoint.
pub const CAPTCHA_CONFIG_PATH: &str = "/api/captcha/config";

// ============================================================================
// SECTION: State
// ============================================================================

/// Public CAPTCHA settings served to the presentation layer.
///
/// # Invariants
/// - Never carries the server-held secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaDescriptor {
    /// Strategy in use.
    pub mode: CaptchaMode,
    /// Public site key for the widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_key: Option<String>,
    /// Action label passed to the widget.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Shared state for contact handlers.
#[derive(Clone)]
pub struct AppState {
    /// Submission pipeline.
    pipeline: SubmissionPipeline,
    /// Maximum accepted request body size.
    max_body_bytes: usize,
    /// Overall deadline per submission.
    request_timeout: Duration,
    /// Public CAPTCHA settings.
    captcha: CaptchaDescriptor,
}

impl AppState {
    /// Builds handler state from a pipeline and the loaded configuration.
    #[must_use]
    pub fn new(pipeline: SubmissionPipeline, config: &ContactGateConfig) -> Self {
        Self {
            pipeline,
            max_body_bytes: config.server.max_body_bytes,
            request_timeout: Duration::from_millis(config.server.request_timeout_ms),
            captcha: CaptchaDescriptor {
                mode: config.captcha.mode,
                site_key: config.captcha.site_key.clone(),
                action: config.captcha.action.clone(),
            },
        }
    }
}

/// Builds the HTTP router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CONTACT_PATH, post(handle_submit))
        .route(SCHEMA_PATH, get(handle_schema))
        .route(CAPTCHA_CONFIG_PATH, get(handle_captcha_config))
        .with_state(state)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Handles one contact submission.
async fn handle_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    if bytes.len() > state.max_body_bytes {
        return transport_error(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large");
    }
    let Some(raw) = decode_body(&headers, &bytes) else {
        return transport_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type");
    };
    let result = submit_with_deadline(&state, &raw).await;
    no_store(StatusCode::OK, result.to_response())
}

/// Serves the validation schema table.
async fn handle_schema() -> Response {
    no_store(StatusCode::OK, CONTACT_SCHEMA)
}

/// Serves the public CAPTCHA settings.
async fn handle_captcha_config(State(state): State<Arc<AppState>>) -> Response {
    no_store(StatusCode::OK, state.captcha.clone())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs the pipeline under the overall deadline.
async fn submit_with_deadline(state: &AppState, raw: &RawSubmission) -> PipelineResult {
    if let Ok(result) = tokio::time::timeout(state.request_timeout, state.pipeline.submit(raw)).await
    {
        return result;
    }
    state.pipeline.audit().record(&SubmissionAuditEvent::new(SubmissionAuditEventParams {
        stage: PipelineStage::Deadline,
        outcome: "email_failed",
        captcha_strategy: None,
        invalid_fields: Vec::new(),
        detail: Some(format!("deadline of {} ms exceeded", state.request_timeout.as_millis())),
    }));
    PipelineResult::DispatchFailed
}

/// Decodes a request body by media type; `None` means unsupported.
fn decode_body(headers: &HeaderMap, bytes: &Bytes) -> Option<RawSubmission> {
    let media_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())?;
    match media_type.as_str() {
        "application/json" => {
            let value = serde_json::from_slice::<Value>(bytes).unwrap_or(Value::Null);
            Some(RawSubmission::from_json(value))
        }
        "application/x-www-form-urlencoded" => Some(RawSubmission::from_form_pairs(
            form_urlencoded::parse(bytes).map(|(key, value)| (key.into_owned(), value.into_owned())),
        )),
        _ => None,
    }
}

/// Builds a transport-level error response.
fn transport_error(status: StatusCode, code: &str) -> Response {
    no_store(
        status,
        ContactResponse {
            ok: false,
            error: Some(code.to_string()),
            issues: None,
        },
    )
}

/// Serializes a JSON response that must not be cached.
fn no_store(status: StatusCode, body: impl Serialize) -> Response {
    (status, [(CACHE_CONTROL, "no-store")], Json(body)).into_response()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
