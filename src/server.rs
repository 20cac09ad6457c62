//!
//! HTTP server implementation for Transcript Guard.
//!
//! Exposes the transcript sanitizer over HTTP: raw message lists are normalized and
//! stripped of orphaned tool results, and agent chat requests are validated against
//! their contract before their transcript is sanitized.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::config::Config;
use crate::contract::AgentRequest;
use crate::error::{GuardError, Result};
use crate::protocol::{Message, SanitizedTranscript, sanitize_message_sequence};

/* --- types ----------------------------------------------------------------------------------- */

///
/// Application state shared by all handlers.
pub struct AppState {
    /** application configuration */
    pub config: Config,
    /** metrics for monitoring */
    pub metrics: AppMetrics,
}

///
/// Application metrics for monitoring and observability.
#[derive(Debug, Default)]
pub struct AppMetrics {
    /** total number of requests processed */
    pub total_requests: AtomicU64,
    /** requests rejected as malformed or violating the request contract */
    pub rejected_requests: AtomicU64,
    /** transcripts that went through the sanitizer */
    pub sanitized_transcripts: AtomicU64,
    /** tool_result blocks dropped across all transcripts */
    pub dropped_tool_results: AtomicU64,
}

/* --- start of code -------------------------------------------------------------------------- */

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config, metrics: AppMetrics::default() }
    }

    ///
    /// Account for one sanitizer run and report its drop count.
    ///
    /// Non-zero counts are logged at warn or debug level depending on
    /// `sanitizer.warn_on_drop`.
    fn record_sanitized(&self, route: &str, dropped: usize) {
        self.metrics.sanitized_transcripts.fetch_add(1, Ordering::Relaxed);
        if dropped == 0 {
            return;
        }

        self.metrics.dropped_tool_results.fetch_add(dropped as u64, Ordering::Relaxed);
        if self.config.sanitizer.warn_on_drop {
            tracing::warn!(route, dropped, "Dropped orphaned tool_result blocks");
        } else {
            tracing::debug!(route, dropped, "Dropped orphaned tool_result blocks");
        }
    }
}

///
/// Extract a transcript from a JSON document.
///
/// Accepts either a bare array of messages or an object with a `messages` array.
/// Message content is normalized while deserializing.
///
/// # Arguments
///  * `document` - parsed JSON document
///
/// # Returns
///  * Normalized messages
///  * `GuardError::Serialization` if a message is not a valid chat message
///  * `GuardError::Config` if the document has no message list
pub fn parse_transcript(document: Value) -> Result<Vec<Message>> {
    let list = match document {
        Value::Array(_) => document,
        Value::Object(mut map) => match map.remove("messages") {
            Some(list @ Value::Array(_)) => list,
            _ => {
                return Err(GuardError::Config(
                    "Expected a \"messages\" array in the request body".to_string(),
                ));
            }
        },
        _ => {
            return Err(GuardError::Config(
                "Expected an array of messages or an object with \"messages\"".to_string(),
            ));
        }
    };

    Ok(serde_json::from_value(list)?)
}

///
/// Handle the transcript sanitize endpoint.
///
/// # Arguments
///  * `state` - shared application state
///  * `body` - `{ "messages": [...] }`
///
/// # Returns
///  * Sanitized transcript with the drop count, or a JSON error
pub async fn sanitize_messages(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

    match parse_transcript(body) {
        Ok(messages) => {
            tracing::debug!("Sanitizing transcript of {} message(s)", messages.len());
            let outcome: SanitizedTranscript = sanitize_message_sequence(&messages);
            state.record_sanitized("sanitize", outcome.dropped_tool_results);
            Json(outcome).into_response()
        }
        Err(e) => {
            state.metrics.rejected_requests.fetch_add(1, Ordering::Relaxed);
            create_error_response(&e)
        }
    }
}

///
/// Handle the agent request preparation endpoint.
///
/// Validates the raw body against the agent request contract, then sanitizes its
/// transcript.
///
/// # Arguments
///  * `state` - shared application state
///  * `body` - raw agent chat request
///
/// # Returns
///  * `{ "request": ..., "dropped_tool_results": n }`, or a 400 listing every issue
pub async fn prepare_agent_request(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

    let request = match AgentRequest::from_value(&body) {
        Ok(request) => request,
        Err(e) => {
            state.metrics.rejected_requests.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Rejected agent request with {} issue(s)", e.issues.len());
            return create_error_response(&GuardError::Contract(e));
        }
    };

    tracing::debug!(
        map_id = %request.map_id,
        messages = request.messages.len(),
        tools = request.tools.len(),
        "Preparing agent request"
    );

    let (request, dropped) = request.sanitized();
    state.record_sanitized("prepare", dropped);

    Json(json!({
      "request": request,
      "dropped_tool_results": dropped
    }))
    .into_response()
}

///
/// Handle health check endpoint.
///
/// # Arguments
///  * `state` - shared application state with metrics
///
/// # Returns
///  * JSON response with health status and metrics
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let metrics = &state.metrics;

    Json(json!({
      "status": "ok",
      "version": env!("CARGO_PKG_VERSION"),
      "timestamp": chrono::Utc::now().to_rfc3339(),
      "metrics": {
        "total_requests": metrics.total_requests.load(Ordering::Relaxed),
        "rejected_requests": metrics.rejected_requests.load(Ordering::Relaxed),
        "sanitized_transcripts": metrics.sanitized_transcripts.load(Ordering::Relaxed),
        "dropped_tool_results": metrics.dropped_tool_results.load(Ordering::Relaxed)
      }
    }))
}

///
/// Create standardized error response.
///
/// # Arguments
///  * `error` - error to convert to HTTP response
///
/// # Returns
///  * HTTP error response with JSON error details
fn create_error_response(error: &GuardError) -> Response {
    let (status_code, error_type) = match error {
        GuardError::Contract(_) | GuardError::Serialization(_) | GuardError::Config(_) => {
            (StatusCode::BAD_REQUEST, "invalid_request_error")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    let mut error_body = json!({
      "message": error.to_string(),
      "type": error_type,
      "code": status_code.as_u16()
    });
    if let GuardError::Contract(contract) = error {
        error_body["issues"] = json!(contract.issues);
    }

    (status_code, Json(json!({ "error": error_body }))).into_response()
}

/* --- tests ----------------------------------------------------------------------------------- */
