//! # Transcript Guard - Tool-Use Transcript Sanitizer Library
//!
//! Normalizes loosely-typed chat transcripts into canonical content blocks and enforces
//! the tool-use causality invariant before a transcript is sent upstream: every
//! `tool_result` in a user turn must answer a `tool_use` from the assistant turn
//! immediately before it. Orphaned results are dropped and counted.
//!
//! ## Library Usage
//!
//! ```rust
//! use serde_json::json;
//! use transcript_guard::protocol::{Message, sanitize_message_sequence};
//!
//! let messages: Vec<Message> = serde_json::from_value(json!([
//!     {"role": "assistant", "content": [{"type": "tool_use", "id": "t1", "name": "move"}]},
//!     {"role": "user", "content": [
//!         {"type": "tool_result", "tool_use_id": "t1", "content": "ok"},
//!         {"type": "tool_result", "tool_use_id": "t9", "content": "stale"}
//!     ]}
//! ]))
//! .unwrap();
//!
//! let outcome = sanitize_message_sequence(&messages);
//! assert_eq!(outcome.dropped_tool_results, 1);
//! ```
//!
//! ## Server Usage
//!
//! ```rust,no_run
//! use transcript_guard::{Config, create_app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//!     axum::serve(listener, create_app(config)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Coercion, block normalization and sequence sanitization
//! - [`contract`] - Agent chat request contract
//! - [`config`] - Layered configuration
//! - [`server`] - HTTP route handlers
//! - [`error`] - Error types and handling

pub mod config;
pub mod contract;
pub mod error;
pub mod protocol;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use contract::{AgentRequest, ContractError, ContractIssue};
pub use error::GuardError;
pub use protocol::{
    ContentBlock, Message, MessageContent, Role, SanitizedTranscript, sanitize_message_sequence,
};

/// Creates the Transcript Guard HTTP application with the given configuration.
///
/// Sets up the sanitizer routes, the request body limit, CORS and HTTP tracing.
///
/// # Arguments
///
/// * `config` - Application configuration
///
/// # Returns
///
/// Returns an Axum Router that can be served directly.
pub fn create_app(config: Config) -> axum::Router {
    use axum::Router;
    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, post};
    use std::sync::Arc;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    let body_limit = config.server.max_body_bytes;
    let app_state = Arc::new(server::AppState::new(config));

    Router::new()
        .route("/v1/messages/sanitize", post(server::sanitize_messages))
        .route("/v1/agent/prepare", post(server::prepare_agent_request))
        .route("/health", get(server::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
