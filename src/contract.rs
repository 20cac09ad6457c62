//!
//! Agent chat request contract.
//!
//! Coerces a raw JSON request body into a typed [`AgentRequest`] before the
//! transcript reaches the sanitizer. Loose inputs are coerced (numeric strings,
//! `"true"`/`"false"`, scalar names), values that coerce to nothing take their
//! defaults, and every remaining violation is collected as a [`ContractIssue`].
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::coerce::{coerce_boolean, coerce_field, coerce_number};
use crate::protocol::{Message, Role, normalize_message_content, sanitize_message_sequence};

/* --- types ----------------------------------------------------------------------------------- */

///
/// Validated agent chat request.
///
/// Field names on the wire follow the client payload (`systemPrompt`, `maxTokens`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRequest {
    /** mind map the conversation operates on */
    pub map_id: Uuid,
    /** agent persona selector */
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /** upstream model override */
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /** agent mode, `agent` unless specified */
    pub mode: String,
    /** system prompt, never empty */
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
    /** normalized transcript, at least one message */
    pub messages: Vec<Message>,
    /** tool definitions offered to the model */
    pub tools: Vec<ToolDefinition>,
    /** completion budget in tokens */
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
    /** sampling temperature */
    pub temperature: f64,
    pub force_tool_use: bool,
    pub require_action: bool,
    pub require_mutating_action: bool,
    pub disable_parallel_tool_use: bool,
}

///
/// Tool definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /** tool name, never empty */
    pub name: String,
    /** tool description, never empty */
    pub description: String,
    /** JSON schema of the tool input, `{}` when missing */
    pub input_schema: Map<String, Value>,
}

///
/// One contract violation, located by a dotted/indexed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractIssue {
    pub path: String,
    pub message: String,
}

///
/// Rejected agent request with every violation found.
#[derive(Debug, Clone, Error)]
#[error("Invalid agent request: {}", join_issues(.issues))]
pub struct ContractError {
    pub issues: Vec<ContractIssue>,
}

/* --- constants ------------------------------------------------------------------------------ */

/** Mode used when the request does not name one */
pub const DEFAULT_MODE: &str = "agent";

/** Default completion budget */
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/** Default sampling temperature */
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/** Accepted completion budget range */
const MAX_TOKENS_RANGE: std::ops::RangeInclusive<f64> = 256.0..=8192.0;

/** Accepted temperature range */
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;

/* --- start of code -------------------------------------------------------------------------- */

impl AgentRequest {
    ///
    /// Coerce and validate a raw request body.
    ///
    /// # Arguments
    ///  * `raw` - request body as parsed JSON
    ///
    /// # Returns
    ///  * Validated request
    ///  * `ContractError` listing every violation
    pub fn from_value(raw: &Value) -> Result<Self, ContractError> {
        let Some(body) = raw.as_object() else {
            return Err(ContractError::single("", "Expected a JSON object"));
        };

        let mut issues = Issues::default();

        let map_id_raw = coerce_field(body, "map_id");
        let map_id = Uuid::try_parse(&map_id_raw).ok();
        if map_id.is_none() {
            issues.push("map_id", "Invalid map ID");
        }

        let system_prompt = coerce_field(body, "systemPrompt");
        if system_prompt.is_empty() {
            issues.push("systemPrompt", "systemPrompt is required");
        }

        let messages = parse_messages(body.get("messages"), &mut issues);
        let tools = parse_tools(body.get("tools"), &mut issues);

        let max_tokens = match body.get("maxTokens").and_then(coerce_number) {
            None => DEFAULT_MAX_TOKENS,
            Some(n) if n.fract() != 0.0 => {
                issues.push("maxTokens", "Expected an integer");
                DEFAULT_MAX_TOKENS
            }
            Some(n) if !MAX_TOKENS_RANGE.contains(&n) => {
                issues.push("maxTokens", "maxTokens must be between 256 and 8192");
                DEFAULT_MAX_TOKENS
            }
            Some(n) => n as u32,
        };

        let temperature = match body.get("temperature").and_then(coerce_number) {
            None => DEFAULT_TEMPERATURE,
            Some(t) if !TEMPERATURE_RANGE.contains(&t) => {
                issues.push("temperature", "temperature must be between 0 and 1");
                DEFAULT_TEMPERATURE
            }
            Some(t) => t,
        };

        match (map_id, issues.into_error()) {
            (Some(map_id), None) => Ok(Self {
                map_id,
                agent_type: optional_string(body, "agent_type"),
                model: optional_string(body, "model"),
                mode: optional_string(body, "mode").unwrap_or_else(|| DEFAULT_MODE.to_string()),
                system_prompt,
                messages,
                tools,
                max_tokens,
                temperature,
                force_tool_use: flag(body, "force_tool_use", false),
                require_action: flag(body, "require_action", false),
                require_mutating_action: flag(body, "require_mutating_action", false),
                disable_parallel_tool_use: flag(body, "disable_parallel_tool_use", true),
            }),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ContractError::single("map_id", "Invalid map ID")),
        }
    }

    ///
    /// Run the sequence sanitizer over the request transcript.
    ///
    /// # Returns
    ///  * The request with a causally consistent transcript
    ///  * Number of dropped tool_result blocks
    pub fn sanitized(mut self) -> (Self, usize) {
        let outcome = sanitize_message_sequence(&self.messages);
        self.messages = outcome.messages;
        (self, outcome.dropped_tool_results)
    }
}

impl ContractError {
    fn single(path: &str, message: &str) -> Self {
        Self { issues: vec![ContractIssue { path: path.to_string(), message: message.to_string() }] }
    }
}

impl fmt::Display for ContractIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Issue accumulator.
#[derive(Default)]
struct Issues(Vec<ContractIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ContractIssue { path: path.into(), message: message.into() });
    }

    fn into_error(self) -> Option<ContractError> {
        (!self.0.is_empty()).then_some(ContractError { issues: self.0 })
    }
}

fn join_issues(issues: &[ContractIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Non-array values are treated as an empty list.
fn as_list(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn parse_messages(value: Option<&Value>, issues: &mut Issues) -> Vec<Message> {
    let items = as_list(value);
    if items.is_empty() {
        issues.push("messages", "At least one message is required");
    }

    let mut messages = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(raw) = item.as_object() else {
            issues.push(format!("messages[{}]", index), "Expected an object");
            continue;
        };

        let role = raw.get("role").and_then(Value::as_str).and_then(Role::parse);
        if role.is_none() {
            issues.push(format!("messages[{}].role", index), "Expected 'user' or 'assistant'");
        }

        let content = normalize_message_content(raw.get("content").unwrap_or(&Value::Null));
        if content.is_empty() {
            issues.push(format!("messages[{}].content", index), "Message content cannot be empty");
            continue;
        }

        if let Some(role) = role {
            messages.push(Message::new(role, content));
        }
    }
    messages
}

fn parse_tools(value: Option<&Value>, issues: &mut Issues) -> Vec<ToolDefinition> {
    let empty = Map::new();
    as_list(value)
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let raw = item.as_object().unwrap_or(&empty);
            let name = coerce_field(raw, "name");
            let description = coerce_field(raw, "description");
            if name.is_empty() {
                issues.push(format!("tools[{}].name", index), "Tool name required");
            }
            if description.is_empty() {
                issues.push(format!("tools[{}].description", index), "Tool description required");
            }
            let input_schema = match raw.get("input_schema") {
                Some(Value::Object(schema)) => schema.clone(),
                _ => Map::new(),
            };
            (!name.is_empty() && !description.is_empty())
                .then_some(ToolDefinition { name, description, input_schema })
        })
        .collect()
}

/// Coerced string, absent when empty.
fn optional_string(body: &Map<String, Value>, key: &str) -> Option<String> {
    let value = coerce_field(body, key);
    (!value.is_empty()).then_some(value)
}

fn flag(body: &Map<String, Value>, key: &str, default: bool) -> bool {
    body.get(key).and_then(coerce_boolean).unwrap_or(default)
}

/* --- tests ------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAP_ID: &str = "0b5e7d1e-4c4f-4a55-9a57-2d8f0c1e9b11";

    fn minimal_body() -> Value {
        json!({
            "map_id": MAP_ID,
            "systemPrompt": "You edit mind maps.",
            "messages": [{"role": "user", "content": "add a node"}]
        })
    }

    #[test]
    fn test_minimal_request_takes_defaults() {
        let request = AgentRequest::from_value(&minimal_body()).expect("valid request");

        assert_eq!(request.map_id.to_string(), MAP_ID);
        assert_eq!(request.mode, DEFAULT_MODE);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert!(request.tools.is_empty());
        assert!(!request.force_tool_use);
        assert!(request.disable_parallel_tool_use);
        assert_eq!(request.agent_type, None);
    }

    #[test]
    fn test_loose_scalars_are_coerced() {
        let mut body = minimal_body();
        body["maxTokens"] = json!("1024");
        body["temperature"] = json!(" 0.2 ");
        body["force_tool_use"] = json!("TRUE");
        body["disable_parallel_tool_use"] = json!("false");
        body["mode"] = json!("   ");
        body["agent_type"] = json!("planner");

        let request = AgentRequest::from_value(&body).expect("valid request");
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.temperature, 0.2);
        assert!(request.force_tool_use);
        assert!(!request.disable_parallel_tool_use);
        assert_eq!(request.mode, DEFAULT_MODE);
        assert_eq!(request.agent_type.as_deref(), Some("planner"));
    }

    #[test]
    fn test_uncoercible_values_fall_back_to_defaults() {
        let mut body = minimal_body();
        body["maxTokens"] = json!("lots");
        body["require_action"] = json!("maybe");

        let request = AgentRequest::from_value(&body).expect("valid request");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(!request.require_action);
    }

    #[test]
    fn test_collects_every_issue() {
        let body = json!({
            "map_id": "not-a-uuid",
            "messages": "nope",
            "maxTokens": 100,
            "temperature": 3,
            "tools": [{"name": "create_nodes"}]
        });

        let error = AgentRequest::from_value(&body).unwrap_err();
        let paths: Vec<&str> = error.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["map_id", "systemPrompt", "messages", "tools[0].description", "maxTokens", "temperature"]
        );
        assert!(error.to_string().contains("Invalid map ID"));
    }

    #[test]
    fn test_rejects_bad_roles_and_empty_content() {
        let mut body = minimal_body();
        body["messages"] = json!([
            {"role": "system", "content": "x"},
            {"role": "user", "content": [{"type": "tool_use", "id": "a"}]},
            {"role": "assistant", "content": null}
        ]);

        let error = AgentRequest::from_value(&body).unwrap_err();
        let paths: Vec<&str> = error.issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["messages[0].role", "messages[2].content"]);
    }

    #[test]
    fn test_non_object_body() {
        let error = AgentRequest::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(error.issues.len(), 1);
    }

    #[test]
    fn test_tool_input_schema_defaults_to_empty_object() {
        let mut body = minimal_body();
        body["tools"] = json!([{"name": "create_nodes", "description": "Create nodes", "input_schema": "bad"}]);

        let request = AgentRequest::from_value(&body).expect("valid request");
        assert_eq!(request.tools[0].input_schema, Map::new());
    }

    #[test]
    fn test_sanitized_drops_orphans() {
        let mut body = minimal_body();
        body["messages"] = json!([
            {"role": "user", "content": [
                {"type": "tool_result", "tool_use_id": "ghost", "content": "{}"},
                {"type": "text", "text": "continue"}
            ]}
        ]);

        let (request, dropped) = AgentRequest::from_value(&body).expect("valid request").sanitized();
        assert_eq!(dropped, 1);
        assert_eq!(
            serde_json::to_value(&request.messages).unwrap(),
            json!([{"role": "user", "content": [{"type": "text", "text": "continue"}]}])
        );
    }
}
