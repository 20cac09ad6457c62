//!
//! Canonical message model for the tool-use chat protocol.
//!
//! Messages carry either a single opaque string or an ordered list of typed content
//! blocks. Serialization produces exactly the wire shapes the upstream messages API
//! accepts; deserialization runs the content normalizer, so a typed [`Message`] is
//! always canonical no matter how loosely shaped its JSON source was.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::protocol::coerce::{carrier_text, safe_stringify};
use crate::protocol::normalize::normalize_message_content;

/* --- types ----------------------------------------------------------------------------------- */

///
/// Conversation role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

///
/// A single typed unit of message content.
///
/// Image and document blocks are opaque: they keep the raw JSON object they were
/// parsed from, `type` key included, and are never content-validated.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /** plain text, never empty after trimming */
    Text {
        /** the text content */
        text: String,
    },
    /** assistant request to invoke a named tool */
    ToolUse {
        /** tool invocation identifier, never empty */
        id: String,
        /** tool name, never empty */
        name: String,
        /** tool input object, `{}` when the source carried none */
        input: Map<String, Value>,
    },
    /** outcome of a previously requested tool invocation */
    ToolResult {
        /** identifier of the originating tool_use block */
        tool_use_id: String,
        /** textual result, never empty */
        content: String,
        /** set only when the source flag was exactly `true` */
        is_error: bool,
    },
    /** pass-through image block */
    Image(Map<String, Value>),
    /** pass-through document block */
    Document(Map<String, Value>),
}

///
/// Content of a message: an opaque string or a non-empty list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    /** legacy/plain string content */
    Text(String),
    /** ordered content blocks */
    Blocks(Vec<ContentBlock>),
}

///
/// A role-tagged message of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /** who authored the message */
    pub role: Role,
    /** message content, normalized on deserialization */
    #[serde(default)]
    pub content: MessageContent,
}

/* --- start of code -------------------------------------------------------------------------- */

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a role name; only `user` and `assistant` are legal in this protocol.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContentBlock {
    /// Build a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Build a tool_use block with an empty input object.
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>) -> Self {
        ContentBlock::ToolUse { id: id.into(), name: name.into(), input: Map::new() }
    }

    /// Build a successful tool_result block.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Wire name of the block type.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::ToolUse { .. } => "tool_use",
            ContentBlock::ToolResult { .. } => "tool_result",
            ContentBlock::Image(_) => "image",
            ContentBlock::Document(_) => "document",
        }
    }

    ///
    /// Flatten the block to the string used when a whole message collapses to text.
    ///
    /// Text and tool_result blocks yield their text; opaque blocks yield a string
    /// `text` or `content` field; anything else yields its JSON serialization.
    pub(crate) fn flatten(&self) -> String {
        match self {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::ToolResult { content, .. } => content.clone(),
            ContentBlock::ToolUse { .. } => serde_json::to_string(self).unwrap_or_default(),
            ContentBlock::Image(raw) | ContentBlock::Document(raw) => {
                match (raw.get("text"), raw.get("content")) {
                    (Some(Value::String(text)), _) => text.clone(),
                    (_, Some(Value::String(content))) => content.clone(),
                    _ => safe_stringify(&Value::Object(raw.clone())),
                }
            }
        }
    }

    /// Human-readable text of the block, if it carries any.
    pub(crate) fn display_text(&self) -> Option<String> {
        let text = match self {
            ContentBlock::Text { text } => text.trim().to_string(),
            ContentBlock::ToolResult { content, .. } => content.trim().to_string(),
            ContentBlock::ToolUse { .. } => String::new(),
            ContentBlock::Image(raw) | ContentBlock::Document(raw) => {
                carrier_text(raw).unwrap_or_default()
            }
        };
        (!text.is_empty()).then_some(text)
    }
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentBlock::Text { text } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            ContentBlock::ToolUse { id, name, input } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("type", "tool_use")?;
                map.serialize_entry("id", id)?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("input", input)?;
                map.end()
            }
            ContentBlock::ToolResult { tool_use_id, content, is_error } => {
                let mut map = serializer.serialize_map(Some(if *is_error { 4 } else { 3 }))?;
                map.serialize_entry("type", "tool_result")?;
                map.serialize_entry("tool_use_id", tool_use_id)?;
                map.serialize_entry("content", content)?;
                if *is_error {
                    map.serialize_entry("is_error", &true)?;
                }
                map.end()
            }
            ContentBlock::Image(raw) | ContentBlock::Document(raw) => raw.serialize(serializer),
        }
    }
}

impl MessageContent {
    pub fn as_blocks(&self) -> Option<&[ContentBlock]> {
        match self {
            MessageContent::Blocks(blocks) => Some(blocks),
            MessageContent::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(_) => None,
        }
    }

    /// Whether the content carries nothing (empty string or no blocks).
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Blocks(blocks) => blocks.is_empty(),
        }
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<Vec<ContentBlock>> for MessageContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        MessageContent::Blocks(blocks)
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(normalize_message_content(&raw))
    }
}

impl Message {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/* --- tests ------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_omits_is_error_unless_set() {
        let ok = ContentBlock::tool_result("tool_1", "done");
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"type": "tool_result", "tool_use_id": "tool_1", "content": "done"})
        );

        let failed =
            ContentBlock::ToolResult { tool_use_id: "tool_1".into(), content: "boom".into(), is_error: true };
        assert_eq!(serde_json::to_value(&failed).unwrap()["is_error"], json!(true));
    }

    #[test]
    fn test_image_block_serializes_raw_object() {
        let raw = json!({"type": "image", "source": {"type": "base64", "data": "AAAA"}});
        let Value::Object(map) = raw.clone() else { unreachable!() };
        let block = ContentBlock::Image(map);
        assert_eq!(serde_json::to_value(&block).unwrap(), raw);
    }

    #[test]
    fn test_message_deserialization_normalizes_content() {
        let message: Message = serde_json::from_value(json!({
            "role": "user",
            "content": [{"tool_use_id": "t1", "text": " ok "}, "  hi  "]
        }))
        .unwrap();

        assert_eq!(message.role, Role::User);
        assert_eq!(
            message.content,
            MessageContent::Blocks(vec![ContentBlock::tool_result("t1", "ok"), ContentBlock::text("hi")])
        );
    }

    #[test]
    fn test_message_rejects_unknown_role() {
        let result: Result<Message, _> =
            serde_json::from_value(json!({"role": "system", "content": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_string_content_serializes_as_plain_string() {
        let message = Message::assistant("hello");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "assistant", "content": "hello"})
        );
    }

    #[test]
    fn test_tool_use_flattens_to_json() {
        let block = ContentBlock::tool_use("tool_9", "create_nodes");
        assert_eq!(
            block.flatten(),
            r#"{"type":"tool_use","id":"tool_9","name":"create_nodes","input":{}}"#
        );
    }
}
