//!
//! Content normalizer for loosely shaped message payloads.
//!
//! Converts arbitrary JSON content items (strings, objects, vendor-specific shapes)
//! into canonical [`ContentBlock`]s in one explicit parse step. A block that cannot be
//! salvaged is dropped (`None`); nothing here fails.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use serde_json::{Map, Value};

use crate::protocol::coerce::{coerce_field, coerce_string};
use crate::protocol::types::{ContentBlock, MessageContent};

/* --- constants ------------------------------------------------------------------------------ */

/** Placeholder content for a tool_result that carried no extractable text */
pub const EMPTY_TOOL_RESULT: &str = r#"{"success":false,"error":"tool_result_empty"}"#;

/* --- start of code -------------------------------------------------------------------------- */

///
/// Parse one raw content item into a canonical block.
///
/// Strings become text blocks, non-object values are coerced to text, and objects
/// are dispatched on their `type` (inferred as `tool_result` when only a
/// `tool_use_id` is present, `text` otherwise).
///
/// # Arguments
///  * `raw` - content item of unknown shape
///
/// # Returns
///  * `Some(ContentBlock)` for a salvageable item
///  * `None` when the item must be dropped
pub fn parse_block(raw: &Value) -> Option<ContentBlock> {
    let map = match raw {
        Value::String(s) => return text_block(s.trim().to_string()),
        Value::Object(map) => map,
        other => return text_block(coerce_string(other)),
    };

    let block = match block_type(map) {
        "text" => text_block(
            first_present(map, &["text", "content"]).map(coerce_string).unwrap_or_default(),
        ),
        "tool_result" => parse_tool_result(map),
        "tool_use" => parse_tool_use(map),
        "image" => Some(ContentBlock::Image(map.clone())),
        "document" => Some(ContentBlock::Document(map.clone())),
        _ => text_block(coerce_string(raw)),
    };

    if block.is_none() {
        tracing::trace!("Dropping unsalvageable '{}' content block", block_type(map));
    }
    block
}

///
/// Normalize the content of one message into canonical form.
///
/// Arrays are parsed block by block and single objects are parsed as one block.
/// Whenever no block survives, or the content is neither, the content degrades to
/// its coerced string. The result is never an empty block list.
///
/// # Arguments
///  * `raw` - message content of unknown shape
///
/// # Returns
///  * Non-empty block list, or plain (possibly empty) string content
pub fn normalize_message_content(raw: &Value) -> MessageContent {
    match raw {
        Value::Array(items) => {
            let blocks: Vec<ContentBlock> = items.iter().filter_map(parse_block).collect();
            if !blocks.is_empty() {
                return MessageContent::Blocks(blocks);
            }
        }
        Value::Object(_) => {
            if let Some(block) = parse_block(raw) {
                return MessageContent::Blocks(vec![block]);
            }
        }
        _ => {}
    }

    MessageContent::Text(coerce_string(raw))
}

/// Resolve the block type, inferring it when the `type` key is missing or not a string.
fn block_type(map: &Map<String, Value>) -> &str {
    match (map.get("type"), map.get("tool_use_id")) {
        (Some(Value::String(kind)), _) => kind.as_str(),
        (_, Some(Value::String(_))) => "tool_result",
        _ => "text",
    }
}

/// Text blocks are dropped when empty.
fn text_block(text: String) -> Option<ContentBlock> {
    (!text.is_empty()).then_some(ContentBlock::Text { text })
}

fn parse_tool_result(map: &Map<String, Value>) -> Option<ContentBlock> {
    let tool_use_id = first_non_empty_string(map, &["tool_use_id", "id"])?;

    let content = first_present(map, &["content", "text"]).map(coerce_string).unwrap_or_default();
    let content = if content.is_empty() { EMPTY_TOOL_RESULT.to_string() } else { content };

    Some(ContentBlock::ToolResult {
        tool_use_id,
        content,
        is_error: matches!(map.get("is_error"), Some(Value::Bool(true))),
    })
}

fn parse_tool_use(map: &Map<String, Value>) -> Option<ContentBlock> {
    let id = coerce_field(map, "id");
    let name = coerce_field(map, "name");
    if id.is_empty() || name.is_empty() {
        return None;
    }

    let input = match map.get("input") {
        Some(Value::Object(input)) => input.clone(),
        _ => Map::new(),
    };

    Some(ContentBlock::ToolUse { id, name, input })
}

/// First key whose value is present and not `null`.
fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|key| map.get(*key)).find(|value| !value.is_null())
}

/// First key whose value is a non-empty string.
fn first_non_empty_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })
}

/* --- tests ------------------------------------------------------------------------------- */
