//!
//! Sequence sanitizer enforcing tool_result causality over a transcript.
//!
//! A `tool_result` block is valid in message N only when the previous *sanitized*
//! message is from the assistant and carries a `tool_use` block with the same id.
//! Violating blocks are dropped and counted; a message left with no blocks collapses
//! into its salvageable text, or is omitted when there is none.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::collections::HashSet;

use serde::Serialize;

use crate::protocol::types::{ContentBlock, Message, MessageContent, Role};

/* --- types ----------------------------------------------------------------------------------- */

///
/// Outcome of sanitizing one transcript.
///
/// The drop count is an observability signal for the caller, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SanitizedTranscript {
    /** transcript safe to submit upstream */
    pub messages: Vec<Message>,
    /** number of tool_result blocks removed for breaking causality */
    pub dropped_tool_results: usize,
}

/* --- start of code -------------------------------------------------------------------------- */

impl SanitizedTranscript {
    /// Whether the input already satisfied the causality invariant.
    pub fn is_clean(&self) -> bool {
        self.dropped_tool_results == 0
    }
}

///
/// Collect the `tool_use` ids present in one message's content.
///
/// # Arguments
///  * `content` - normalized message content
///
/// # Returns
///  * Set of tool_use ids; empty for plain string content
pub fn tool_use_ids(content: &MessageContent) -> HashSet<&str> {
    content
        .as_blocks()
        .unwrap_or_default()
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect()
}

///
/// Sanitize a transcript immediately before dispatching it upstream.
///
/// Walks the messages in order, threading the sanitized output as the only state:
/// the allow-list for a user message is the tool_use id set of the last message
/// already emitted, and only when that message is from the assistant. Plain string
/// messages pass through untouched.
///
/// # Arguments
///  * `messages` - normalized transcript, in conversation order
///
/// # Returns
///  * Sanitized transcript and the number of dropped tool_result blocks
pub fn sanitize_message_sequence(messages: &[Message]) -> SanitizedTranscript {
    let sanitized = messages.iter().fold(SanitizedTranscript::default(), |mut acc, message| {
        let MessageContent::Blocks(blocks) = &message.content else {
            acc.messages.push(message.clone());
            return acc;
        };

        let mut dropped = 0;
        let kept: Vec<ContentBlock> = {
            let allowed = match acc.messages.last() {
                Some(previous) if message.role == Role::User && previous.role == Role::Assistant => {
                    tool_use_ids(&previous.content)
                }
                _ => HashSet::new(),
            };

            blocks
                .iter()
                .filter(|block| match block {
                    ContentBlock::ToolResult { tool_use_id, .. } => {
                        let valid =
                            !tool_use_id.is_empty() && allowed.contains(tool_use_id.as_str());
                        if !valid {
                            tracing::trace!(
                                "Dropping orphan tool_result '{}' in {} message",
                                tool_use_id,
                                message.role
                            );
                            dropped += 1;
                        }
                        valid
                    }
                    _ => true,
                })
                .cloned()
                .collect()
        };
        acc.dropped_tool_results += dropped;

        if !kept.is_empty() {
            acc.messages.push(Message::new(message.role, kept));
            return acc;
        }

        let fallback = flatten_blocks(blocks);
        if fallback.is_empty() {
            tracing::debug!("Omitting {} message with no salvageable content", message.role);
        } else {
            acc.messages.push(Message::new(message.role, fallback));
        }
        acc
    });

    if !sanitized.is_clean() {
        tracing::debug!(
            "Sanitized transcript: {} -> {} message(s), dropped {} tool_result block(s)",
            messages.len(),
            sanitized.messages.len(),
            sanitized.dropped_tool_results
        );
    }

    sanitized
}

///
/// Flatten any message content into a single display string.
///
/// String content is returned as-is; block content yields each block's text (or
/// result content), joined with single spaces. Tool invocations contribute nothing.
///
/// # Arguments
///  * `content` - canonical message content
///
/// # Returns
///  * Display text, possibly empty
pub fn extract_plain_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(ContentBlock::display_text)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string(),
    }
}

/// Collapse the original blocks of a message into its salvageable text.
fn flatten_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(ContentBlock::flatten)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/* --- tests ------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant_calling(ids: &[&str]) -> Message {
        Message::assistant(
            ids.iter().map(|id| ContentBlock::tool_use(*id, "create_nodes")).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_tool_use_ids_ignores_other_blocks() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::text("thinking out loud"),
            ContentBlock::tool_use("a", "create_nodes"),
            ContentBlock::tool_result("b", "x"),
            ContentBlock::tool_use("c", "delete_nodes"),
        ]);
        assert_eq!(tool_use_ids(&content), HashSet::from(["a", "c"]));
        assert!(tool_use_ids(&MessageContent::Text("a".into())).is_empty());
    }

    #[test]
    fn test_partial_match_keeps_only_known_results() {
        let messages = vec![
            assistant_calling(&["a"]),
            Message::user(vec![ContentBlock::tool_result("a", "ok"), ContentBlock::tool_result("z", "stale")]),
        ];

        let result = sanitize_message_sequence(&messages);
        assert_eq!(result.dropped_tool_results, 1);
        assert_eq!(result.messages[1].content, MessageContent::Blocks(vec![ContentBlock::tool_result("a", "ok")]));
    }

    #[test]
    fn test_assistant_cannot_carry_tool_results() {
        let messages = vec![Message::assistant(vec![
            ContentBlock::tool_use("a", "create_nodes"),
            ContentBlock::tool_result("a", "self-answered"),
        ])];

        let result = sanitize_message_sequence(&messages);
        assert_eq!(result.dropped_tool_results, 1);
        assert_eq!(result.messages[0].content, MessageContent::Blocks(vec![ContentBlock::tool_use("a", "create_nodes")]));
    }

    #[test]
    fn test_results_must_follow_immediately() {
        let messages = vec![
            assistant_calling(&["a"]),
            Message::user("interjection"),
            Message::user(vec![ContentBlock::tool_result("a", "late")]),
        ];

        let result = sanitize_message_sequence(&messages);
        assert_eq!(result.dropped_tool_results, 1);
        assert_eq!(result.messages[2].content, MessageContent::Text("late".into()));
    }

    #[test]
    fn test_omitted_message_does_not_reopen_window() {
        let messages = vec![
            assistant_calling(&["a"]),
            Message::user(vec![ContentBlock::tool_result("a", "ok")]),
            Message::assistant(MessageContent::Blocks(Vec::new())),
            Message::user(vec![ContentBlock::tool_result("a", "again")]),
        ];

        let result = sanitize_message_sequence(&messages);
        assert_eq!(result.messages.len(), 3);
        assert_eq!(result.dropped_tool_results, 1);
        assert_eq!(result.messages[2], Message::user("again"));
    }

    #[test]
    fn test_extract_plain_text() {
        let content = MessageContent::Blocks(vec![
            ContentBlock::text("hello"),
            ContentBlock::tool_use("a", "create_nodes"),
            ContentBlock::tool_result("a", "{\"success\":true}"),
        ]);
        assert_eq!(extract_plain_text(&content), "hello {\"success\":true}");
        assert_eq!(extract_plain_text(&MessageContent::Text(" raw ".into())), " raw ");
    }
}
