//!
//! Tool-use message protocol: normalization and causality sanitization.
//!
//! Layers, leaves first:
//! - `coerce.rs` - total coercions from untyped JSON to primitives
//! - `types.rs` - canonical message model and its wire serialization
//! - `normalize.rs` - raw content items to canonical blocks
//! - `sanitize.rs` - transcript-level tool_result causality enforcement
//!
//! Everything in this module is pure and synchronous, and holds no state between calls.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- modules --------------------------------------------------------------------------------- */

pub mod coerce;
pub mod normalize;
pub mod sanitize;
pub mod types;

/* --- start of code -------------------------------------------------------------------------- */

pub use normalize::{EMPTY_TOOL_RESULT, normalize_message_content, parse_block};
pub use sanitize::{SanitizedTranscript, extract_plain_text, sanitize_message_sequence, tool_use_ids};
pub use types::{ContentBlock, Message, MessageContent, Role};
