//! Content blocks carried inside messages.
//!
//! Blocks are discriminated by their `type` tag. Two closed unions exist:
//! [`MessageContent`] is what a message's `content` array may hold, and
//! [`ContentBlock`] additionally admits tool results for generic content
//! streams. Unknown tags and unknown fields are decode errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextBlock {
    pub text: String,
}

/// Visible reasoning with its opaque signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThinkingBlock {
    pub thinking: String,
    pub signature: String,
}

/// A request to run a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

/// The outcome of a tool run, correlated by `tool_use_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolResultBlock {
    pub content: String,
    pub is_error: bool,
    pub tool_use_id: String,
}

/// A block allowed in a message's `content` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text(TextBlock),
    Thinking(ThinkingBlock),
    ToolUse(ToolUseBlock),
}

impl MessageContent {
    /// Returns the tool invocation if this block is one.
    pub const fn as_tool_use(&self) -> Option<&ToolUseBlock> {
        match self {
            Self::ToolUse(block) => Some(block),
            Self::Text(_) | Self::Thinking(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(block) => Some(&block.text),
            Self::Thinking(_) | Self::ToolUse(_) => None,
        }
    }
}

/// Any content block, including tool results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text(TextBlock),
    Thinking(ThinkingBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    /// The wire tag for this block.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Thinking(_) => "thinking",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResult(_) => "tool_result",
        }
    }
}

impl From<MessageContent> for ContentBlock {
    fn from(content: MessageContent) -> Self {
        match content {
            MessageContent::Text(block) => Self::Text(block),
            MessageContent::Thinking(block) => Self::Thinking(block),
            MessageContent::ToolUse(block) => Self::ToolUse(block),
        }
    }
}

/// Decodes one content block from a JSON value.
pub fn decode_block(value: Value) -> Result<ContentBlock, DecodeError> {
    Ok(serde_json::from_value(value)?)
}

/// Decodes a generic content stream, failing on the first bad block.
pub fn decode_blocks(value: Value) -> Result<Vec<ContentBlock>, DecodeError> {
    Ok(serde_json::from_value(value)?)
}
