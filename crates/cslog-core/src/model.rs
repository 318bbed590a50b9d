//! Message records: one validated line of a session log.
//!
//! The schema is closed. Unknown fields anywhere in a record, unknown enum
//! values, and non-positive `costUSD`/`durationMs` values make the whole line
//! invalid. Records are plain values; nothing in this crate mutates one after
//! it has been decoded.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::content::{MessageContent, ToolUseBlock};
use crate::error::DecodeError;
use crate::types::{CostUsd, DurationMs, MessageType, Role, StopReason, UserType};

fn default_service_tier() -> String {
    "standard".to_string()
}

/// Token counters reported for an assistant turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenUsage {
    pub input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default = "default_service_tier")]
    pub service_tier: String,
}

impl TokenUsage {
    /// All input tokens, cached or not, plus output tokens.
    pub const fn total_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.cache_creation_input_tokens)
            .saturating_add(self.cache_read_input_tokens)
            .saturating_add(self.output_tokens)
    }
}

/// Structured outcome of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub interrupted: bool,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// `toolUseResult`: either free text or a structured result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolUseResult {
    Text(String),
    Structured(ToolResult),
}

impl ToolUseResult {
    pub fn tool_use_id(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Structured(result) => Some(&result.tool_use_id),
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Structured(result) => result.is_error,
        }
    }
}

/// The message embedded in a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One line of a session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRecord {
    #[serde(rename = "parentUuid", default)]
    pub parent_uuid: Option<Uuid>,
    #[serde(rename = "isSidechain")]
    pub is_sidechain: bool,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    pub cwd: PathBuf,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub version: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub message: Message,
    pub uuid: Uuid,
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "costUSD", default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<CostUsd>,
    #[serde(rename = "durationMs", default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<DurationMs>,
    #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "toolUseResult", default, skip_serializing_if = "Option::is_none")]
    pub tool_use_result: Option<ToolUseResult>,
    #[serde(rename = "isMeta", default, skip_serializing_if = "Option::is_none")]
    pub is_meta: Option<bool>,
}

impl MessageRecord {
    pub const fn role(&self) -> Role {
        self.message.role
    }

    /// Cost in USD, zero when absent.
    pub fn cost(&self) -> f64 {
        self.cost_usd.map_or(0.0, CostUsd::value)
    }

    /// Text blocks joined by newlines; other blocks are omitted.
    pub fn text(&self) -> String {
        self.message
            .content
            .iter()
            .filter_map(MessageContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tool invocations in render order.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.message
            .content
            .iter()
            .filter_map(MessageContent::as_tool_use)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_uses().map(|block| block.name.as_str()).collect()
    }

    pub const fn is_root(&self) -> bool {
        self.parent_uuid.is_none()
    }
}

/// Decodes and validates a single JSONL line.
pub fn decode_record(line: &str) -> Result<MessageRecord, DecodeError> {
    Ok(serde_json::from_str(line)?)
}

/// Validates an already-parsed JSON object.
pub fn decode_record_value(value: Value) -> Result<MessageRecord, DecodeError> {
    Ok(serde_json::from_value(value)?)
}
