//! Core parsing and aggregation for coding assistant session logs.
//!
//! This crate contains the types and logic for:
//! - Record decoding: validating one JSONL line against the closed schema
//! - Session parsing: reading a log file, skipping invalid lines
//! - Session assembly: threading, cost and tool statistics
//! - Project aggregation: combining the sessions of one working directory

pub mod content;
pub mod error;
pub mod model;
pub mod parser;
pub mod project;
pub mod project_path;
pub mod session;
pub mod tree;
pub mod types;

#[cfg(test)]
mod test_support;

pub use content::{
    ContentBlock, MessageContent, TextBlock, ThinkingBlock, ToolResultBlock, ToolUseBlock,
    decode_block, decode_blocks,
};
pub use error::{DecodeError, Error, IntegrityError, ParseError, Result, ValidationError};
pub use model::{
    Message, MessageRecord, TokenUsage, ToolResult, ToolUseResult, decode_record,
    decode_record_value,
};
pub use parser::{ParsedLog, SkippedLine, parse_reader, parse_session_file};
pub use project::{
    LoadedProject, Project, SessionFailure, find_projects, find_session_files, load_project,
};
pub use project_path::{decode_project_path, encode_project_path, extract_project_name};
pub use session::{
    LoadedSession, Session, SessionMetadata, SessionOptions, ToolExecution, load_session,
};
pub use tree::ConversationTree;
pub use types::{CostUsd, DurationMs, MessageType, Role, StopReason, UserType};
