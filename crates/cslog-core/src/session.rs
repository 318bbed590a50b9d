//! Session assembly: threading, cost and tool aggregation for one log file.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{IntegrityError, ParseError, ValidationError};
use crate::model::{MessageRecord, ToolUseResult};
use crate::parser::{SkippedLine, parse_session_file};
use crate::project_path::extract_project_name;
use crate::tree::ConversationTree;
use crate::types::Role;

/// Aggregated statistics for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionMetadata {
    total_cost: f64,
    total_messages: usize,
    tool_usage_count: BTreeMap<String, usize>,
}

impl SessionMetadata {
    /// Builds metadata from externally computed values.
    pub fn new(
        total_cost: f64,
        total_messages: usize,
        tool_usage_count: BTreeMap<String, usize>,
    ) -> Result<Self, ValidationError> {
        if total_cost.is_nan() || total_cost < 0.0 {
            return Err(ValidationError::NegativeTotal {
                field: "total_cost",
                value: total_cost,
            });
        }
        Ok(Self {
            total_cost,
            total_messages,
            tool_usage_count,
        })
    }

    /// Computes metadata in a single pass over `records`.
    ///
    /// Absent costs count as zero. Tool usage counts every `tool_use` block in
    /// assistant messages, sidechains included.
    pub fn from_records(records: &[MessageRecord]) -> Self {
        let mut total_cost = 0.0;
        let mut tool_usage_count: BTreeMap<String, usize> = BTreeMap::new();

        for record in records {
            total_cost += record.cost();
            if record.role() == Role::Assistant {
                for tool in record.tool_uses() {
                    *tool_usage_count.entry(tool.name.clone()).or_default() += 1;
                }
            }
        }

        Self {
            total_cost,
            total_messages: records.len(),
            tool_usage_count,
        }
    }

    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub const fn total_messages(&self) -> usize {
        self.total_messages
    }

    pub const fn tool_usage_count(&self) -> &BTreeMap<String, usize> {
        &self.tool_usage_count
    }

    pub fn total_tool_uses(&self) -> usize {
        self.tool_usage_count.values().sum()
    }
}

/// A tool invocation paired with the record that carried its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecution {
    pub tool_use_id: String,
    pub tool_name: String,
    pub input: Map<String, Value>,
    pub output: ToolUseResult,
    /// When the tool was invoked.
    pub timestamp: DateTime<Utc>,
    /// Result timestamp minus invocation timestamp.
    pub duration: Duration,
}

impl ToolExecution {
    pub fn is_error(&self) -> bool {
        self.output.is_error()
    }
}

/// Optional overrides for [`Session::from_records_with`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Used instead of the first record's `session_id`.
    pub session_id: Option<String>,
    pub summaries: Vec<String>,
}

/// One assembled session. Immutable once built.
#[derive(Debug, Clone)]
pub struct Session {
    session_id: String,
    messages: Vec<MessageRecord>,
    summaries: Vec<String>,
    conversation_tree: ConversationTree,
    metadata: SessionMetadata,
    tool_executions: Vec<ToolExecution>,
}

impl Session {
    /// Assembles a session from records in file order.
    pub fn from_records(records: Vec<MessageRecord>) -> Result<Self, ValidationError> {
        Self::from_records_with(records, SessionOptions::default())
    }

    /// Assembles a session with an explicit id or summaries.
    ///
    /// Integrity is not checked here; see [`Session::validate_integrity`].
    pub fn from_records_with(
        records: Vec<MessageRecord>,
        options: SessionOptions,
    ) -> Result<Self, ValidationError> {
        let Some(first) = records.first() else {
            return Err(ValidationError::Empty { field: "messages" });
        };
        let session_id = options
            .session_id
            .unwrap_or_else(|| first.session_id.clone());
        let metadata = SessionMetadata::from_records(&records);
        Self::from_parts(session_id, records, metadata, options.summaries)
    }

    /// Builds a session around externally supplied metadata.
    ///
    /// The metadata is stored as given, so a session built this way may fail
    /// [`Session::validate_integrity`].
    pub fn from_parts(
        session_id: String,
        messages: Vec<MessageRecord>,
        metadata: SessionMetadata,
        summaries: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if session_id.is_empty() {
            return Err(ValidationError::Empty {
                field: "session_id",
            });
        }
        let conversation_tree = ConversationTree::build(&messages);
        let tool_executions = pair_tool_executions(&messages, &conversation_tree);

        tracing::debug!(
            session_id = %session_id,
            messages = messages.len(),
            roots = conversation_tree.root_messages().len(),
            tool_executions = tool_executions.len(),
            "assembled session"
        );

        Ok(Self {
            session_id,
            messages,
            summaries,
            conversation_tree,
            metadata,
            tool_executions,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Records in file order.
    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    pub fn summaries(&self) -> &[String] {
        &self.summaries
    }

    pub const fn conversation_tree(&self) -> &ConversationTree {
        &self.conversation_tree
    }

    pub const fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn tool_executions(&self) -> &[ToolExecution] {
        &self.tool_executions
    }

    /// Recomputes metadata from the stored messages. Never updates the session.
    pub fn calculate_metadata(&self) -> SessionMetadata {
        SessionMetadata::from_records(&self.messages)
    }

    /// Every consistency violation, in message order.
    pub fn integrity_violations(&self) -> Vec<IntegrityError> {
        let mut violations: Vec<IntegrityError> = self
            .messages
            .iter()
            .filter(|record| record.session_id != self.session_id)
            .map(|record| IntegrityError::SessionIdMismatch {
                expected: self.session_id.clone(),
                found: record.session_id.clone(),
                uuid: record.uuid,
            })
            .collect();

        if self.metadata.total_messages != self.messages.len() {
            violations.push(IntegrityError::MessageCountMismatch {
                recorded: self.metadata.total_messages,
                actual: self.messages.len(),
            });
        }
        violations
    }

    /// Fails with the first consistency violation, if any.
    pub fn validate_integrity(&self) -> Result<(), IntegrityError> {
        match self.integrity_violations().into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Records not on a sidechain, in original order.
    pub fn main_chain(&self) -> Vec<&MessageRecord> {
        self.messages.iter().filter(|m| !m.is_sidechain).collect()
    }

    pub fn sidechains(&self) -> Vec<&MessageRecord> {
        self.messages.iter().filter(|m| m.is_sidechain).collect()
    }

    pub fn messages_by_role(&self, role: Role) -> Vec<&MessageRecord> {
        self.messages.iter().filter(|m| m.role() == role).collect()
    }

    pub const fn total_cost(&self) -> f64 {
        self.metadata.total_cost
    }

    pub fn tools_used(&self) -> BTreeSet<&str> {
        self.metadata
            .tool_usage_count
            .keys()
            .map(String::as_str)
            .collect()
    }

    /// Per-record cost in file order, zero where absent.
    pub fn cost_by_turn(&self) -> Vec<f64> {
        self.messages.iter().map(MessageRecord::cost).collect()
    }

    /// Last record's timestamp minus the first record's, in file order.
    ///
    /// File order is not guaranteed to be chronological, so this can be
    /// negative; use [`Session::start_time`] and [`Session::end_time`] for
    /// chronological bounds.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.messages.first()?;
        let last = self.messages.last()?;
        Some(last.timestamp - first.timestamp)
    }

    /// Earliest record timestamp.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).min()
    }

    /// Latest record timestamp.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).max()
    }

    /// Working directory of the first record.
    pub fn project_path(&self) -> Option<&Path> {
        self.messages.first().map(|m| m.cwd.as_path())
    }

    pub fn project_name(&self) -> Option<String> {
        self.project_path()
            .and_then(|path| extract_project_name(path).ok())
    }
}

/// Matches tool results to the invocations they answer.
///
/// Structured results carry a `tool_use_id` and are paired first. Plain-text
/// results do not, so they take the first invocation in the parent record
/// that no other result has claimed. Executions come out in result order.
fn pair_tool_executions(
    messages: &[MessageRecord],
    tree: &ConversationTree,
) -> Vec<ToolExecution> {
    let mut invocations = HashMap::new();
    for record in messages {
        for tool in record.tool_uses() {
            invocations.entry(tool.id.as_str()).or_insert((record, tool));
        }
    }

    let results: Vec<(usize, &MessageRecord, &ToolUseResult)> = messages
        .iter()
        .enumerate()
        .filter_map(|(i, record)| Some((i, record, record.tool_use_result.as_ref()?)))
        .collect();

    let mut answered: HashSet<&str> = HashSet::new();
    let mut pairs = Vec::new();

    for &(i, record, output) in &results {
        let Some(id) = output.tool_use_id() else {
            continue;
        };
        match invocations.get(id) {
            Some(&(invoking, tool)) if answered.insert(tool.id.as_str()) => {
                pairs.push((i, record, output, invoking, tool));
            }
            _ => tracing::trace!(uuid = %record.uuid, "tool result without matching invocation"),
        }
    }

    for &(i, record, output) in &results {
        if output.tool_use_id().is_some() {
            continue;
        }
        let invocation = record
            .parent_uuid
            .and_then(|parent| tree.position(&parent))
            .and_then(|position| {
                let parent = &messages[position];
                parent
                    .tool_uses()
                    .find(|tool| !answered.contains(tool.id.as_str()))
                    .map(|tool| (parent, tool))
            });
        let Some((invoking, tool)) = invocation else {
            tracing::trace!(uuid = %record.uuid, "tool result without matching invocation");
            continue;
        };
        answered.insert(tool.id.as_str());
        pairs.push((i, record, output, invoking, tool));
    }

    pairs.sort_by_key(|&(i, ..)| i);
    pairs
        .into_iter()
        .map(|(_, record, output, invoking, tool)| ToolExecution {
            tool_use_id: tool.id.clone(),
            tool_name: tool.name.clone(),
            input: tool.input.clone(),
            output: output.clone(),
            timestamp: invoking.timestamp,
            duration: record.timestamp - invoking.timestamp,
        })
        .collect()
}

/// A session together with the lines dropped while parsing it.
#[derive(Debug)]
pub struct LoadedSession {
    pub path: PathBuf,
    pub session: Session,
    pub skipped: Vec<SkippedLine>,
}

/// Parses and assembles one session file.
pub fn load_session(path: &Path) -> Result<LoadedSession, ParseError> {
    let log = parse_session_file(path)?;
    if log.is_empty() {
        return Err(ParseError::EmptySession {
            path: path.to_path_buf(),
        });
    }
    let skipped = log.skipped;
    let session =
        Session::from_records(log.records).map_err(|source| ParseError::InvalidSession {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::info!(
        path = %path.display(),
        session_id = session.session_id(),
        messages = session.messages().len(),
        skipped = skipped.len(),
        "loaded session"
    );

    Ok(LoadedSession {
        path: path.to_path_buf(),
        session,
        skipped,
    })
}
