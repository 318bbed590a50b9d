//! Session command for summarizing one log file.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use cslog_core::{DurationMs, LoadedSession, TokenUsage, load_session};

use super::util::{format_cost, format_duration, format_timestamp};
use crate::Config;

/// Summary of a loaded session.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub path: PathBuf,
    pub project: Option<String>,
    pub messages: usize,
    pub skipped_lines: usize,
    pub main_chain_messages: usize,
    pub sidechain_messages: usize,
    pub roots: usize,
    pub max_depth: usize,
    pub total_cost: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Last record's timestamp minus the first record's, in file order.
    pub duration_ms: Option<i64>,
    /// Sum of the `durationMs` reported on each record.
    pub api_duration_ms: i64,
    pub total_tokens: u64,
    pub tool_usage: BTreeMap<String, usize>,
    pub tool_executions: usize,
    pub failed_tool_executions: usize,
    pub integrity_violations: Vec<String>,
}

impl SessionReport {
    pub fn from_loaded(loaded: &LoadedSession) -> Self {
        let session = &loaded.session;
        let tree = session.conversation_tree();
        Self {
            session_id: session.session_id().to_string(),
            path: loaded.path.clone(),
            project: session.project_name(),
            messages: session.messages().len(),
            skipped_lines: loaded.skipped.len(),
            main_chain_messages: session.main_chain().len(),
            sidechain_messages: session.sidechains().len(),
            roots: tree.root_messages().len(),
            max_depth: tree.max_depth(),
            total_cost: session.total_cost(),
            started_at: session.start_time(),
            ended_at: session.end_time(),
            duration_ms: session.duration().map(|d| d.num_milliseconds()),
            api_duration_ms: session
                .messages()
                .iter()
                .filter_map(|record| record.duration_ms)
                .map(DurationMs::to_duration)
                .fold(Duration::zero(), |total, d| total + d)
                .num_milliseconds(),
            total_tokens: session
                .messages()
                .iter()
                .filter_map(|record| record.message.usage.as_ref())
                .map(TokenUsage::total_tokens)
                .fold(0, u64::saturating_add),
            tool_usage: session.metadata().tool_usage_count().clone(),
            tool_executions: session.tool_executions().len(),
            failed_tool_executions: session
                .tool_executions()
                .iter()
                .filter(|execution| execution.is_error())
                .count(),
            integrity_violations: session
                .integrity_violations()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

// ========== Human-Readable Output ==========

/// Format a session report for human-readable output.
pub fn format_session(report: &SessionReport) -> String {
    let mut output = String::new();

    writeln!(output, "Session {}", report.session_id).unwrap();
    writeln!(output, "File: {}", report.path.display()).unwrap();
    if let Some(project) = &report.project {
        writeln!(output, "Project: {project}").unwrap();
    }
    writeln!(
        output,
        "Messages: {} ({} main, {} sidechain, {} lines skipped)",
        report.messages,
        report.main_chain_messages,
        report.sidechain_messages,
        report.skipped_lines
    )
    .unwrap();
    writeln!(
        output,
        "Threads: {} root(s), max depth {}",
        report.roots, report.max_depth
    )
    .unwrap();
    writeln!(output, "Cost: {}", format_cost(report.total_cost)).unwrap();
    if report.total_tokens > 0 {
        writeln!(output, "Tokens: {}", report.total_tokens).unwrap();
    }
    if let Some(start) = report.started_at {
        writeln!(output, "Started: {}", format_timestamp(start)).unwrap();
    }
    if let Some(ms) = report.duration_ms {
        writeln!(
            output,
            "Duration (first to last record): {}",
            format_duration(Duration::milliseconds(ms))
        )
        .unwrap();
    }
    if report.api_duration_ms > 0 {
        writeln!(
            output,
            "API time: {}",
            format_duration(Duration::milliseconds(report.api_duration_ms))
        )
        .unwrap();
    }

    if report.tool_usage.is_empty() {
        writeln!(output, "Tools: none").unwrap();
    } else {
        writeln!(output, "Tools:").unwrap();
        for (tool, count) in &report.tool_usage {
            writeln!(output, "  {tool:<12} {count:>4}").unwrap();
        }
        writeln!(
            output,
            "Tool results: {} paired, {} failed",
            report.tool_executions, report.failed_tool_executions
        )
        .unwrap();
    }

    for violation in &report.integrity_violations {
        writeln!(output, "Warning: {violation}").unwrap();
    }

    output
}

// ========== Public Interface ==========

/// Runs the session command.
pub fn run<W: Write>(writer: &mut W, path: &Path, json: bool, config: &Config) -> Result<()> {
    let loaded =
        load_session(path).with_context(|| format!("failed to load {}", path.display()))?;

    if config.strict {
        loaded
            .session
            .validate_integrity()
            .with_context(|| format!("session {} failed integrity check", loaded.session.session_id()))?;
    }

    let report = SessionReport::from_loaded(&loaded);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_session(&report))?;
    }

    Ok(())
}
