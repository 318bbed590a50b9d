//! Project command for summarizing every session of one project.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;

use cslog_core::{
    LoadedProject, decode_project_path, encode_project_path, extract_project_name, find_projects,
    load_project,
};

use super::util::{display_name, format_cost, format_duration, format_timestamp};
use crate::Config;

/// One session row of a project report.
#[derive(Debug, Serialize)]
pub struct SessionRow {
    pub session_id: String,
    pub messages: usize,
    pub cost: f64,
    pub started_at: Option<DateTime<Utc>>,
}

/// A session file that could not be loaded.
#[derive(Debug, Serialize)]
pub struct FailureRow {
    pub file: String,
    pub error: String,
}

/// Summary of a loaded project.
#[derive(Debug, Serialize)]
pub struct ProjectReport {
    pub project_id: String,
    pub name: String,
    pub project_path: PathBuf,
    pub total_cost: f64,
    pub tool_usage: BTreeMap<String, usize>,
    pub first_session: Option<DateTime<Utc>>,
    pub last_session: Option<DateTime<Utc>>,
    pub total_duration_ms: Option<i64>,
    pub skipped_lines: usize,
    pub sessions: Vec<SessionRow>,
    pub failures: Vec<FailureRow>,
}

impl ProjectReport {
    pub fn from_loaded(loaded: &LoadedProject) -> Self {
        let project = &loaded.project;
        Self {
            project_id: project.project_id().to_string(),
            name: project.name().to_string(),
            project_path: project.project_path().to_path_buf(),
            total_cost: project.total_cost(),
            tool_usage: project.tool_usage_count(),
            first_session: project.first_session_date(),
            last_session: project.last_session_date(),
            total_duration_ms: project.total_duration().map(|d| d.num_milliseconds()),
            skipped_lines: loaded.skipped_lines,
            sessions: project
                .sessions()
                .iter()
                .map(|session| SessionRow {
                    session_id: session.session_id().to_string(),
                    messages: session.messages().len(),
                    cost: session.total_cost(),
                    started_at: session.start_time(),
                })
                .collect(),
            failures: loaded
                .failures
                .iter()
                .map(|failure| FailureRow {
                    file: display_name(&failure.path),
                    error: failure.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Resolves a project argument to a directory.
///
/// Accepts an encoded project id or a bare project name (both looked up
/// under the projects directory), a working directory whose encoded form
/// exists under the projects directory, or a project directory path.
pub fn resolve_project_dir(target: &str, config: &Config) -> Result<PathBuf> {
    if target.starts_with('-') {
        return Ok(config.projects_dir.join(target));
    }

    let path = Path::new(target);
    if path.is_absolute() {
        let encoded = config.projects_dir.join(encode_project_path(path)?);
        if encoded.is_dir() {
            return Ok(encoded);
        }
        return Ok(path.to_path_buf());
    }

    let under_projects = config.projects_dir.join(path);
    if under_projects.is_dir() {
        return Ok(under_projects);
    }
    if let Some(found) = find_by_name(target, config)? {
        return Ok(found);
    }
    Ok(path.to_path_buf())
}

/// The single project directory whose decoded name is `name`, if any.
fn find_by_name(name: &str, config: &Config) -> Result<Option<PathBuf>> {
    if !config.projects_dir.is_dir() {
        return Ok(None);
    }
    let mut matches: Vec<PathBuf> = find_projects(&config.projects_dir)?
        .into_iter()
        .filter(|dir| {
            dir.file_name()
                .and_then(|id| decode_project_path(&id.to_string_lossy()).ok())
                .and_then(|decoded| extract_project_name(&decoded).ok())
                .is_some_and(|decoded_name| decoded_name == name)
        })
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => bail!(
            "project name {name:?} is ambiguous under {}; pass the encoded id instead",
            config.projects_dir.display()
        ),
    }
}

// ========== Human-Readable Output ==========

/// Format a project report for human-readable output.
pub fn format_project(report: &ProjectReport) -> String {
    let mut output = String::new();

    writeln!(output, "Project {}", report.name).unwrap();
    writeln!(output, "Id: {}", report.project_id).unwrap();
    writeln!(output, "Path: {}", report.project_path.display()).unwrap();
    writeln!(
        output,
        "Sessions: {} ({} failed, {} lines skipped)",
        report.sessions.len(),
        report.failures.len(),
        report.skipped_lines
    )
    .unwrap();
    writeln!(output, "Cost: {}", format_cost(report.total_cost)).unwrap();
    if let (Some(first), Some(last)) = (report.first_session, report.last_session) {
        writeln!(output, "First session: {}", format_timestamp(first)).unwrap();
        writeln!(output, "Last session: {}", format_timestamp(last)).unwrap();
        writeln!(output, "Span: {}", format_duration(last - first)).unwrap();
    }

    if !report.tool_usage.is_empty() {
        writeln!(output, "Tools:").unwrap();
        for (tool, count) in &report.tool_usage {
            writeln!(output, "  {tool:<12} {count:>4}").unwrap();
        }
    }

    if !report.sessions.is_empty() {
        writeln!(output).unwrap();
        writeln!(
            output,
            "{:<36}  {:>8}  {:>10}  Started",
            "Session", "Messages", "Cost"
        )
        .unwrap();
        for row in &report.sessions {
            let started = row.started_at.map(format_timestamp).unwrap_or_default();
            writeln!(
                output,
                "{:<36}  {:>8}  {:>10}  {}",
                row.session_id,
                row.messages,
                format_cost(row.cost),
                started
            )
            .unwrap();
        }
    }

    for failure in &report.failures {
        writeln!(output, "Failed: {}: {}", failure.file, failure.error).unwrap();
    }

    output
}

// ========== Public Interface ==========

/// Runs the project command.
pub fn run<W: Write>(writer: &mut W, target: &str, json: bool, config: &Config) -> Result<()> {
    let directory = resolve_project_dir(target, config)?;
    let loaded = load_project(&directory)
        .with_context(|| format!("failed to load project {}", directory.display()))?;

    if config.strict {
        for session in loaded.project.sessions() {
            if let Err(violation) = session.validate_integrity() {
                bail!(
                    "session {} failed integrity check: {violation}",
                    session.session_id()
                );
            }
        }
    }

    let report = ProjectReport::from_loaded(&loaded);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_project(&report))?;
    }

    Ok(())
}
