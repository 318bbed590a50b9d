//! Projects command for listing every project under the projects directory.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use cslog_core::{find_projects, load_project};

use super::util::{format_cost, format_timestamp};
use crate::Config;

/// One row of the project listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectEntry {
    pub project_id: String,
    pub name: String,
    pub project_path: PathBuf,
    pub sessions: usize,
    pub failed: usize,
    pub total_cost: f64,
    pub last_session: Option<DateTime<Utc>>,
}

/// Loads every project, most expensive first.
pub fn collect_projects(config: &Config) -> Result<Vec<ProjectEntry>> {
    let directories = find_projects(&config.projects_dir)
        .with_context(|| format!("failed to list {}", config.projects_dir.display()))?;

    let mut entries = Vec::with_capacity(directories.len());
    for directory in directories {
        let loaded = match load_project(&directory) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(path = %directory.display(), error = %e, "skipping project");
                continue;
            }
        };
        let project = &loaded.project;
        entries.push(ProjectEntry {
            project_id: project.project_id().to_string(),
            name: project.name().to_string(),
            project_path: project.project_path().to_path_buf(),
            sessions: project.total_sessions(),
            failed: loaded.failures.len(),
            total_cost: project.total_cost(),
            last_session: project.last_session_date(),
        });
    }

    entries.sort_by(|a, b| {
        b.total_cost
            .total_cmp(&a.total_cost)
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    Ok(entries)
}

// ========== Human-Readable Output ==========

/// Format the project listing for human-readable output.
pub fn format_projects(entries: &[ProjectEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No projects found.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<20}  {:>8}  {:>10}  {:<23}  Path",
        "Name", "Sessions", "Cost", "Last session"
    )
    .unwrap();
    for entry in entries {
        // Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8
        let name = if entry.name.chars().count() > 20 {
            format!("{}...", entry.name.chars().take(17).collect::<String>())
        } else {
            entry.name.clone()
        };
        let last = entry.last_session.map(format_timestamp).unwrap_or_default();
        writeln!(
            output,
            "{:<20}  {:>8}  {:>10}  {:<23}  {}",
            name,
            entry.sessions,
            format_cost(entry.total_cost),
            last,
            entry.project_path.display()
        )
        .unwrap();
    }

    output
}

// ========== Public Interface ==========

/// Runs the projects command.
pub fn run<W: Write>(writer: &mut W, json: bool, config: &Config) -> Result<()> {
    let entries = collect_projects(config)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write!(writer, "{}", format_projects(&entries))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{Turn, write_session_in};
    use std::path::Path;

    use insta::assert_snapshot;

    fn config(projects_dir: &Path) -> Config {
        Config {
            projects_dir: projects_dir.to_path_buf(),
            strict: false,
        }
    }

    fn seed(base: &Path, cwd: &str, session: &'static str, cost: f64) {
        let dir = base.join(cslog_core::encode_project_path(Path::new(cwd)).unwrap());
        std::fs::create_dir(&dir).unwrap();
        write_session_in(
            &dir.join(format!("{session}.jsonl")),
            cwd,
            &[Turn {
                session,
                timestamp: "2025-06-02T08:00:00Z",
                cost: Some(cost),
                tools: &[],
            }],
            &[],
        );
    }

    #[test]
    fn projects_command_lists_by_cost() {
        let temp = tempfile::tempdir().unwrap();
        seed(temp.path(), "/home/dev/api", "s1", 0.5);
        seed(temp.path(), "/home/dev/webapp", "s2", 3.0);
        std::fs::create_dir(temp.path().join("not-a-project")).unwrap();

        let mut output = Vec::new();
        run(&mut output, false, &config(temp.path())).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output, @r"
        Name                  Sessions        Cost  Last session             Path
        webapp                       1     $3.0000  2025-06-02 08:00:00 UTC  /home/dev/webapp
        api                          1     $0.5000  2025-06-02 08:00:00 UTC  /home/dev/api
        ");
    }

    #[test]
    fn projects_command_empty_directory() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();
        run(&mut output, false, &config(temp.path())).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"No projects found.");
    }

    #[test]
    fn projects_command_missing_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut output = Vec::new();
        let result = run(&mut output, true, &config(&temp.path().join("absent")));
        assert!(result.is_err());
    }
}
