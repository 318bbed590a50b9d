//! Project aggregation across the sessions of one working directory.
//!
//! Every total is computed from the held sessions on each call; nothing is
//! cached.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;

use crate::error::{Error, ParseError, ValidationError};
use crate::project_path::{decode_project_path, encode_project_path, extract_project_name};
use crate::session::{Session, load_session};

/// Sessions grouped under one project directory.
#[derive(Debug, Clone)]
pub struct Project {
    project_id: String,
    project_path: PathBuf,
    name: String,
    sessions: Vec<Session>,
}

impl Project {
    pub fn new(
        project_id: impl Into<String>,
        project_path: impl Into<PathBuf>,
        name: impl Into<String>,
        sessions: Vec<Session>,
    ) -> Result<Self, ValidationError> {
        let project_id = project_id.into();
        let name = name.into();
        if project_id.is_empty() {
            return Err(ValidationError::Empty {
                field: "project id",
            });
        }
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "project name",
            });
        }
        let project_path = project_path.into();
        if !project_path.is_absolute() {
            return Err(ValidationError::NotAbsolute { path: project_path });
        }
        Ok(Self {
            project_id,
            project_path,
            name,
            sessions,
        })
    }

    /// An empty project for an encoded directory name.
    pub fn from_encoded_id(project_id: &str) -> Result<Self, ValidationError> {
        let project_path = decode_project_path(project_id)?;
        let name = extract_project_name(&project_path)?;
        Self::new(project_id, project_path, name, Vec::new())
    }

    /// An empty project for a working directory that exists on disk.
    pub fn from_directory(directory: &Path) -> Result<Self, Error> {
        if !directory.exists() {
            return Err(ParseError::NotFound(directory.to_path_buf()).into());
        }
        if !directory.is_dir() {
            return Err(ParseError::NotADirectory(directory.to_path_buf()).into());
        }
        let directory = std::path::absolute(directory).map_err(|e| ParseError::io(directory, e))?;
        let project_id = encode_project_path(&directory)?;
        let name = extract_project_name(&directory)?;
        Ok(Self::new(project_id, directory, name, Vec::new())?)
    }

    /// Replaces the session list.
    #[must_use]
    pub fn with_sessions(self, sessions: Vec<Session>) -> Self {
        Self { sessions, ..self }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Sum of session costs, in session order.
    pub fn total_cost(&self) -> f64 {
        self.sessions
            .iter()
            .fold(0.0, |total, session| total + session.metadata().total_cost())
    }

    pub fn tools_used(&self) -> BTreeSet<&str> {
        self.sessions
            .iter()
            .flat_map(|session| session.metadata().tool_usage_count().keys())
            .map(String::as_str)
            .collect()
    }

    /// Per-tool invocation counts summed across sessions.
    pub fn tool_usage_count(&self) -> BTreeMap<String, usize> {
        let mut totals: BTreeMap<String, usize> = BTreeMap::new();
        for session in &self.sessions {
            for (tool, count) in session.metadata().tool_usage_count() {
                *totals.entry(tool.clone()).or_default() += count;
            }
        }
        totals
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Earliest session start.
    pub fn first_session_date(&self) -> Option<DateTime<Utc>> {
        self.sessions.iter().filter_map(Session::start_time).min()
    }

    /// Latest session end.
    pub fn last_session_date(&self) -> Option<DateTime<Utc>> {
        self.sessions.iter().filter_map(Session::end_time).max()
    }

    pub fn total_duration(&self) -> Option<Duration> {
        Some(self.last_session_date()? - self.first_session_date()?)
    }
}

/// A session file that could not be loaded.
#[derive(Debug)]
pub struct SessionFailure {
    pub path: PathBuf,
    pub error: ParseError,
}

/// A project plus diagnostics for the files that did not make it in.
#[derive(Debug)]
pub struct LoadedProject {
    pub project: Project,
    pub failures: Vec<SessionFailure>,
    /// Lines skipped across all loaded sessions.
    pub skipped_lines: usize,
}

fn ensure_directory(path: &Path) -> Result<(), ParseError> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ParseError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ParseError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(ParseError::io(path, e)),
    }
}

/// Lists `*.jsonl` files directly inside `directory`, sorted by path.
pub fn find_session_files(directory: &Path) -> Result<Vec<PathBuf>, ParseError> {
    ensure_directory(directory)?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(|e| ParseError::io(directory, e))? {
        let entry = entry.map_err(|e| ParseError::io(directory, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "jsonl") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Lists project directories (names starting with `-`) directly inside `base`.
pub fn find_projects(base: &Path) -> Result<Vec<PathBuf>, ParseError> {
    ensure_directory(base)?;

    let mut projects = Vec::new();
    for entry in std::fs::read_dir(base).map_err(|e| ParseError::io(base, e))? {
        let entry = entry.map_err(|e| ParseError::io(base, e))?;
        let path = entry.path();
        let is_project = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('-'));
        if is_project && path.is_dir() {
            projects.push(path);
        }
    }
    projects.sort();
    Ok(projects)
}

/// Loads every session file in a project directory.
///
/// Files are parsed in parallel. A file that fails is recorded in
/// [`LoadedProject::failures`] and does not stop the others. The project
/// path comes from the first session's working directory, falling back to
/// decoding the directory name.
pub fn load_project(directory: &Path) -> Result<LoadedProject, Error> {
    let files = find_session_files(directory)?;

    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, load_session(path)))
        .collect();

    let mut sessions = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    let mut skipped_lines = 0;
    for (path, result) in results {
        match result {
            Ok(loaded) => {
                skipped_lines += loaded.skipped.len();
                sessions.push(loaded.session);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "skipping invalid session");
                failures.push(SessionFailure {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    let dir_name = directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let recorded = sessions
        .first()
        .and_then(Session::project_path)
        .filter(|path| path.is_absolute());
    let project_path = match (recorded, decode_project_path(&dir_name)) {
        (Some(path), _) => path.to_path_buf(),
        (None, Ok(decoded)) => decoded,
        (None, Err(_)) => {
            std::path::absolute(directory).map_err(|e| ParseError::io(directory, e))?
        }
    };
    let project_id = if dir_name.starts_with('-') {
        dir_name.clone()
    } else {
        encode_project_path(&project_path).unwrap_or_else(|_| dir_name.clone())
    };
    let name = extract_project_name(&project_path).unwrap_or(dir_name);

    let project = Project::new(project_id, project_path, name, sessions)?;

    tracing::info!(
        project = project.name(),
        sessions = project.total_sessions(),
        failures = failures.len(),
        "loaded project"
    );

    Ok(LoadedProject {
        project,
        failures,
        skipped_lines,
    })
}
