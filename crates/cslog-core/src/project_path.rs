//! Project directory naming.
//!
//! Session logs are grouped in directories named after the working directory
//! they were recorded in: every `/` becomes `-`, and a component starting
//! with `.` has that dot replaced by a second `-`, so `/home/dev/.config/app`
//! is stored as `-home-dev--config-app`.
//!
//! The encoding is lossy for components that themselves contain `-`.
//! Decoding assumes every `-` was a separator.

use std::path::{Path, PathBuf};

use crate::error::ValidationError;

/// Encodes a path into its project directory name.
pub fn encode_project_path(path: &Path) -> Result<String, ValidationError> {
    let raw = path.to_string_lossy();
    if raw.is_empty() {
        return Err(ValidationError::Empty {
            field: "project path",
        });
    }
    if !raw.starts_with('/') {
        return Err(ValidationError::NotAbsolute {
            path: path.to_path_buf(),
        });
    }

    let mut encoded = String::with_capacity(raw.len() + 1);
    for component in raw.split('/').filter(|c| !c.is_empty() && *c != ".") {
        encoded.push('-');
        match component.strip_prefix('.') {
            Some(hidden) => {
                encoded.push('-');
                encoded.push_str(hidden);
            }
            None => encoded.push_str(component),
        }
    }

    if encoded.is_empty() {
        // The filesystem root
        encoded.push('-');
    }
    Ok(encoded)
}

/// Decodes a project directory name back into an absolute path.
pub fn decode_project_path(project_id: &str) -> Result<PathBuf, ValidationError> {
    if project_id.is_empty() {
        return Err(ValidationError::Empty {
            field: "project id",
        });
    }
    let invalid = || ValidationError::InvalidProjectId {
        id: project_id.to_string(),
    };
    let rest = project_id.strip_prefix('-').ok_or_else(invalid)?;
    if rest.is_empty() {
        return Ok(PathBuf::from("/"));
    }

    let mut decoded = String::with_capacity(project_id.len());
    let mut hidden = false;
    for segment in rest.split('-') {
        if segment.is_empty() {
            if hidden {
                return Err(invalid());
            }
            hidden = true;
            continue;
        }
        decoded.push('/');
        if hidden {
            decoded.push('.');
            hidden = false;
        }
        decoded.push_str(segment);
    }
    if hidden {
        return Err(invalid());
    }

    Ok(PathBuf::from(decoded))
}

/// Human-readable project name: the trailing path component.
pub fn extract_project_name(path: &Path) -> Result<String, ValidationError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or(ValidationError::Empty {
            field: "project name",
        })
}
