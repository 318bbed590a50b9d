//! JSONL session file parsing.
//!
//! Failures are handled at two levels. A line that is not valid JSON, or
//! that fails record validation, is logged and skipped; the rest of the file
//! is still parsed. A path that does not exist, is not a regular file, or
//! cannot be read fails the whole call with no partial result.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{DecodeError, ParseError};
use crate::model::{MessageRecord, decode_record};

/// Buffer size for `BufReader` (64KB for optimal performance on large files)
const BUFFER_SIZE: usize = 64 * 1024;

/// What a single line of a session file turned into.
#[derive(Debug)]
pub enum LineOutcome {
    Record(Box<MessageRecord>),
    /// Whitespace only. Not an error.
    Blank,
    /// Invalid line; parsing continues with the next one.
    Skipped(DecodeError),
}

/// Classifies one raw line (without its terminator).
pub fn classify_line(raw: &[u8]) -> LineOutcome {
    let Ok(line) = std::str::from_utf8(raw) else {
        return LineOutcome::Skipped(DecodeError::InvalidUtf8);
    };
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }
    match decode_record(line) {
        Ok(record) => LineOutcome::Record(Box::new(record)),
        Err(e) => LineOutcome::Skipped(e),
    }
}

/// A line dropped during parsing.
#[derive(Debug)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line_number: usize,
    pub error: DecodeError,
}

/// The best-effort result of parsing one session file.
#[derive(Debug)]
pub struct ParsedLog {
    pub path: PathBuf,
    /// Valid records in file order.
    pub records: Vec<MessageRecord>,
    pub skipped: Vec<SkippedLine>,
}

impl ParsedLog {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses records from any buffered reader.
///
/// `path` is only used for diagnostics. Read errors are fatal.
pub fn parse_reader<R: BufRead>(mut reader: R, path: &Path) -> Result<ParsedLog, ParseError> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ParseError::io(path, e))?;
        if read == 0 {
            break;
        }
        line_number += 1;

        match classify_line(&buf) {
            LineOutcome::Record(record) => records.push(*record),
            LineOutcome::Blank => {}
            LineOutcome::Skipped(error) => {
                tracing::warn!(path = %path.display(), line = line_number, error = %error, "skipping invalid line");
                skipped.push(SkippedLine { line_number, error });
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        records = records.len(),
        skipped = skipped.len(),
        "parsed session file"
    );

    Ok(ParsedLog {
        path: path.to_path_buf(),
        records,
        skipped,
    })
}

/// Parses a session file into its valid records.
pub fn parse_session_file(path: &Path) -> Result<ParsedLog, ParseError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ParseError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(ParseError::io(path, e)),
    };
    if !metadata.is_file() {
        return Err(ParseError::NotAFile(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| ParseError::io(path, e))?;
    parse_reader(BufReader::with_capacity(BUFFER_SIZE, file), path)
}
