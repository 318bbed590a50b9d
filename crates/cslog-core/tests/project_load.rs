//! Integration tests for loading session files and project directories from disk.

use std::fs;
use std::io::Write;
use std::path::Path;

use cslog_core::{
    DecodeError, Error, ParseError, Project, find_projects, find_session_files, load_project,
    load_session, parse_session_file,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn record(uuid: &str, parent: Option<&str>, session: &str, cost: Option<f64>) -> Value {
    let mut value = json!({
        "parentUuid": parent,
        "isSidechain": false,
        "userType": "external",
        "cwd": "/home/dev/webapp",
        "sessionId": session,
        "version": "1.0.17",
        "type": "assistant",
        "message": {
            "id": "msg_01",
            "role": "assistant",
            "model": "claude-sonnet-4",
            "content": [
                {"type": "text", "text": "Running the tests."},
                {"type": "tool_use", "id": format!("toolu_{uuid}"), "name": "Bash", "input": {"command": "cargo test"}}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 40}
        },
        "uuid": uuid,
        "timestamp": "2025-06-01T10:00:00.000Z"
    });
    if let Some(cost) = cost {
        value["costUSD"] = json!(cost);
    }
    value
}

fn uuid(n: u32) -> String {
    format!("00000000-0000-4000-8000-{n:012}")
}

fn write_session(dir: &Path, name: &str, lines: &[String]) {
    let mut file = fs::File::create(dir.join(name)).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

fn session_lines(session: &str, costs: &[f64]) -> Vec<String> {
    costs
        .iter()
        .enumerate()
        .map(|(i, cost)| {
            let n = u32::try_from(i).unwrap() + 1;
            let parent = (i > 0).then(|| uuid(n - 1));
            record(&uuid(n), parent.as_deref(), session, Some(*cost)).to_string()
        })
        .collect()
}

#[test]
fn malformed_line_is_skipped_and_rest_parsed() {
    let temp = TempDir::new().unwrap();
    let mut lines = session_lines("s1", &[0.1, 0.2, 0.3, 0.4]);
    lines.insert(2, r#"{"parentUuid": "#.to_string());
    write_session(temp.path(), "s1.jsonl", &lines);

    let log = parse_session_file(&temp.path().join("s1.jsonl")).unwrap();

    assert_eq!(log.records.len(), 4);
    assert_eq!(log.skipped.len(), 1);
    assert_eq!(log.skipped[0].line_number, 3);
    assert!(matches!(log.skipped[0].error, DecodeError::Syntax(_)));
}

#[test]
fn unknown_field_rejects_only_that_line() {
    let temp = TempDir::new().unwrap();
    let mut extra = record(&uuid(2), Some(&uuid(1)), "s1", None);
    extra["surprise"] = json!(true);
    let lines = vec![
        record(&uuid(1), None, "s1", None).to_string(),
        extra.to_string(),
    ];
    write_session(temp.path(), "s1.jsonl", &lines);

    let loaded = load_session(&temp.path().join("s1.jsonl")).unwrap();

    assert_eq!(loaded.session.messages().len(), 1);
    assert_eq!(loaded.skipped.len(), 1);
    assert!(matches!(loaded.skipped[0].error, DecodeError::Schema(_)));
}

#[test]
fn load_session_builds_metadata_and_tree() {
    let temp = TempDir::new().unwrap();
    write_session(temp.path(), "s1.jsonl", &session_lines("s1", &[0.5, 0.25]));

    let loaded = load_session(&temp.path().join("s1.jsonl")).unwrap();
    let session = &loaded.session;

    assert_eq!(session.session_id(), "s1");
    assert!((session.total_cost() - 0.75).abs() < 1e-10);
    assert_eq!(session.metadata().tool_usage_count()["Bash"], 2);
    assert_eq!(session.conversation_tree().root_messages().len(), 1);
    assert_eq!(session.conversation_tree().max_depth(), 1);
    assert_eq!(session.project_name().as_deref(), Some("webapp"));
    assert!(session.validate_integrity().is_ok());
}

#[test]
fn missing_session_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = load_session(&temp.path().join("absent.jsonl"));
    assert!(matches!(result, Err(ParseError::NotFound(_))));
}

#[test]
fn project_total_cost_matches_session_sum() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("-home-dev-webapp");
    fs::create_dir(&dir).unwrap();
    write_session(&dir, "a.jsonl", &session_lines("a", &[1.0, 0.25]));
    write_session(&dir, "b.jsonl", &session_lines("b", &[0.75]));
    write_session(&dir, "c.jsonl", &session_lines("c", &[2.0, 0.5, 0.5]));

    let loaded = load_project(&dir).unwrap();
    let project = &loaded.project;

    assert!(loaded.failures.is_empty());
    assert_eq!(project.total_sessions(), 3);
    let session_sum: f64 = project
        .sessions()
        .iter()
        .map(|s| s.metadata().total_cost())
        .sum();
    assert_eq!(project.total_cost(), session_sum);
    assert!((project.total_cost() - 5.0).abs() < 1e-10);
    assert_eq!(project.tool_usage_count()["Bash"], 6);
    assert_eq!(project.project_id(), "-home-dev-webapp");
    assert_eq!(project.name(), "webapp");
}

#[test]
fn project_keeps_loading_after_bad_file() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("-home-dev-webapp");
    fs::create_dir(&dir).unwrap();
    write_session(&dir, "good.jsonl", &session_lines("good", &[0.1]));
    write_session(&dir, "junk.jsonl", &["not json".to_string()]);
    write_session(&dir, "notes.txt", &["ignored".to_string()]);

    let loaded = load_project(&dir).unwrap();

    assert_eq!(loaded.project.total_sessions(), 1);
    assert_eq!(loaded.failures.len(), 1);
    assert!(loaded.failures[0].path.ends_with("junk.jsonl"));
    assert!(matches!(
        loaded.failures[0].error,
        ParseError::EmptySession { .. }
    ));
}

#[test]
fn empty_project_directory_decodes_its_name() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("-srv--hidden-app");
    fs::create_dir(&dir).unwrap();

    let loaded = load_project(&dir).unwrap();

    assert_eq!(loaded.project.project_path(), Path::new("/srv/.hidden/app"));
    assert_eq!(loaded.project.name(), "app");
    assert_eq!(loaded.project.total_cost(), 0.0);
}

#[test]
fn load_project_rejects_non_directories() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("session.jsonl");
    fs::write(&file, "").unwrap();

    assert!(matches!(
        load_project(&file),
        Err(Error::Parse(ParseError::NotADirectory(_)))
    ));
    assert!(matches!(
        load_project(&temp.path().join("missing")),
        Err(Error::Parse(ParseError::NotFound(_)))
    ));
}

#[test]
fn discovery_helpers_list_sorted_entries() {
    let temp = TempDir::new().unwrap();
    let base = temp.path();
    for name in ["-home-dev-b", "-home-dev-a", "scratch"] {
        fs::create_dir(base.join(name)).unwrap();
    }
    let project_dir = base.join("-home-dev-a");
    write_session(&project_dir, "2.jsonl", &[]);
    write_session(&project_dir, "1.jsonl", &[]);
    write_session(&project_dir, "readme.md", &[]);

    let projects = find_projects(base).unwrap();
    let names: Vec<_> = projects
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["-home-dev-a", "-home-dev-b"]);

    let files = find_session_files(&project_dir).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["1.jsonl", "2.jsonl"]);
}

#[test]
fn project_from_encoded_id_starts_empty() {
    let project = Project::from_encoded_id("-home-dev-webapp").unwrap();
    assert_eq!(project.project_path(), Path::new("/home/dev/webapp"));
    assert_eq!(project.total_sessions(), 0);
}
