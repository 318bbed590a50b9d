//! Session log fixtures shared by command tests.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{Value, json};

pub fn uuid(n: usize) -> String {
    format!("00000000-0000-4000-8000-{n:012}")
}

/// One turn of a fixture session.
pub struct Turn {
    pub session: &'static str,
    pub timestamp: &'static str,
    pub cost: Option<f64>,
    pub tools: &'static [&'static str],
}

fn record(n: usize, cwd: &str, turn: &Turn) -> Value {
    let role = if turn.tools.is_empty() { "user" } else { "assistant" };
    let mut content = vec![json!({"type": "text", "text": "step"})];
    content.extend(turn.tools.iter().enumerate().map(|(i, name)| {
        json!({"type": "tool_use", "id": format!("toolu_{n}_{i}"), "name": name, "input": {}})
    }));
    let mut value = json!({
        "parentUuid": (n > 1).then(|| uuid(n - 1)),
        "isSidechain": false,
        "userType": "external",
        "cwd": cwd,
        "sessionId": turn.session,
        "version": "1.0.17",
        "type": role,
        "message": {"role": role, "content": content},
        "uuid": uuid(n),
        "timestamp": turn.timestamp
    });
    if let Some(cost) = turn.cost {
        value["costUSD"] = json!(cost);
    }
    value
}

/// Writes `turns` recorded in `/home/dev/webapp` as a linear thread,
/// followed by `extra` raw lines.
pub fn write_session(path: &Path, turns: &[Turn], extra: &[&str]) {
    write_session_in(path, "/home/dev/webapp", turns, extra);
}

pub fn write_session_in(path: &Path, cwd: &str, turns: &[Turn], extra: &[&str]) {
    let mut file = fs::File::create(path).unwrap();
    for (i, turn) in turns.iter().enumerate() {
        writeln!(file, "{}", record(i + 1, cwd, turn)).unwrap();
    }
    for line in extra {
        writeln!(file, "{line}").unwrap();
    }
}
