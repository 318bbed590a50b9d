//! Record fixtures shared by unit tests.

use serde_json::{Value, json};

use crate::model::{MessageRecord, decode_record_value};

pub const U1: &str = "6f1c0d8e-3c1a-4a57-9d1b-0a3e4c2f7b11";
pub const U2: &str = "2b7e9f40-5d3c-4e21-8a6f-1c9d0e7b3a22";
pub const U3: &str = "9a4d2c61-7e8f-4b30-a1c2-3d4e5f607183";
pub const U4: &str = "c3b2a190-8f7e-4d6c-b5a4-938271605f44";
pub const U5: &str = "0e1f2a3b-4c5d-4e6f-8a9b-0c1d2e3f4a55";

/// A minimal valid user record.
pub fn record_json(uuid: &str, parent: Option<&str>) -> Value {
    json!({
        "parentUuid": parent,
        "isSidechain": false,
        "userType": "external",
        "cwd": "/home/dev/project",
        "sessionId": "session-1",
        "version": "1.0.17",
        "type": "user",
        "message": {"role": "user", "content": [{"type": "text", "text": "hello"}]},
        "uuid": uuid,
        "timestamp": "2025-06-01T10:00:00.000Z"
    })
}

/// Builder over [`record_json`] for tests that need a handful of variations.
pub struct TestRecord(Value);

impl TestRecord {
    pub fn new(uuid: &str) -> Self {
        Self(record_json(uuid, None))
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.0["parentUuid"] = json!(parent);
        self
    }

    pub fn session(mut self, session_id: &str) -> Self {
        self.0["sessionId"] = json!(session_id);
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.0["costUSD"] = json!(cost);
        self
    }

    pub fn sidechain(mut self) -> Self {
        self.0["isSidechain"] = json!(true);
        self
    }

    pub fn at(mut self, timestamp: &str) -> Self {
        self.0["timestamp"] = json!(timestamp);
        self
    }

    /// Turns the record into an assistant turn invoking `tools` as `(id, name)`.
    pub fn assistant_tools(mut self, tools: &[(&str, &str)]) -> Self {
        let mut content = vec![json!({"type": "text", "text": "working"})];
        content.extend(tools.iter().map(|(id, name)| {
            json!({"type": "tool_use", "id": id, "name": name, "input": {}})
        }));
        self.0["type"] = json!("assistant");
        self.0["message"] = json!({"role": "assistant", "content": content});
        self
    }

    pub fn tool_result(mut self, result: Value) -> Self {
        self.0["toolUseResult"] = result;
        self
    }

    pub fn json(self) -> Value {
        self.0
    }

    pub fn build(self) -> MessageRecord {
        decode_record_value(self.0).expect("fixture record must be valid")
    }
}
