//! The message envelope exchanged between steps.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// FlowRunId
// ---------------------------------------------------------------------------

/// Correlation identifier of one flow run.
///
/// Assigned once by the step that originates the run and carried unchanged
/// through every message produced downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowRunId(pub i64);

impl FlowRunId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for FlowRunId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for FlowRunId {
    fn from(id: i32) -> Self {
        Self(i64::from(id))
    }
}

impl fmt::Display for FlowRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for FlowRunId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A message travelling along a flow.
///
/// Host properties other than `payload` and `flow_run_id` (a topic, the host's
/// own message id, ...) are kept in `properties` and passed through untouched.
/// The run id is also read from `flowRunId` and `__orchestrator_run_id`, and
/// always written back as `flow_run_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub payload: Value,

    #[serde(
        default,
        alias = "flowRunId",
        alias = "__orchestrator_run_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub flow_run_id: Option<FlowRunId>,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Message {
    /// A message with the given payload and no correlation.
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    pub fn with_flow_run(mut self, id: impl Into<FlowRunId>) -> Self {
        self.flow_run_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_host_properties_survive_a_round_trip() {
        let raw = json!({ "payload": "abc", "flow_run_id": 42, "topic": "plates" });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(msg.flow_run_id, Some(FlowRunId(42)));
        assert_eq!(msg.properties["topic"], "plates");
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn run_id_is_read_under_its_alternate_names() {
        for key in ["flowRunId", "__orchestrator_run_id"] {
            let mut raw = Map::new();
            raw.insert(key.to_owned(), json!(42));
            raw.insert("payload".to_owned(), json!("abc"));

            let msg: Message = serde_json::from_value(Value::Object(raw)).unwrap();

            assert_eq!(msg.flow_run_id, Some(FlowRunId(42)), "key {key}");
            assert!(msg.properties.is_empty(), "key {key}");
        }
    }

    #[test]
    fn uncorrelated_message_omits_the_run_id() {
        let out = serde_json::to_value(Message::new(1)).unwrap();
        assert_eq!(out, json!({ "payload": 1 }));
    }

    #[test]
    fn run_ids_parse_from_wire_text() {
        assert_eq!(" 17 ".parse::<FlowRunId>().unwrap(), FlowRunId(17));
        assert!("seventeen".parse::<FlowRunId>().is_err());
    }
}
