//! Recorded gesture scripts: a list of page-space input events.

use std::fs;
use std::path::Path;

use camera::InputEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::Io(msg) => write!(f, "script read error: {msg}"),
            ScriptError::Parse(msg) => write!(f, "script parse error: {msg}"),
        }
    }
}

impl std::error::Error for ScriptError {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,
    pub events: Vec<InputEvent>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ScriptError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Accepts either `{"name": .., "events": [..]}` or a bare event array.
    /// Events are ordered by timestamp; equal timestamps keep file order.
    pub fn from_json(text: &str) -> Result<Self, ScriptError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            Script(Script),
            Events(Vec<InputEvent>),
        }

        let doc: Document =
            serde_json::from_str(text).map_err(|e| ScriptError::Parse(e.to_string()))?;
        let mut script = match doc {
            Document::Script(s) => s,
            Document::Events(events) => Script { name: None, events },
        };
        if let Some(bad) = script.events.iter().find(|e| !e.timestamp_ms.is_finite()) {
            return Err(ScriptError::Parse(format!(
                "non-finite timestamp on {:?} event",
                bad.event_type()
            )));
        }
        script
            .events
            .sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::{Script, ScriptError};
    use camera::EventType;

    #[test]
    fn parses_named_script() {
        let script = Script::from_json(
            r#"{"name": "pan east", "events": [
                {"timestamp_ms": 0, "type": "panstart", "pos": [600, 500]},
                {"timestamp_ms": 16, "type": "panmove", "pos": [640, 500]},
                {"timestamp_ms": 32, "type": "panend", "pos": [640, 500]}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(script.name.as_deref(), Some("pan east"));
        assert_eq!(script.events.len(), 3);
        assert_eq!(script.events[2].event_type(), EventType::PanEnd);
    }

    #[test]
    fn bare_array_is_sorted_by_time() {
        let script = Script::from_json(
            r#"[
                {"timestamp_ms": 20, "type": "keydown", "key": "-"},
                {"timestamp_ms": 5, "type": "wheel", "pos": [10, 10], "delta": 3}
            ]"#,
        )
        .expect("parse");
        assert!(script.name.is_none());
        assert_eq!(script.events[0].event_type(), EventType::Wheel);
        assert_eq!(script.events[1].event_type(), EventType::KeyDown);
    }

    #[test]
    fn unknown_event_type_is_a_parse_error() {
        let err = Script::from_json(r#"[{"timestamp_ms": 0, "type": "pinch", "pos": [0, 0]}]"#)
            .expect_err("unknown type");
        assert!(matches!(err, ScriptError::Parse(_)));
    }
}
