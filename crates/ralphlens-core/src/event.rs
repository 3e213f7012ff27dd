//! Transcript records.
//!
//! The log is produced by an external harness and is not always consistent,
//! so every field defaults when absent or of the wrong shape. A record only
//! fails to materialise when the line is not a JSON object at all.

use chrono::{DateTime, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One decoded transcript line with its stable position.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// 0-based position among the non-dropped lines
    pub index: usize,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    LoopMeta(LoopMeta),
    System(SystemRecord),
    Assistant(Turn),
    User(Turn),
    /// Valid record with an unrecognised `type`; kept so indices stay aligned
    Other(Map<String, Value>),
}

/// Borrowed wire shape used to re-serialise known records.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireRecord<'a> {
    LoopMeta(&'a LoopMeta),
    System(&'a SystemRecord),
    Assistant(&'a Turn),
    User(&'a Turn),
}

impl EventKind {
    /// Build a record from decoded JSON. Non-objects and empty objects yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.is_empty() {
            return None;
        }
        let record_type = object
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let kind = match record_type.as_str() {
            "loop_meta" => serde_json::from_value(value.clone()).ok().map(EventKind::LoopMeta),
            "system" => serde_json::from_value(value.clone()).ok().map(EventKind::System),
            "assistant" => serde_json::from_value(value.clone()).ok().map(EventKind::Assistant),
            "user" => serde_json::from_value(value.clone()).ok().map(EventKind::User),
            _ => None,
        };

        match kind {
            Some(kind) => Some(kind),
            None => match value {
                Value::Object(map) => Some(EventKind::Other(map)),
                _ => None,
            },
        }
    }

    /// The `type` discriminant as it appears on the wire.
    pub fn type_name(&self) -> &str {
        match self {
            EventKind::LoopMeta(_) => "loop_meta",
            EventKind::System(_) => "system",
            EventKind::Assistant(_) => "assistant",
            EventKind::User(_) => "user",
            EventKind::Other(map) => map.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }

    /// Serialise back to the transcript's JSON shape.
    pub fn to_value(&self) -> Value {
        let wire = match self {
            EventKind::LoopMeta(meta) => WireRecord::LoopMeta(meta),
            EventKind::System(system) => WireRecord::System(system),
            EventKind::Assistant(turn) => WireRecord::Assistant(turn),
            EventKind::User(turn) => WireRecord::User(turn),
            EventKind::Other(map) => return Value::Object(map.clone()),
        };
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }
}

impl Event {
    pub fn new(index: usize, kind: EventKind) -> Self {
        Self { index, kind }
    }

    pub fn to_line(&self) -> String {
        self.kind.to_value().to_string()
    }

    pub fn as_assistant(&self) -> Option<&Turn> {
        match &self.kind {
            EventKind::Assistant(turn) => Some(turn),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&Turn> {
        match &self.kind {
            EventKind::User(turn) => Some(turn),
            _ => None,
        }
    }

    pub fn as_loop_meta(&self) -> Option<&LoopMeta> {
        match &self.kind {
            EventKind::LoopMeta(meta) => Some(meta),
            _ => None,
        }
    }
}

/// Loop marker kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopEvent {
    IterationStart,
    IterationEnd,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Iteration boundary written by the loop harness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopMeta {
    #[serde(rename = "event", default, deserialize_with = "lenient")]
    pub event_kind: LoopEvent,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Map<String, Value>,
}

impl LoopMeta {
    pub fn iteration(&self) -> Option<i64> {
        self.data.get("iteration").and_then(Value::as_i64)
    }

    pub fn mode(&self) -> Option<&str> {
        self.data.get("mode").and_then(Value::as_str)
    }

    pub fn issue_id(&self) -> Option<&str> {
        self.data.get("issue_id").and_then(Value::as_str)
    }

    /// Seconds spent in the iteration; 0 when absent.
    pub fn duration_seconds(&self) -> f64 {
        self.data
            .get("duration_seconds")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Harness exit code; -1 when absent.
    pub fn exit_code(&self) -> i64 {
        self.data.get("exit_code").and_then(Value::as_i64).unwrap_or(-1)
    }

    /// Timestamp with any offset or fractional seconds dropped.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        if self.timestamp.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.naive_local());
        }
        let trimmed = self.timestamp.split('.').next().unwrap_or_default();
        let trimmed = trimmed.trim_end_matches('Z').trim_end_matches("+00:00");
        NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S").ok()
    }
}

/// `system` record; only `init` is meaningful to the analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub subtype: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SystemRecord {
    pub fn is_init(&self) -> bool {
        self.subtype == "init"
    }
}

/// An assistant or user turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Message,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient_blocks")]
    pub content: Vec<ContentBlock>,
}

impl Turn {
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.message.content
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Thinking {
        #[serde(default, deserialize_with = "lenient")]
        thinking: String,
    },
    Text {
        #[serde(default, deserialize_with = "lenient")]
        text: String,
    },
    ToolUse {
        #[serde(default, deserialize_with = "lenient")]
        name: String,
        #[serde(default = "empty_input")]
        input: Value,
        #[serde(rename = "id", default, deserialize_with = "lenient")]
        call_id: String,
    },
    ToolResult {
        #[serde(rename = "tool_use_id", default, deserialize_with = "lenient")]
        call_id: String,
        #[serde(default)]
        content: ResultContent,
        #[serde(default, deserialize_with = "lenient")]
        is_error: bool,
    },
    /// Block types the analysis does not use
    #[serde(other)]
    Unsupported,
}

/// Tool result payload; only text is ever scanned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultContent {
    Text(String),
    Structured(Value),
}

impl Default for ResultContent {
    fn default() -> Self {
        ResultContent::Text(String::new())
    }
}

impl ResultContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResultContent::Text(text) => Some(text),
            ResultContent::Structured(_) => None,
        }
    }
}

fn empty_input() -> Value {
    Value::Object(Map::new())
}

/// Accept any JSON for a field, falling back to the default on a shape mismatch.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Keep the blocks that decode; drop the rest. A non-array yields no blocks.
fn lenient_blocks<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
