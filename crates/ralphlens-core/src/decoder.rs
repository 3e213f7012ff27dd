//! Line decoder with a bounded repair policy.
//!
//! The harness occasionally writes records with stray closing braces. A line
//! is first decoded strictly; on failure each [`RepairRule`] is tried in
//! order until one yields valid JSON. Anything still undecodable is dropped.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::event::{Event, EventKind};

const LOOP_META_TAG: &str = "\"loop_meta\"";

/// One repair strategy for a line that failed strict decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RepairRule {
    /// A `loop_meta` line ending in `}}` has one brace removed, tried once.
    LoopMetaDoubleBrace,
    /// Strip one trailing `}` at a time, retrying after each, up to `max_strips`.
    TrailingBrace { max_strips: usize },
}

impl RepairRule {
    fn apply(&self, line: &str) -> Option<Value> {
        match *self {
            RepairRule::LoopMetaDoubleBrace => {
                if line.contains(LOOP_META_TAG) && line.ends_with("}}") {
                    serde_json::from_str(&line[..line.len() - 1]).ok()
                } else {
                    None
                }
            }
            RepairRule::TrailingBrace { max_strips } => {
                let mut candidate = line;
                for _ in 0..max_strips {
                    candidate = candidate.strip_suffix('}')?;
                    if let Ok(value) = serde_json::from_str(candidate) {
                        return Some(value);
                    }
                }
                None
            }
        }
    }
}

/// A successfully decoded line, before it is given a transcript index.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub kind: EventKind,
    /// The rule that made the line decodable, if strict decoding failed
    pub repaired_by: Option<RepairRule>,
}

impl Decoded {
    pub fn into_event(self, index: usize) -> Event {
        Event::new(index, self.kind)
    }
}

/// Turns transcript lines into records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoder {
    rules: Vec<RepairRule>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(vec![
            RepairRule::LoopMetaDoubleBrace,
            RepairRule::TrailingBrace { max_strips: 3 },
        ])
    }
}

impl Decoder {
    pub fn new(rules: Vec<RepairRule>) -> Self {
        Self { rules }
    }

    /// Decoder that never repairs.
    pub fn strict() -> Self {
        Self::new(Vec::new())
    }

    /// Decode one line. Blank lines, undecodable lines and JSON that is not a
    /// non-empty object all yield `None`.
    pub fn decode(&self, line: &str) -> Option<Decoded> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (value, repaired_by) = match serde_json::from_str::<Value>(line) {
            Ok(value) => (value, None),
            Err(_) => {
                let (value, rule) = self
                    .rules
                    .iter()
                    .find_map(|rule| rule.apply(line).map(|value| (value, *rule)))?;
                debug!(?rule, "Repaired malformed line");
                (value, Some(rule))
            }
        };

        EventKind::from_value(value).map(|kind| Decoded { kind, repaired_by })
    }
}
