//! Chronological trace of a session for stream-style rendering.

use serde::Serialize;
use serde_json::Value;

use crate::config::AnalysisConfig;
use crate::event::{ContentBlock, EventKind, LoopEvent};
use crate::text::{excerpt, single_line};
use crate::transcript::Transcript;

const TIMESTAMP_CHARS: usize = 19;
const MODEL_CHARS: usize = 30;
const THINKING_CHARS: usize = 150;
const THOUGHT_CHARS: usize = 120;
const COMMAND_CHARS: usize = 70;
const INPUT_CHARS: usize = 60;
const ERROR_CHARS: usize = 80;
const RESULT_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEntry {
    IterationStart {
        index: usize,
        timestamp: String,
        iteration: Option<i64>,
        mode: Option<String>,
        issue_id: Option<String>,
    },
    IterationEnd {
        index: usize,
        timestamp: String,
        iteration: Option<i64>,
        duration_seconds: Option<f64>,
        exit_code: Option<i64>,
    },
    Init {
        index: usize,
        cwd: Option<String>,
        model: String,
    },
    Thinking {
        index: usize,
        text: String,
    },
    Thought {
        index: usize,
        text: String,
    },
    Shell {
        index: usize,
        command: String,
    },
    Read {
        index: usize,
        file_path: String,
    },
    Edit {
        index: usize,
        file_path: String,
    },
    Write {
        index: usize,
        file_path: String,
    },
    Tool {
        index: usize,
        name: String,
        input: String,
    },
    /// Error result; `preview` is `None` for structured output
    Error {
        index: usize,
        preview: Option<String>,
    },
    Result {
        index: usize,
        preview: Option<String>,
    },
}

impl TraceEntry {
    pub fn index(&self) -> usize {
        match self {
            TraceEntry::IterationStart { index, .. }
            | TraceEntry::IterationEnd { index, .. }
            | TraceEntry::Init { index, .. }
            | TraceEntry::Thinking { index, .. }
            | TraceEntry::Thought { index, .. }
            | TraceEntry::Shell { index, .. }
            | TraceEntry::Read { index, .. }
            | TraceEntry::Edit { index, .. }
            | TraceEntry::Write { index, .. }
            | TraceEntry::Tool { index, .. }
            | TraceEntry::Error { index, .. }
            | TraceEntry::Result { index, .. } => *index,
        }
    }
}

fn tool_entry(config: &AnalysisConfig, index: usize, name: &str, input: &Value) -> TraceEntry {
    let tools = &config.tools;
    let str_field = |key: &str| {
        input
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    if name == tools.shell {
        TraceEntry::Shell {
            index,
            command: single_line(&str_field("command"), COMMAND_CHARS),
        }
    } else if name == tools.read {
        TraceEntry::Read {
            index,
            file_path: str_field("file_path"),
        }
    } else if name == tools.edit {
        TraceEntry::Edit {
            index,
            file_path: str_field("file_path"),
        }
    } else if name == tools.write {
        TraceEntry::Write {
            index,
            file_path: str_field("file_path"),
        }
    } else {
        TraceEntry::Tool {
            index,
            name: name.to_string(),
            input: excerpt(&input.to_string(), INPUT_CHARS),
        }
    }
}

/// Every noteworthy block in event order. Thinking blocks and successful
/// results are included only when `verbose`.
pub fn trace(transcript: &Transcript, config: &AnalysisConfig, verbose: bool) -> Vec<TraceEntry> {
    let mut entries = Vec::new();

    for event in transcript.events() {
        let index = event.index;
        match &event.kind {
            EventKind::LoopMeta(meta) => {
                let timestamp = excerpt(&meta.timestamp, TIMESTAMP_CHARS);
                match meta.event_kind {
                    LoopEvent::IterationStart => entries.push(TraceEntry::IterationStart {
                        index,
                        timestamp,
                        iteration: meta.iteration(),
                        mode: meta.mode().map(String::from),
                        issue_id: meta.issue_id().map(String::from),
                    }),
                    LoopEvent::IterationEnd => entries.push(TraceEntry::IterationEnd {
                        index,
                        timestamp,
                        iteration: meta.iteration(),
                        duration_seconds: meta.data.get("duration_seconds").and_then(Value::as_f64),
                        exit_code: meta.data.get("exit_code").and_then(Value::as_i64),
                    }),
                    LoopEvent::Unknown => {}
                }
            }
            EventKind::System(system) if system.is_init() => entries.push(TraceEntry::Init {
                index,
                cwd: system.cwd.clone(),
                model: excerpt(system.model.as_deref().unwrap_or("unknown"), MODEL_CHARS),
            }),
            EventKind::Assistant(turn) => {
                for block in turn.blocks() {
                    match block {
                        ContentBlock::Thinking { thinking } if verbose => {
                            entries.push(TraceEntry::Thinking {
                                index,
                                text: single_line(thinking, THINKING_CHARS),
                            })
                        }
                        ContentBlock::Text { text } => entries.push(TraceEntry::Thought {
                            index,
                            text: single_line(text, THOUGHT_CHARS),
                        }),
                        ContentBlock::ToolUse { name, input, .. } => {
                            entries.push(tool_entry(config, index, name, input))
                        }
                        _ => {}
                    }
                }
            }
            EventKind::User(turn) => {
                for block in turn.blocks() {
                    let ContentBlock::ToolResult {
                        content, is_error, ..
                    } = block
                    else {
                        continue;
                    };
                    if *is_error {
                        entries.push(TraceEntry::Error {
                            index,
                            preview: content.as_text().map(|t| single_line(t, ERROR_CHARS)),
                        });
                    } else if verbose {
                        entries.push(TraceEntry::Result {
                            index,
                            preview: content.as_text().map(|t| single_line(t, RESULT_CHARS)),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{
        bash, edit, iteration_end, iteration_start, read, result, structured_result, system_init,
        text, thinking, tool_use,
    };
    use serde_json::json;

    fn sample() -> Transcript {
        Transcript::from_lines(vec![
            iteration_start(1, "ab-1"),
            system_init(),
            thinking("pondering"),
            text("Looking around\nfirst"),
            bash("a", "ls\n-la"),
            result("a", "src", false),
            read("b", "src/lib.rs"),
            edit("c", "src/lib.rs"),
            tool_use("Grep", "d", json!({"pattern": "fn main"})),
            structured_result("d", true),
            iteration_end(1, 42.0, 0),
        ])
    }

    #[test]
    fn test_compact_trace_skips_thinking_and_plain_results() {
        let entries = trace(&sample(), &AnalysisConfig::default(), false);
        assert_eq!(entries.len(), 9);
        assert!(matches!(&entries[0], TraceEntry::IterationStart { issue_id: Some(id), .. } if id == "ab-1"));
        assert!(matches!(&entries[1], TraceEntry::Init { model, .. } if model == "claude-opus"));
        assert!(matches!(&entries[2], TraceEntry::Thought { text, .. } if text == "Looking around first"));
        assert!(matches!(&entries[3], TraceEntry::Shell { command, .. } if command == "ls -la"));
        assert!(matches!(&entries[4], TraceEntry::Read { .. }));
        assert!(matches!(&entries[5], TraceEntry::Edit { .. }));
        assert!(matches!(&entries[6], TraceEntry::Tool { name, .. } if name == "Grep"));
        assert!(matches!(&entries[7], TraceEntry::Error { preview: None, .. }));
        assert!(matches!(&entries[8], TraceEntry::IterationEnd { exit_code: Some(0), .. }));
    }

    #[test]
    fn test_verbose_trace_includes_everything() {
        let entries = trace(&sample(), &AnalysisConfig::default(), true);
        assert_eq!(entries.len(), 11);
        assert!(entries.windows(2).all(|w| w[0].index() <= w[1].index()));
        assert!(entries.iter().any(|e| matches!(e, TraceEntry::Thinking { .. })));
        assert!(entries
            .iter()
            .any(|e| matches!(e, TraceEntry::Result { preview: Some(p), .. } if p == "src")));
    }
}
