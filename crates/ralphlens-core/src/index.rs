//! Tool invocation extraction and call-id correlation.

use std::collections::HashMap;
use std::ops::Range;

use serde_json::Value;

use crate::config::ResultLookup;
use crate::event::{ContentBlock, ResultContent};
use crate::transcript::Transcript;

/// A `tool_use` block, located by the event that issued it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolInvocation<'a> {
    pub event_index: usize,
    pub name: &'a str,
    pub input: &'a Value,
    pub call_id: &'a str,
}

impl<'a> ToolInvocation<'a> {
    fn input_str(&self, key: &str) -> &'a str {
        self.input.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Shell command text; empty for other tools.
    pub fn command(&self) -> &'a str {
        self.input_str("command")
    }

    pub fn file_path(&self) -> &'a str {
        self.input_str("file_path")
    }
}

/// A `tool_result` block, located by the event that carried it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolResult<'a> {
    pub event_index: usize,
    pub call_id: &'a str,
    pub content: &'a ResultContent,
    pub is_error: bool,
}

impl<'a> ToolResult<'a> {
    pub fn text(&self) -> Option<&'a str> {
        self.content.as_text()
    }
}

/// Every invocation in event order plus a call-id map of results.
///
/// Results are collected in one pass; [`ResultLookup`] decides which of them
/// a lookup may see.
#[derive(Debug, Clone)]
pub struct ToolCallIndex<'a> {
    invocations: Vec<ToolInvocation<'a>>,
    /// Invocation range per event index
    spans: Vec<Range<usize>>,
    results: HashMap<&'a str, Vec<ToolResult<'a>>>,
    lookup: ResultLookup,
}

impl<'a> ToolCallIndex<'a> {
    pub fn build(transcript: &'a Transcript, lookup: ResultLookup) -> Self {
        let mut invocations = Vec::new();
        let mut spans = Vec::with_capacity(transcript.len());
        let mut results: HashMap<&'a str, Vec<ToolResult<'a>>> = HashMap::new();

        for event in transcript.events() {
            let start = invocations.len();
            if let Some(turn) = event.as_assistant() {
                for block in turn.blocks() {
                    if let ContentBlock::ToolUse {
                        name,
                        input,
                        call_id,
                    } = block
                    {
                        invocations.push(ToolInvocation {
                            event_index: event.index,
                            name,
                            input,
                            call_id,
                        });
                    }
                }
            } else if let Some(turn) = event.as_user() {
                for block in turn.blocks() {
                    if let ContentBlock::ToolResult {
                        call_id,
                        content,
                        is_error,
                    } = block
                    {
                        results.entry(call_id.as_str()).or_default().push(ToolResult {
                            event_index: event.index,
                            call_id,
                            content,
                            is_error: *is_error,
                        });
                    }
                }
            }
            spans.push(start..invocations.len());
        }

        Self {
            invocations,
            spans,
            results,
            lookup,
        }
    }

    pub fn invocations(&self) -> &[ToolInvocation<'a>] {
        &self.invocations
    }

    /// Invocations issued by the event at `event_index`.
    pub fn invocations_at(&self, event_index: usize) -> &[ToolInvocation<'a>] {
        self.spans
            .get(event_index)
            .map(|span| &self.invocations[span.clone()])
            .unwrap_or_default()
    }

    /// First result for `call_id` at or after `search_start` that the lookup
    /// policy admits. Under a horizon of `h` only `[search_start, search_start + h)`
    /// is considered.
    pub fn find_result(&self, call_id: &str, search_start: usize) -> Option<&ToolResult<'a>> {
        let limit = match self.lookup {
            ResultLookup::Horizon { horizon } => search_start.saturating_add(horizon),
            ResultLookup::Exact => usize::MAX,
        };
        self.results
            .get(call_id)?
            .iter()
            .find(|r| r.event_index >= search_start && r.event_index < limit)
    }

    /// The result matched to an invocation, searching from its own event.
    pub fn result_for(&self, invocation: &ToolInvocation<'_>) -> Option<&ToolResult<'a>> {
        self.find_result(invocation.call_id, invocation.event_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_use(name: &str, id: &str) -> String {
        format!(
            r#"{{"type":"assistant","message":{{"content":[{{"type":"tool_use","name":"{}","input":{{"command":"ls"}},"id":"{}"}}]}}}}"#,
            name, id
        )
    }

    fn tool_result(id: &str) -> String {
        format!(
            r#"{{"type":"user","message":{{"content":[{{"type":"tool_result","tool_use_id":"{}","content":"ok","is_error":false}}]}}}}"#,
            id
        )
    }

    fn filler() -> String {
        r#"{"type":"assistant","message":{"content":[{"type":"text","text":"..."}]}}"#.to_string()
    }

    /// Invocation at 0, result at `distance`.
    fn transcript_with_gap(distance: usize) -> Transcript {
        let mut lines = vec![tool_use("Bash", "call-1")];
        for _ in 1..distance {
            lines.push(filler());
        }
        lines.push(tool_result("call-1"));
        Transcript::from_lines(lines)
    }

    #[test]
    fn test_result_inside_horizon_is_found() {
        let transcript = transcript_with_gap(9);
        let index = ToolCallIndex::build(&transcript, ResultLookup::default());
        let result = index.find_result("call-1", 0).unwrap();
        assert_eq!(result.event_index, 9);
        assert_eq!(result.text(), Some("ok"));
    }

    #[test]
    fn test_result_at_horizon_is_absent() {
        let transcript = transcript_with_gap(10);
        let index = ToolCallIndex::build(&transcript, ResultLookup::default());
        assert!(index.find_result("call-1", 0).is_none());
    }

    #[test]
    fn test_exact_lookup_ignores_horizon() {
        let transcript = transcript_with_gap(25);
        let index = ToolCallIndex::build(&transcript, ResultLookup::Exact);
        assert_eq!(index.find_result("call-1", 0).unwrap().event_index, 25);
    }

    #[test]
    fn test_results_before_search_start_are_ignored() {
        let transcript = Transcript::from_lines(vec![tool_result("a"), tool_use("Bash", "a")]);
        let index = ToolCallIndex::build(&transcript, ResultLookup::Exact);
        assert!(index.find_result("a", 1).is_none());
        assert!(index.find_result("a", 0).is_some());
    }

    #[test]
    fn test_invocations_by_event() {
        let transcript = Transcript::from_lines(vec![
            tool_use("Read", "r1"),
            tool_result("r1"),
            tool_use("Bash", "b1"),
        ]);
        let index = ToolCallIndex::build(&transcript, ResultLookup::default());
        assert_eq!(index.invocations().len(), 2);
        assert_eq!(index.invocations_at(0)[0].name, "Read");
        assert!(index.invocations_at(1).is_empty());
        assert_eq!(index.invocations_at(2)[0].command(), "ls");
        assert!(index.invocations_at(99).is_empty());

        let bash = index.invocations_at(2)[0];
        assert!(index.result_for(&bash).is_none());
        let read = index.invocations_at(0)[0];
        assert_eq!(index.result_for(&read).unwrap().event_index, 1);
    }
}
