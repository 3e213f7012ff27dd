//! Workflow escapes: the ad-hoc todo tool used instead of the issue tracker.

use serde::Serialize;
use serde_json::Value;

use crate::analysis::AnalysisContext;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowEscape {
    pub index: usize,
    pub tool_name: String,
    /// Input payload exactly as logged
    pub input: Value,
}

impl WorkflowEscape {
    /// `content` of each entry in a `todos` array, when the payload has one.
    pub fn todo_items(&self) -> Vec<&str> {
        self.input
            .get("todos")
            .and_then(Value::as_array)
            .map(|todos| {
                todos
                    .iter()
                    .filter_map(|t| t.get("content").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn detect(ctx: &AnalysisContext<'_>) -> Vec<WorkflowEscape> {
    let escape_tool = ctx.config.tools.escape.as_str();
    ctx.index
        .invocations()
        .iter()
        .filter(|inv| inv.name == escape_tool)
        .map(|inv| WorkflowEscape {
            index: inv.event_index,
            tool_name: inv.name.to_string(),
            input: inv.input.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bash, tool_use};
    use crate::{AnalysisConfig, Transcript};
    use serde_json::json;

    #[test]
    fn test_todo_tool_calls_are_collected_verbatim() {
        let input = json!({"todos": [
            {"content": "Write parser", "status": "pending"},
            {"content": "Add tests", "status": "in_progress"}
        ]});
        let transcript = Transcript::from_lines(vec![
            bash("a", "bd ready"),
            tool_use("TodoWrite", "t", input.clone()),
        ]);
        let config = AnalysisConfig::default();
        let escapes = detect(&AnalysisContext::new(&transcript, &config));

        assert_eq!(escapes.len(), 1);
        assert_eq!(escapes[0].index, 1);
        assert_eq!(escapes[0].input, input);
        assert_eq!(escapes[0].todo_items(), vec!["Write parser", "Add tests"]);
    }

    #[test]
    fn test_payload_without_todos_has_no_items() {
        let escape = WorkflowEscape {
            index: 0,
            tool_name: "TodoWrite".into(),
            input: json!({"other": 1}),
        };
        assert!(escape.todo_items().is_empty());
    }
}
