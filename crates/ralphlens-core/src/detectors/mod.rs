//! Pattern detectors.
//!
//! Each detector is a pure function over an [`AnalysisContext`]; none of them
//! share state, and all scan events strictly in index order.
//!
//! [`AnalysisContext`]: crate::AnalysisContext

pub mod bash_sequences;
pub mod categories;
pub mod environment;
pub mod escapes;
pub mod read_before_edit;
pub mod recovery;
pub mod runs;
pub mod test_attempts;

pub use bash_sequences::{BashSequence, BashStep, StepResult};
pub use categories::{CategoryBreakdown, CategoryCount, Efficiency, EfficiencyBucket};
pub use environment::{EnvironmentIssue, IssueKind};
pub use escapes::WorkflowEscape;
pub use read_before_edit::{EditCheck, ReadBeforeEdit};
pub use recovery::{Recovery, RecoveryFindings};
pub use runs::ToolRun;
pub use test_attempts::{TestAttempt, TestSummary};

#[cfg(test)]
pub(crate) mod fixtures {
    //! JSONL line builders shared by detector tests.

    use serde_json::{json, Value};

    pub fn tool_use(name: &str, id: &str, input: Value) -> String {
        json!({
            "type": "assistant",
            "message": {"content": [{"type": "tool_use", "name": name, "input": input, "id": id}]}
        })
        .to_string()
    }

    pub fn bash(id: &str, command: &str) -> String {
        tool_use("Bash", id, json!({ "command": command }))
    }

    pub fn read(id: &str, path: &str) -> String {
        tool_use("Read", id, json!({ "file_path": path }))
    }

    pub fn edit(id: &str, path: &str) -> String {
        tool_use("Edit", id, json!({ "file_path": path, "old_string": "a", "new_string": "b" }))
    }

    /// One assistant event issuing several Bash commands.
    pub fn multi_bash(calls: &[(&str, &str)]) -> String {
        let blocks: Vec<Value> = calls
            .iter()
            .map(|(id, cmd)| json!({"type": "tool_use", "name": "Bash", "input": {"command": cmd}, "id": id}))
            .collect();
        json!({"type": "assistant", "message": {"content": blocks}}).to_string()
    }

    pub fn result(id: &str, content: &str, is_error: bool) -> String {
        json!({
            "type": "user",
            "message": {"content": [{"type": "tool_result", "tool_use_id": id, "content": content, "is_error": is_error}]}
        })
        .to_string()
    }

    pub fn structured_result(id: &str, is_error: bool) -> String {
        json!({
            "type": "user",
            "message": {"content": [{"type": "tool_result", "tool_use_id": id, "content": [{"type": "text", "text": "missing"}], "is_error": is_error}]}
        })
        .to_string()
    }

    pub fn text(text: &str) -> String {
        json!({"type": "assistant", "message": {"content": [{"type": "text", "text": text}]}}).to_string()
    }

    pub fn thinking(text: &str) -> String {
        json!({"type": "assistant", "message": {"content": [{"type": "thinking", "thinking": text}]}}).to_string()
    }

    pub fn system_init() -> String {
        json!({"type": "system", "subtype": "init", "cwd": "/work", "model": "claude-opus"}).to_string()
    }

    pub fn iteration_start(iteration: i64, issue_id: &str) -> String {
        json!({
            "type": "loop_meta",
            "event": "iteration_start",
            "timestamp": "2026-01-20T10:00:00Z",
            "data": {"iteration": iteration, "mode": "work", "issue_id": issue_id}
        })
        .to_string()
    }

    pub fn iteration_end(iteration: i64, duration_seconds: f64, exit_code: i64) -> String {
        json!({
            "type": "loop_meta",
            "event": "iteration_end",
            "timestamp": "2026-01-20T10:00:42Z",
            "data": {"iteration": iteration, "duration_seconds": duration_seconds, "exit_code": exit_code}
        })
        .to_string()
    }
}
