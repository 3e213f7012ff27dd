use serde::Serialize;

use crate::analysis::AnalysisContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    /// `bd update <id> ... in_progress`
    Start,
    /// `bd close <id>`
    Close,
}

/// An issue claimed or closed through the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskTransition {
    pub action: TaskAction,
    pub task_id: String,
    pub index: usize,
    /// Events since the previous transition (since event 0 for the first)
    pub events_since: usize,
}

fn task_id(command: &str) -> String {
    command
        .split_whitespace()
        .nth(2)
        .unwrap_or("unknown")
        .to_string()
}

pub fn task_timeline(ctx: &AnalysisContext<'_>) -> Vec<TaskTransition> {
    let mut timeline = Vec::new();
    let mut previous = 0;

    for invocation in ctx.shell_invocations() {
        let command = invocation.command();
        let action = if command.contains("bd update") && command.contains("in_progress") {
            TaskAction::Start
        } else if command.contains("bd close") {
            TaskAction::Close
        } else {
            continue;
        };

        let index = invocation.event_index;
        timeline.push(TaskTransition {
            action,
            task_id: task_id(command),
            index,
            events_since: index.saturating_sub(previous),
        });
        previous = index;
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bash, text};
    use crate::{AnalysisConfig, Transcript};

    #[test]
    fn test_claims_and_closes_in_order() {
        let transcript = Transcript::from_lines(vec![
            text("orient"),
            bash("a", "bd update ab-3 --status in_progress"),
            text("work"),
            text("work"),
            bash("b", "bd close ab-3"),
            bash("c", "bd update ab-4 --priority 1"),
            bash("d", "bd close"),
        ]);
        let config = AnalysisConfig::default();
        let timeline = task_timeline(&AnalysisContext::new(&transcript, &config));

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].action, TaskAction::Start);
        assert_eq!(timeline[0].task_id, "ab-3");
        assert_eq!(timeline[0].events_since, 1);
        assert_eq!(timeline[1].action, TaskAction::Close);
        assert_eq!(timeline[1].events_since, 3);
        assert_eq!(timeline[2].task_id, "unknown");
    }
}
