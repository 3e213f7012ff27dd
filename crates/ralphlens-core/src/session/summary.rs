use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::event::{ContentBlock, LoopEvent};
use crate::text::single_line;

const NARRATIVE_SPAN: usize = 3;

/// Iteration markers written by the loop harness.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IterationSummary {
    pub started: usize,
    /// Number of `iteration_end` markers
    pub completed: usize,
    pub total_seconds: f64,
    /// Completed iterations whose exit code was non-zero or missing
    pub failures: usize,
    /// Sorted, de-duplicated
    pub issues_started: Vec<String>,
    /// Timestamp of the first `iteration_start` that has one
    pub first_started_at: Option<NaiveDateTime>,
    /// Timestamp of the last `iteration_end` that has one
    pub last_ended_at: Option<NaiveDateTime>,
    /// Elapsed time between those two markers, when both parse and are ordered
    pub wall_clock_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolUsage {
    pub name: String,
    pub count: usize,
}

/// Issue-tracker (`bd`) commands issued through the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerCommands {
    pub commands: Vec<String>,
    pub creates: usize,
    pub updates: usize,
    pub closes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeEntry {
    pub index: usize,
    pub text: String,
}

/// Opening and closing assistant text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub first: Vec<NarrativeEntry>,
    pub last: Vec<NarrativeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInit {
    pub cwd: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub init: Option<SessionInit>,
    pub iterations: IterationSummary,
    pub total_invocations: usize,
    /// Most used first
    pub tool_usage: Vec<ToolUsage>,
    /// Tool results flagged as errors
    pub tool_errors: usize,
    pub tracker: TrackerCommands,
    pub narrative: Narrative,
}

fn is_tracker_command(command: &str) -> bool {
    command.starts_with("bd ") || command.contains(" bd ")
}

fn iteration_summary(ctx: &AnalysisContext<'_>) -> IterationSummary {
    let mut summary = IterationSummary::default();
    let mut issues = BTreeSet::new();

    for (_, meta) in ctx.transcript.loop_markers() {
        match meta.event_kind {
            LoopEvent::IterationStart => {
                summary.started += 1;
                if summary.first_started_at.is_none() {
                    summary.first_started_at = meta.parsed_timestamp();
                }
                if let Some(issue) = meta.issue_id().filter(|id| !id.is_empty()) {
                    issues.insert(issue.to_string());
                }
            }
            LoopEvent::IterationEnd => {
                summary.completed += 1;
                summary.total_seconds += meta.duration_seconds();
                if let Some(ended) = meta.parsed_timestamp() {
                    summary.last_ended_at = Some(ended);
                }
                if meta.exit_code() != 0 {
                    summary.failures += 1;
                }
            }
            LoopEvent::Unknown => {}
        }
    }

    summary.issues_started = issues.into_iter().collect();
    if let (Some(start), Some(end)) = (summary.first_started_at, summary.last_ended_at) {
        let elapsed = end - start;
        if elapsed >= chrono::Duration::zero() {
            summary.wall_clock_seconds = Some(elapsed.num_milliseconds() as f64 / 1000.0);
        }
    }
    summary
}

fn tool_usage(ctx: &AnalysisContext<'_>) -> Vec<ToolUsage> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for invocation in ctx.index.invocations() {
        *counts.entry(invocation.name).or_insert(0) += 1;
    }
    let mut usage: Vec<ToolUsage> = counts
        .into_iter()
        .map(|(name, count)| ToolUsage {
            name: name.to_string(),
            count,
        })
        .collect();
    usage.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    usage
}

fn tracker_commands(ctx: &AnalysisContext<'_>) -> TrackerCommands {
    let mut tracker = TrackerCommands::default();
    for invocation in ctx.shell_invocations() {
        let command = invocation.command();
        if !is_tracker_command(command) {
            continue;
        }
        if command.contains("bd create") {
            tracker.creates += 1;
        }
        if command.contains("bd update") {
            tracker.updates += 1;
        }
        if command.contains("bd close") {
            tracker.closes += 1;
        }
        tracker.commands.push(command.to_string());
    }
    tracker
}

fn narrative(ctx: &AnalysisContext<'_>) -> Narrative {
    let limit = ctx.config.excerpts.narrative;
    let thoughts: Vec<NarrativeEntry> = ctx
        .transcript
        .assistant_turns()
        .flat_map(|(index, turn)| {
            turn.blocks().iter().filter_map(move |block| match block {
                ContentBlock::Text { text } => Some(NarrativeEntry {
                    index,
                    text: single_line(text, limit),
                }),
                _ => None,
            })
        })
        .collect();

    let tail_start = thoughts.len().saturating_sub(NARRATIVE_SPAN);
    Narrative {
        first: thoughts.iter().take(NARRATIVE_SPAN).cloned().collect(),
        last: thoughts[tail_start..].to_vec(),
    }
}

pub fn summarize(ctx: &AnalysisContext<'_>) -> SessionSummary {
    let tool_errors = ctx
        .transcript
        .user_turns()
        .flat_map(|(_, turn)| turn.blocks())
        .filter(|b| matches!(b, ContentBlock::ToolResult { is_error: true, .. }))
        .count();

    SessionSummary {
        init: ctx.transcript.system_init().map(|init| SessionInit {
            cwd: init.cwd.clone(),
            model: init.model.clone(),
        }),
        iterations: iteration_summary(ctx),
        total_invocations: ctx.index.invocations().len(),
        tool_usage: tool_usage(ctx),
        tool_errors,
        tracker: tracker_commands(ctx),
        narrative: narrative(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{
        bash, iteration_end, iteration_start, read, result, system_init, text,
    };
    use crate::{AnalysisConfig, Transcript};

    fn summary_for(lines: Vec<String>) -> SessionSummary {
        let transcript = Transcript::from_lines(lines);
        let config = AnalysisConfig::default();
        summarize(&AnalysisContext::new(&transcript, &config))
    }

    #[test]
    fn test_iteration_totals() {
        let summary = summary_for(vec![
            iteration_start(1, "ab-2"),
            iteration_end(1, 30.0, 0),
            iteration_start(2, "ab-1"),
            iteration_end(2, 12.5, 1),
            iteration_start(3, "ab-1"),
            r#"{"type":"loop_meta","event":"iteration_end","data":{}}"#.to_string(),
        ]);
        let iterations = summary.iterations;
        assert_eq!(iterations.started, 3);
        assert_eq!(iterations.completed, 3);
        assert_eq!(iterations.total_seconds, 42.5);
        assert_eq!(iterations.failures, 2);
        assert_eq!(iterations.issues_started, vec!["ab-1", "ab-2"]);
        assert_eq!(iterations.wall_clock_seconds, Some(42.0));
        assert_eq!(
            iterations.first_started_at.unwrap().to_string(),
            "2026-01-20 10:00:00"
        );
    }

    #[test]
    fn test_wall_clock_needs_both_timestamps() {
        let summary = summary_for(vec![
            iteration_start(1, "ab-1"),
            r#"{"type":"loop_meta","event":"iteration_end","timestamp":"not a time","data":{}}"#
                .to_string(),
        ]);
        assert!(summary.iterations.first_started_at.is_some());
        assert!(summary.iterations.last_ended_at.is_none());
        assert!(summary.iterations.wall_clock_seconds.is_none());
    }

    #[test]
    fn test_wall_clock_ignores_reversed_markers() {
        let summary = summary_for(vec![
            r#"{"type":"loop_meta","event":"iteration_start","timestamp":"2026-01-20T11:00:00Z","data":{}}"#
                .to_string(),
            iteration_end(1, 5.0, 0),
        ]);
        assert!(summary.iterations.wall_clock_seconds.is_none());
    }

    #[test]
    fn test_tool_usage_and_errors() {
        let summary = summary_for(vec![
            system_init(),
            bash("a", "ls"),
            result("a", "boom", true),
            read("b", "x"),
            bash("c", "pwd"),
        ]);
        assert_eq!(summary.total_invocations, 3);
        assert_eq!(
            summary.tool_usage,
            vec![
                ToolUsage { name: "Bash".into(), count: 2 },
                ToolUsage { name: "Read".into(), count: 1 },
            ]
        );
        assert_eq!(summary.tool_errors, 1);
        assert_eq!(summary.init.unwrap().model.as_deref(), Some("claude-opus"));
    }

    #[test]
    fn test_tracker_commands() {
        let summary = summary_for(vec![
            bash("a", "bd create 'New task'"),
            bash("b", "cd repo && bd update x-1 --status in_progress"),
            bash("c", "bd close x-1"),
            bash("d", "echo bd"),
        ]);
        let tracker = summary.tracker;
        assert_eq!(tracker.commands.len(), 3);
        assert_eq!((tracker.creates, tracker.updates, tracker.closes), (1, 1, 1));
    }

    #[test]
    fn test_narrative_first_and_last() {
        let lines = (0..8).map(|i| text(&format!("thought {}\nmore", i))).collect();
        let narrative = summary_for(lines).narrative;
        assert_eq!(narrative.first.len(), 3);
        assert_eq!(narrative.first[0].text, "thought 0 more");
        assert_eq!(narrative.last.iter().map(|e| e.index).collect::<Vec<_>>(), vec![5, 6, 7]);
    }

    #[test]
    fn test_short_narrative_overlaps() {
        let narrative = summary_for(vec![text("only")]).narrative;
        assert_eq!(narrative.first, narrative.last);
    }
}
