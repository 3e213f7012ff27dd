//! Back-to-back shell activity.
//!
//! A sequence is a run of consecutive events that each issue at least one
//! shell invocation. Any other event, tool results included, closes it.

use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::text::excerpt;

/// The matched result of one step, when it arrived inside the lookup window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub is_error: bool,
    /// Text output excerpt; `None` for structured content
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BashStep {
    pub index: usize,
    pub command: String,
    pub result: Option<StepResult>,
}

impl BashStep {
    pub fn failed(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.is_error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BashSequence {
    pub steps: Vec<BashStep>,
}

impl BashSequence {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn start_index(&self) -> Option<usize> {
        self.steps.first().map(|s| s.index)
    }

    pub fn error_count(&self) -> usize {
        self.steps.iter().filter(|s| s.failed()).count()
    }
}

pub fn detect(ctx: &AnalysisContext<'_>) -> Vec<BashSequence> {
    let threshold = ctx.config.bash_sequence_threshold;
    let mut sequences = Vec::new();
    let mut current: Vec<BashStep> = Vec::new();

    for event in ctx.transcript.events() {
        let mut shell_calls = ctx
            .index
            .invocations_at(event.index)
            .iter()
            .filter(|inv| ctx.is_shell(inv))
            .peekable();

        if shell_calls.peek().is_none() {
            let closed = std::mem::take(&mut current);
            if closed.len() >= threshold {
                sequences.push(BashSequence { steps: closed });
            }
            continue;
        }

        for invocation in shell_calls {
            let result = ctx.index.result_for(invocation).map(|r| StepResult {
                is_error: r.is_error,
                output: r.text().map(|t| excerpt(t, ctx.config.excerpts.detail)),
            });
            current.push(BashStep {
                index: event.index,
                command: invocation.command().to_string(),
                result,
            });
        }
    }

    if current.len() >= threshold {
        sequences.push(BashSequence { steps: current });
    }

    tracing::debug!(sequences = sequences.len(), threshold, "Shell sequence detection finished");
    sequences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bash, multi_bash, read, result, text};
    use crate::{AnalysisConfig, Transcript};

    fn sequences_for(lines: Vec<String>) -> Vec<BashSequence> {
        let transcript = Transcript::from_lines(lines);
        let config = AnalysisConfig::default();
        detect(&AnalysisContext::new(&transcript, &config))
    }

    #[test]
    fn test_five_consecutive_shell_events() {
        let mut lines: Vec<String> = (0..5).map(|i| bash(&format!("b{}", i), "ls")).collect();
        lines.push(text("done"));
        let sequences = sequences_for(lines);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].len(), 5);
        assert_eq!(sequences[0].start_index(), Some(0));
    }

    #[test]
    fn test_short_sequence_is_discarded() {
        let mut lines: Vec<String> = (0..4).map(|i| bash(&format!("b{}", i), "ls")).collect();
        lines.push(read("r", "a.rs"));
        lines.extend((4..8).map(|i| bash(&format!("b{}", i), "ls")));
        assert!(sequences_for(lines).is_empty());
    }

    #[test]
    fn test_multiple_calls_per_event_each_count() {
        let lines = vec![
            multi_bash(&[("a", "ls"), ("b", "pwd"), ("c", "whoami")]),
            multi_bash(&[("d", "cat x"), ("e", "cat y")]),
        ];
        let sequences = sequences_for(lines);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].len(), 5);
        assert_eq!(sequences[0].steps[4].index, 1);
        assert_eq!(sequences[0].steps[1].command, "pwd");
    }

    #[test]
    fn test_results_attach_but_result_events_close_sequences() {
        let lines = vec![
            multi_bash(&[("a", "ls"), ("b", "pwd"), ("c", "make")]),
            multi_bash(&[("d", "x"), ("e", "y")]),
            result("c", "boom", true),
            result("a", "file", false),
        ];
        let sequences = sequences_for(lines);
        assert_eq!(sequences.len(), 1);
        let steps = &sequences[0].steps;
        assert_eq!(steps[0].result.as_ref().unwrap().output.as_deref(), Some("file"));
        assert!(steps[2].failed());
        assert!(steps[3].result.is_none());
        assert_eq!(sequences[0].error_count(), 1);
    }
}
