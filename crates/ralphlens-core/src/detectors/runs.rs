//! Same-tool runs: one tool called many times in a row.

use serde::Serialize;

use crate::analysis::AnalysisContext;

/// A run of consecutive invocations of one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRun {
    pub tool_name: String,
    pub run_length: usize,
    /// Event index of the first invocation in the run
    pub start_index: usize,
}

/// Runs of at least `run_threshold` consecutive invocations of the same tool.
pub fn detect(ctx: &AnalysisContext<'_>) -> Vec<ToolRun> {
    let threshold = ctx.config.run_threshold;
    let mut runs = Vec::new();
    let mut current: Option<ToolRun> = None;

    for invocation in ctx.index.invocations() {
        if let Some(run) = current.as_mut() {
            if run.tool_name == invocation.name {
                run.run_length += 1;
                continue;
            }
        }
        if let Some(run) = current.take().filter(|r| r.run_length >= threshold) {
            runs.push(run);
        }
        current = Some(ToolRun {
            tool_name: invocation.name.to_string(),
            run_length: 1,
            start_index: invocation.event_index,
        });
    }

    if let Some(run) = current.filter(|r| r.run_length >= threshold) {
        runs.push(run);
    }

    tracing::debug!(runs = runs.len(), threshold, "Same-tool run detection finished");
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bash, read, result};
    use crate::{AnalysisConfig, Transcript};

    fn runs_for(lines: Vec<String>) -> Vec<ToolRun> {
        let transcript = Transcript::from_lines(lines);
        let config = AnalysisConfig::default();
        detect(&AnalysisContext::new(&transcript, &config))
    }

    #[test]
    fn test_five_in_a_row_is_one_run() {
        let lines = (0..5).map(|i| bash(&format!("b{}", i), "ls")).collect();
        let runs = runs_for(lines);
        assert_eq!(
            runs,
            vec![ToolRun {
                tool_name: "Bash".into(),
                run_length: 5,
                start_index: 0
            }]
        );
    }

    #[test]
    fn test_four_in_a_row_is_nothing() {
        let lines = (0..4).map(|i| bash(&format!("b{}", i), "ls")).collect();
        assert!(runs_for(lines).is_empty());
    }

    #[test]
    fn test_results_between_calls_do_not_break_a_run() {
        let mut lines = vec![read("r0", "a.rs")];
        for i in 0..6 {
            let id = format!("b{}", i);
            lines.push(bash(&id, "cargo check"));
            lines.push(result(&id, "ok", false));
        }
        lines.push(read("r1", "b.rs"));

        let runs = runs_for(lines);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_length, 6);
        assert_eq!(runs[0].start_index, 1);
    }

    #[test]
    fn test_multiple_runs_are_reported_in_order() {
        let mut lines: Vec<String> = (0..5).map(|i| read(&format!("r{}", i), "a.rs")).collect();
        lines.extend((0..7).map(|i| bash(&format!("b{}", i), "ls")));
        let runs = runs_for(lines);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].tool_name, "Read");
        assert_eq!(runs[1].tool_name, "Bash");
        assert_eq!(runs[1].run_length, 7);
        assert_eq!(runs[1].start_index, 5);
    }
}
