//! Build and test command outcomes.

use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::text::excerpt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestAttempt {
    pub index: usize,
    pub command: String,
    /// `false` when no result was matched
    pub is_error: bool,
    /// Empty when no result was matched or the result was not text
    pub output_excerpt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub attempts: Vec<TestAttempt>,
    pub passed: usize,
    pub failed: usize,
}

impl TestSummary {
    pub fn total(&self) -> usize {
        self.attempts.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestAttempt> {
        self.attempts.iter().filter(|a| a.is_error)
    }
}

pub fn detect(ctx: &AnalysisContext<'_>) -> TestSummary {
    let limits = &ctx.config.excerpts;
    let mut summary = TestSummary::default();

    for invocation in ctx.shell_invocations() {
        let command = invocation.command();
        if !ctx.config.is_test_command(command) {
            continue;
        }

        let result = ctx.index.result_for(invocation);
        let is_error = result.is_some_and(|r| r.is_error);
        let output_excerpt = result
            .and_then(|r| r.text())
            .map(|t| excerpt(t, limits.output))
            .unwrap_or_default();

        if is_error {
            summary.failed += 1;
        } else {
            summary.passed += 1;
        }
        summary.attempts.push(TestAttempt {
            index: invocation.event_index,
            command: excerpt(command, limits.test_command),
            is_error,
            output_excerpt,
        });
    }

    tracing::debug!(passed = summary.passed, failed = summary.failed, "Test attempt scan finished");
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{bash, result, structured_result};
    use crate::{AnalysisConfig, Transcript};

    fn summary_for(lines: Vec<String>) -> TestSummary {
        let transcript = Transcript::from_lines(lines);
        let config = AnalysisConfig::default();
        detect(&AnalysisContext::new(&transcript, &config))
    }

    #[test]
    fn test_passing_and_failing_attempts() {
        let summary = summary_for(vec![
            bash("a", "cargo test --workspace"),
            result("a", "test result: ok", false),
            bash("b", "pytest -q"),
            result("b", "1 failed", true),
            bash("c", "ls"),
            result("c", "src", false),
        ]);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.attempts[0].output_excerpt, "test result: ok");
        assert_eq!(summary.failures().next().unwrap().command, "pytest -q");
    }

    #[test]
    fn test_missing_result_counts_as_passed_with_empty_output() {
        let summary = summary_for(vec![bash("a", "go test ./...")]);
        assert_eq!(summary.passed, 1);
        assert!(!summary.attempts[0].is_error);
        assert_eq!(summary.attempts[0].output_excerpt, "");
    }

    #[test]
    fn test_structured_output_keeps_error_flag() {
        let summary = summary_for(vec![bash("a", "npm test"), structured_result("a", true)]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.attempts[0].output_excerpt, "");
    }
}
