use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::detectors::{
    self, BashSequence, CategoryBreakdown, EnvironmentIssue, ReadBeforeEdit, RecoveryFindings,
    TestSummary, ToolRun, WorkflowEscape,
};
use crate::index::{ToolCallIndex, ToolInvocation};
use crate::session::{self, SessionSummary, TaskTransition};
use crate::transcript::{DecodeStats, Transcript};

/// Read-only inputs shared by every detector.
#[derive(Debug, Clone)]
pub struct AnalysisContext<'a> {
    pub transcript: &'a Transcript,
    pub index: ToolCallIndex<'a>,
    pub config: &'a AnalysisConfig,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(transcript: &'a Transcript, config: &'a AnalysisConfig) -> Self {
        Self {
            transcript,
            index: ToolCallIndex::build(transcript, config.result_lookup),
            config,
        }
    }

    pub fn is_shell(&self, invocation: &ToolInvocation<'_>) -> bool {
        invocation.name == self.config.tools.shell
    }

    /// Shell invocations in event order.
    pub fn shell_invocations(&self) -> impl Iterator<Item = &ToolInvocation<'a>> + '_ {
        self.index
            .invocations()
            .iter()
            .filter(move |inv| self.is_shell(inv))
    }
}

/// Findings of every detector for one transcript.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub event_count: usize,
    pub decode: DecodeStats,
    pub session: SessionSummary,
    pub tool_runs: Vec<ToolRun>,
    pub bash_sequences: Vec<BashSequence>,
    pub recoveries: RecoveryFindings,
    pub read_before_edit: ReadBeforeEdit,
    pub environment_issues: Vec<EnvironmentIssue>,
    pub test_attempts: TestSummary,
    pub categories: CategoryBreakdown,
    pub workflow_escapes: Vec<WorkflowEscape>,
    pub task_timeline: Vec<TaskTransition>,
}

impl Analysis {
    pub fn run(transcript: &Transcript, config: &AnalysisConfig) -> Self {
        let ctx = AnalysisContext::new(transcript, config);
        debug!(
            events = transcript.len(),
            invocations = ctx.index.invocations().len(),
            "Running detectors"
        );

        let analysis = Self {
            event_count: transcript.len(),
            decode: transcript.stats().clone(),
            session: session::summarize(&ctx),
            tool_runs: detectors::runs::detect(&ctx),
            bash_sequences: detectors::bash_sequences::detect(&ctx),
            recoveries: detectors::recovery::detect(&ctx),
            read_before_edit: detectors::read_before_edit::detect(&ctx),
            environment_issues: detectors::environment::detect(&ctx),
            test_attempts: detectors::test_attempts::detect(&ctx),
            categories: detectors::categories::detect(&ctx),
            workflow_escapes: detectors::escapes::detect(&ctx),
            task_timeline: session::task_timeline(&ctx),
        };

        info!(
            events = analysis.event_count,
            dropped = analysis.decode.dropped(),
            stuck_runs = analysis.tool_runs.len(),
            escapes = analysis.workflow_escapes.len(),
            "Analysis complete"
        );
        analysis
    }
}
