//! Environment and tooling failures seen in shell output.

use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::text::excerpt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The tool reported an error result
    Error,
    /// Successful result whose output mentions a failure phrase
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentIssue {
    pub index: usize,
    pub command: String,
    pub kind: IssueKind,
    pub detail: String,
    /// First configured phrase found in the output, for warnings
    pub matched_phrase: Option<String>,
}

/// Classify every shell invocation with a matched text result.
///
/// Results with structured content are skipped entirely, including error
/// results, since there is no text to report.
pub fn detect(ctx: &AnalysisContext<'_>) -> Vec<EnvironmentIssue> {
    let limits = &ctx.config.excerpts;
    let phrases: Vec<String> = ctx
        .config
        .environment_phrases
        .iter()
        .map(|p| p.to_lowercase())
        .collect();
    let mut issues = Vec::new();

    for invocation in ctx.shell_invocations() {
        let Some(result) = ctx.index.result_for(invocation) else {
            continue;
        };
        let Some(content) = result.text() else {
            continue;
        };

        let (kind, matched_phrase) = if result.is_error {
            (IssueKind::Error, None)
        } else {
            let lower = content.to_lowercase();
            match phrases.iter().find(|p| lower.contains(p.as_str())) {
                Some(phrase) => (IssueKind::Warning, Some(phrase.clone())),
                None => continue,
            }
        };

        issues.push(EnvironmentIssue {
            index: invocation.event_index,
            command: excerpt(invocation.command(), limits.command),
            kind,
            detail: excerpt(content, limits.detail),
            matched_phrase,
        });
    }

    tracing::debug!(issues = issues.len(), "Environment scan finished");
    issues
}
