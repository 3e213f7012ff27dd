//! Error to recovery pairing.
//!
//! Only the most recent unresolved error is tracked. The first assistant text
//! after it that mentions a recovery keyword resolves it.

use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::event::ContentBlock;
use crate::text::excerpt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recovery {
    pub error_index: usize,
    pub recovery_index: usize,
    pub text_excerpt: String,
}

impl Recovery {
    /// Events between the error and the recovering text.
    pub fn gap(&self) -> usize {
        self.recovery_index - self.error_index
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryFindings {
    pub recoveries: Vec<Recovery>,
    /// Errors replaced by a newer error before any recovery text
    pub superseded: Vec<usize>,
    /// Error still pending when the transcript ended
    pub unresolved: Option<usize>,
}

pub fn detect(ctx: &AnalysisContext<'_>) -> RecoveryFindings {
    let keywords: Vec<String> = ctx
        .config
        .recovery_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    let mut findings = RecoveryFindings::default();
    let mut pending: Option<usize> = None;

    for event in ctx.transcript.events() {
        if let Some(turn) = event.as_user() {
            let has_error = turn
                .blocks()
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolResult { is_error: true, .. }));
            if has_error {
                if let Some(previous) = pending.replace(event.index) {
                    findings.superseded.push(previous);
                }
            }
            continue;
        }

        let (Some(error_index), Some(turn)) = (pending, event.as_assistant()) else {
            continue;
        };
        let recovery = turn.blocks().iter().find_map(|block| match block {
            ContentBlock::Text { text } => {
                let lower = text.to_lowercase();
                keywords
                    .iter()
                    .any(|k| lower.contains(k.as_str()))
                    .then(|| excerpt(text, ctx.config.excerpts.recovery))
            }
            _ => None,
        });
        if let Some(text_excerpt) = recovery {
            findings.recoveries.push(Recovery {
                error_index,
                recovery_index: event.index,
                text_excerpt,
            });
            pending = None;
        }
    }

    findings.unresolved = pending;
    tracing::debug!(
        recoveries = findings.recoveries.len(),
        superseded = findings.superseded.len(),
        unresolved = findings.unresolved.is_some(),
        "Recovery matching finished"
    );
    findings
}
