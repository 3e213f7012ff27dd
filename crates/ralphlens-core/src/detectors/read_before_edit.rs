//! Read-before-edit discipline.

use std::collections::HashSet;

use serde::Serialize;

use crate::analysis::AnalysisContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditCheck {
    pub index: usize,
    pub file_path: String,
    pub had_prior_read: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadBeforeEdit {
    pub total_edits: usize,
    pub edits_with_read: usize,
    pub edits: Vec<EditCheck>,
}

impl ReadBeforeEdit {
    /// Share of edits preceded by a read of the same path; 0 with no edits.
    pub fn coverage(&self) -> f64 {
        if self.total_edits == 0 {
            0.0
        } else {
            self.edits_with_read as f64 / self.total_edits as f64
        }
    }
}

/// An edit counts as covered only by reads earlier in the scan.
pub fn detect(ctx: &AnalysisContext<'_>) -> ReadBeforeEdit {
    let tools = &ctx.config.tools;
    let mut reads: HashSet<&str> = HashSet::new();
    let mut findings = ReadBeforeEdit::default();

    for invocation in ctx.index.invocations() {
        if invocation.name == tools.read {
            reads.insert(invocation.file_path());
        } else if invocation.name == tools.edit {
            let file_path = invocation.file_path();
            let had_prior_read = reads.contains(file_path);
            findings.total_edits += 1;
            if had_prior_read {
                findings.edits_with_read += 1;
            }
            findings.edits.push(EditCheck {
                index: invocation.event_index,
                file_path: file_path.to_string(),
                had_prior_read,
            });
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{edit, read, text};
    use crate::{AnalysisConfig, Transcript};

    fn findings_for(lines: Vec<String>) -> ReadBeforeEdit {
        let transcript = Transcript::from_lines(lines);
        let config = AnalysisConfig::default();
        detect(&AnalysisContext::new(&transcript, &config))
    }

    #[test]
    fn test_one_of_two_edits_covered() {
        let lines = vec![
            text("start"),
            read("r", "a.py"),
            edit("e1", "a.py"),
            edit("e2", "b.py"),
        ];
        let findings = findings_for(lines);
        assert_eq!(findings.total_edits, 2);
        assert_eq!(findings.edits_with_read, 1);
        assert_eq!(findings.edits[0].index, 2);
        assert!(findings.edits[0].had_prior_read);
        assert!(!findings.edits[1].had_prior_read);
        assert_eq!(findings.coverage(), 0.5);
    }

    #[test]
    fn test_later_read_does_not_cover_earlier_edit() {
        let lines = vec![edit("e", "a.py"), read("r", "a.py")];
        let findings = findings_for(lines);
        assert_eq!(findings.edits_with_read, 0);
    }

    #[test]
    fn test_no_edits_has_zero_coverage() {
        let findings = findings_for(vec![read("r", "a.py")]);
        assert_eq!(findings.total_edits, 0);
        assert_eq!(findings.coverage(), 0.0);
    }
}
