//! Spelling detector: surfaces deterministic prefilter hits as findings.
//!
//! The full proofreader (with the optional LLM stage) runs separately in
//! the pipeline; this detector gives `analyze` a fast, deterministic
//! spelling signal.

use super::Detector;
use crate::container::Document;
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory};
use crate::proofread::prefilter;

pub struct SpellingDetector;

/// Cap on spelling findings surfaced per document.
const MAX_FINDINGS: usize = 100;

impl Detector for SpellingDetector {
    fn name(&self) -> &'static str {
        "spelling"
    }

    fn detect(&self, _doc: &Document, projection: &TextProjection) -> Result<Vec<Finding>> {
        let issues = prefilter::prefilter(&projection.text);
        Ok(issues
            .into_iter()
            .take(MAX_FINDINGS)
            .map(|issue| {
                let location = issue
                    .start_index
                    .map(|s| format!("text position {}", s))
                    .unwrap_or_else(|| "document text".to_string());
                Finding::new(
                    FindingCategory::SpellingErrors,
                    issue.kind.clone(),
                    issue.severity,
                    location,
                )
                .with_value(issue.error.clone())
                .with_context(format!(
                    "{}[{}]{}",
                    issue.context_before, issue.error, issue.context_after
                ))
                .with_evidence(issue.correction.clone())
            })
            .collect())
    }
}
