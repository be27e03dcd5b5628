//! Finding and spelling-issue types emitted by detectors.
//!
//! Findings are created by detectors and never mutated afterwards. Their ids
//! are stable across repeated analyses of the same bytes: the id is a
//! truncated SHA-256 over the identifying tuple, not a random value.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;

/// Ordinal severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; low leakage value.
    Low,
    /// Worth reviewing before sharing.
    Medium,
    /// Likely to leak internal information.
    High,
    /// Direct leak of sensitive or executable content.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Closed set of finding categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FindingCategory {
    /// Document properties (author, company, timestamps, ...)
    Metadata,
    /// Comment parts and inline comment markers
    Comments,
    /// Tracked insertions and deletions
    TrackChanges,
    /// Hidden text, white text, tiny fonts, hidden slides
    HiddenContent,
    /// Hidden or very-hidden worksheets
    HiddenSheets,
    /// Hidden columns and rows
    HiddenColumns,
    /// Formulas referencing external or sensitive sources
    SensitiveFormulas,
    /// Embedded OLE objects
    EmbeddedObjects,
    /// VBA macro blobs
    Macros,
    /// PII / financial / confidential token matches
    SensitiveData,
    /// Spelling and stuck-word issues
    SpellingErrors,
    /// Large opaque shapes that may mask content
    VisualObjects,
    /// Broken links, near-empty slides, whitespace residue
    OrphanData,
    /// Broken external links
    BrokenLinks,
    /// Compliance-relevant findings
    ComplianceRisks,
    /// Defined names and residue pointing at hidden Excel data
    ExcelHiddenData,
}

impl FindingCategory {
    /// The camelCase label used in reports (matches the serde rename).
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::Metadata => "metadata",
            FindingCategory::Comments => "comments",
            FindingCategory::TrackChanges => "trackChanges",
            FindingCategory::HiddenContent => "hiddenContent",
            FindingCategory::HiddenSheets => "hiddenSheets",
            FindingCategory::HiddenColumns => "hiddenColumns",
            FindingCategory::SensitiveFormulas => "sensitiveFormulas",
            FindingCategory::EmbeddedObjects => "embeddedObjects",
            FindingCategory::Macros => "macros",
            FindingCategory::SensitiveData => "sensitiveData",
            FindingCategory::SpellingErrors => "spellingErrors",
            FindingCategory::VisualObjects => "visualObjects",
            FindingCategory::OrphanData => "orphanData",
            FindingCategory::BrokenLinks => "brokenLinks",
            FindingCategory::ComplianceRisks => "complianceRisks",
            FindingCategory::ExcelHiddenData => "excelHiddenData",
        }
    }

    /// All categories, in report order.
    pub fn all() -> &'static [FindingCategory] {
        &[
            FindingCategory::Metadata,
            FindingCategory::Comments,
            FindingCategory::TrackChanges,
            FindingCategory::HiddenContent,
            FindingCategory::HiddenSheets,
            FindingCategory::HiddenColumns,
            FindingCategory::SensitiveFormulas,
            FindingCategory::EmbeddedObjects,
            FindingCategory::Macros,
            FindingCategory::SensitiveData,
            FindingCategory::SpellingErrors,
            FindingCategory::VisualObjects,
            FindingCategory::OrphanData,
            FindingCategory::BrokenLinks,
            FindingCategory::ComplianceRisks,
            FindingCategory::ExcelHiddenData,
        ]
    }
}

/// A typed description of a potential risk artifact in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Stable identifier derived from the identifying tuple.
    pub id: String,
    /// Finding category.
    pub category: FindingCategory,
    /// Specific kind within the category (e.g. `author`, `iban`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Ordinal severity.
    pub severity: Severity,
    /// Non-empty location: part path, slide/sheet number, cell ref, or
    /// text position.
    pub location: String,
    /// The matched value. Masked for critical financial kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Surrounding text context, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Whether the finding is GDPR-relevant personal data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_relevant: Option<bool>,
    /// Extra evidence text (e.g. comment body, formula source).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Finding {
    /// Create a finding with a stable id derived from its identifying tuple.
    pub fn new(
        category: FindingCategory,
        kind: impl Into<String>,
        severity: Severity,
        location: impl Into<String>,
    ) -> Self {
        let kind = kind.into();
        let location = location.into();
        let id = finding_id(category, &kind, &location, None);
        Self {
            id,
            category,
            kind,
            severity,
            location,
            value: None,
            context: None,
            gdpr_relevant: None,
            evidence: None,
        }
    }

    /// Attach a value and refresh the id so equal inputs keep equal ids.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.id = finding_id(self.category, &self.kind, &self.location, Some(&value));
        self.value = Some(value);
        self
    }

    /// Attach surrounding context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Mark GDPR relevance.
    pub fn with_gdpr(mut self, relevant: bool) -> Self {
        self.gdpr_relevant = Some(relevant);
        self
    }

    /// Attach evidence text.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Dedup key: `(category, location, value)`.
    pub fn dedup_key(&self) -> (FindingCategory, &str, Option<&str>) {
        (self.category, self.location.as_str(), self.value.as_deref())
    }
}

/// Order findings by severity descending, then textual location.
pub fn compare_findings(a: &Finding, b: &Finding) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| a.location.cmp(&b.location))
        .then_with(|| a.kind.cmp(&b.kind))
}

/// Stable finding id: first six bytes of SHA-256 over the identifying tuple,
/// hex-encoded.
pub fn finding_id(
    category: FindingCategory,
    kind: &str,
    location: &str,
    value: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(kind.as_bytes());
    hasher.update(b"|");
    hasher.update(location.as_bytes());
    hasher.update(b"|");
    hasher.update(value.unwrap_or("").as_bytes());
    let digest = hasher.finalize();
    digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
}

/// A spelling or stuck-word issue with anchoring context.
///
/// `error` and `correction` are exact substrings; whitespace is meaningful
/// and never trimmed. When `start_index`/`end_index` are absent the applier
/// locates the issue by scoring occurrences against the context windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingIssue {
    /// Stable identifier.
    pub id: String,
    /// Exact erroneous substring.
    pub error: String,
    /// Exact replacement substring.
    pub correction: String,
    /// Issue kind (`inside_word_space`, `stuck_words`, `llm`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Ordinal severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Up to ~30 chars of text preceding the error.
    pub context_before: String,
    /// Up to ~30 chars of text following the error.
    pub context_after: String,
    /// Global projection offset of the error start, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    /// Global projection offset of the error end, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
}

impl SpellingIssue {
    /// Create an issue with a stable id derived from error, correction, and
    /// context.
    pub fn new(
        error: impl Into<String>,
        correction: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
        context_before: impl Into<String>,
        context_after: impl Into<String>,
    ) -> Self {
        let error = error.into();
        let correction = correction.into();
        let context_before = context_before.into();
        let context_after = context_after.into();
        let mut hasher = Sha256::new();
        hasher.update(error.as_bytes());
        hasher.update(b"|");
        hasher.update(correction.as_bytes());
        hasher.update(b"|");
        hasher.update(context_before.as_bytes());
        hasher.update(b"|");
        hasher.update(context_after.as_bytes());
        let digest = hasher.finalize();
        let id: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();
        Self {
            id,
            error,
            correction,
            kind: kind.into(),
            severity: Severity::Low,
            message: message.into(),
            context_before,
            context_after,
            start_index: None,
            end_index: None,
        }
    }

    /// Attach global projection offsets.
    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start_index = Some(start);
        self.end_index = Some(end);
        self
    }
}
