//! Report assembly.
//!
//! The JSON schema is stable: field names are camelCase, category arrays
//! are always present (possibly empty), severities serialize lowercase,
//! and the risk score is an integer in `[0, 100]`.

pub mod html;

use crate::apply::ApplyStats;
use crate::clean::CleanStats;
use crate::container::DocumentFormat;
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity, SpellingIssue};
use crate::risk::scorer::Summary;
use crate::risk::BusinessRisk;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity and timing of one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// Request-scoped document id.
    pub document_id: String,
    /// Original file name.
    pub original_name: String,
    /// Container format.
    pub format: String,
    /// RFC 3339 generation timestamp.
    pub generated_at: String,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Whether the proofreader degraded to deterministic-only results.
    pub proofread_degraded: bool,
}

/// Simple text statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    /// Characters in the normalized projection.
    pub characters: usize,
    /// Whitespace-separated words.
    pub words: usize,
    /// Paragraph separators.
    pub paragraphs: usize,
    /// Parts in the container.
    pub parts: usize,
}

impl DocumentStats {
    /// Compute stats from a projection and part count.
    pub fn compute(projection: &TextProjection, parts: usize) -> Self {
        let text = projection.normalized();
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            paragraphs: text.lines().filter(|l| !l.trim().is_empty()).count(),
            parts,
        }
    }
}

/// One row of the technical checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// Category label.
    pub area: String,
    /// `clean` or `attention`.
    pub status: String,
    /// Finding count in the category.
    pub count: usize,
    /// Worst severity present, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Part 1: technical hygiene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalReport {
    /// Checklist over all categories.
    pub checklist: Vec<ChecklistItem>,
    /// Severity counts and score.
    pub summary: Summary,
}

/// Part 2: business risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessReport {
    /// Deterministic flags and levels.
    #[serde(flatten)]
    pub risk: BusinessRisk,
    /// `YES` or `NO`.
    pub client_ready_verdict: String,
}

/// The versioned two-layer assessment block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualionCleanV1 {
    /// Block version.
    pub version: String,
    /// Container format.
    pub file_type: String,
    /// What was (and was not) inspected for this format.
    pub file_type_context: String,
    /// Technical hygiene.
    pub part1: TechnicalReport,
    /// Business risk.
    pub part2: BusinessReport,
}

/// The full report for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Identity and timing.
    pub meta: ReportMeta,
    /// Text statistics before cleaning.
    pub document_stats: DocumentStats,
    /// Text statistics after cleaning, when a clean ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_stats_after: Option<DocumentStats>,
    /// Findings per category; every category key is present.
    pub detections: BTreeMap<String, Vec<Finding>>,
    /// Severity counts and technical score (legacy block).
    pub summary: Summary,
    /// Anchored spelling issues for caller approval.
    pub spelling: Vec<SpellingIssue>,
    /// Business risk verdict.
    pub business_risk: BusinessRisk,
    /// Versioned two-layer block.
    pub qualion_clean_v1: QualionCleanV1,
    /// Technical score before cleaning.
    pub score_before: u32,
    /// Technical score after cleaning, when a clean ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_after: Option<u32>,
    /// Removal counters, when a clean ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_stats: Option<CleanStats>,
    /// Applier stats, when spelling corrections ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction_stats: Option<ApplyStats>,
}

/// Format-specific inspection notes.
pub fn file_type_context(format: DocumentFormat) -> &'static str {
    match format {
        DocumentFormat::Docx => {
            "Word document: properties, comments, tracked changes, hidden runs, \
             embedded objects, macros, and body text are inspected."
        },
        DocumentFormat::Pptx => {
            "Presentation: properties, comments, speaker notes, hidden and \
             off-slide content, embedded objects, and slide text are inspected."
        },
        DocumentFormat::Xlsx => {
            "Workbook: properties, comments, hidden sheets, rows and columns, \
             formulas, embedded objects, macros, and shared strings are inspected."
        },
        DocumentFormat::Pdf => {
            "PDF: the info dictionary, page annotations, and attachments are \
             inspected. Page text content is not analyzed or sanitized."
        },
    }
}

/// Group findings per category, materializing every category key.
pub fn group_detections(findings: &[Finding]) -> BTreeMap<String, Vec<Finding>> {
    let mut detections: BTreeMap<String, Vec<Finding>> = FindingCategory::all()
        .iter()
        .map(|c| (c.as_str().to_string(), Vec::new()))
        .collect();
    for finding in findings {
        detections
            .entry(finding.category.as_str().to_string())
            .or_default()
            .push(finding.clone());
    }
    detections
}

/// Build the technical checklist from grouped findings.
pub fn checklist(detections: &BTreeMap<String, Vec<Finding>>) -> Vec<ChecklistItem> {
    FindingCategory::all()
        .iter()
        .map(|category| {
            let findings = detections
                .get(category.as_str())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            ChecklistItem {
                area: category.as_str().to_string(),
                status: if findings.is_empty() { "clean" } else { "attention" }.to_string(),
                count: findings.len(),
                severity: findings.iter().map(|f| f.severity).max(),
            }
        })
        .collect()
}

/// Inputs to report assembly.
pub struct ReportInputs<'a> {
    /// Document id.
    pub document_id: &'a str,
    /// Original file name.
    pub original_name: &'a str,
    /// Format.
    pub format: DocumentFormat,
    /// Findings from analysis.
    pub findings: &'a [Finding],
    /// Severity summary (before cleaning).
    pub summary: &'a Summary,
    /// Spelling issues.
    pub spelling: &'a [SpellingIssue],
    /// Business risk verdict.
    pub business: &'a BusinessRisk,
    /// Stats before cleaning.
    pub stats: DocumentStats,
    /// Stats after cleaning.
    pub stats_after: Option<DocumentStats>,
    /// Severity summary after cleaning.
    pub summary_after: Option<&'a Summary>,
    /// Cleaner counters.
    pub cleaning: Option<CleanStats>,
    /// Applier counters.
    pub corrections: Option<ApplyStats>,
    /// Milliseconds spent.
    pub processing_time_ms: u64,
    /// Proofreader degradation flag.
    pub proofread_degraded: bool,
}

/// Assemble the report.
pub fn assemble(inputs: ReportInputs<'_>) -> Report {
    let detections = group_detections(inputs.findings);
    let part1 = TechnicalReport {
        checklist: checklist(&detections),
        summary: inputs.summary.clone(),
    };
    let part2 = BusinessReport {
        risk: inputs.business.clone(),
        client_ready_verdict: if inputs.business.client_ready { "YES" } else { "NO" }.to_string(),
    };
    Report {
        meta: ReportMeta {
            document_id: inputs.document_id.to_string(),
            original_name: inputs.original_name.to_string(),
            format: inputs.format.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            processing_time_ms: inputs.processing_time_ms,
            proofread_degraded: inputs.proofread_degraded,
        },
        document_stats: inputs.stats,
        document_stats_after: inputs.stats_after,
        detections,
        summary: inputs.summary.clone(),
        spelling: inputs.spelling.to_vec(),
        business_risk: inputs.business.clone(),
        qualion_clean_v1: QualionCleanV1 {
            version: "1.0".to_string(),
            file_type: inputs.format.to_string(),
            file_type_context: file_type_context(inputs.format).to_string(),
            part1,
            part2,
        },
        score_before: inputs.summary.risk_score,
        score_after: inputs.summary_after.map(|s| s.risk_score),
        cleaning_stats: inputs.cleaning,
        correction_stats: inputs.corrections,
    }
}

/// Serialize a report to pretty JSON.
pub fn to_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| crate::error::Error::Internal(format!("report serialization: {}", e)))
}
