//! Orchestration of the analyze and clean flows.
//!
//! One pipeline runs per request. Detectors read the document through the
//! container; only the cleaner and the applier write, and the projection
//! is rebuilt after every mutation pass.

use crate::apply::{self, ApplyStats, EditOp};
use crate::clean;
use crate::config::{CleanOptions, LlmConfig};
use crate::container::{Document, DocumentFormat};
use crate::detectors;
use crate::error::{Error, Result};
use crate::extract::{self, TextProjection};
use crate::findings::{finding_id, Finding, FindingCategory, SpellingIssue};
use crate::patterns;
use crate::proofread::{CancelToken, Proofreader};
use crate::report::{self, DocumentStats, Report, ReportInputs};
use crate::risk::{self, scorer, BusinessRisk};
use std::io::Write;
use std::time::Instant;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Result of an analyze flow.
#[derive(Debug)]
pub struct AnalyzeOutcome {
    /// The opened document (read-only from here on).
    pub document: Document,
    /// Text projection of the document.
    pub projection: TextProjection,
    /// Ordered, deduplicated findings.
    pub findings: Vec<Finding>,
    /// Severity counts and technical score.
    pub summary: scorer::Summary,
    /// Business risk verdict.
    pub business: BusinessRisk,
    /// Anchored spelling issues (prefilter + optional remote stage).
    pub spelling: Vec<SpellingIssue>,
    /// Whether the remote proofread stage degraded.
    pub proofread_degraded: bool,
    /// Assembled report.
    pub report: Report,
}

/// Result of a clean flow.
#[derive(Debug)]
pub struct CleanOutcome {
    /// Cleaned container bytes (same format as the input).
    pub cleaned: Vec<u8>,
    /// Report covering before and after.
    pub report: Report,
    /// Container format.
    pub format: DocumentFormat,
    /// Original file name.
    pub original_name: String,
}

/// High-level document sanitizer.
pub struct Sanitizer {
    proofreader: Proofreader,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer {
    /// Sanitizer with LLM settings from the environment.
    pub fn new() -> Self {
        Self::with_llm(LlmConfig::from_env())
    }

    /// Sanitizer with explicit LLM settings.
    pub fn with_llm(config: LlmConfig) -> Self {
        Self {
            proofreader: Proofreader::from_config(&config),
        }
    }

    /// Sanitizer with an injected proofreader (tests).
    pub fn with_proofreader(proofreader: Proofreader) -> Self {
        Self { proofreader }
    }

    /// Run the analyze flow.
    pub fn analyze(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        original_name: &str,
        cancel: &CancelToken,
    ) -> Result<AnalyzeOutcome> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let document = Document::open(bytes, format, original_name)?;
        let projection = extract::extract(&document);
        let findings = detectors::run_all(&document, &projection);
        let proofread = self.proofreader.proofread(&projection.text, cancel);
        let summary = scorer::score(&findings);
        let business = risk::evaluate(&findings, &projection);
        let stats = DocumentStats::compute(&projection, part_count(&document));
        let report = report::assemble(ReportInputs {
            document_id: &document.id,
            original_name,
            format,
            findings: &findings,
            summary: &summary,
            spelling: &proofread.issues,
            business: &business,
            stats,
            stats_after: None,
            summary_after: None,
            cleaning: None,
            corrections: None,
            processing_time_ms: started.elapsed().as_millis() as u64,
            proofread_degraded: proofread.degraded,
        });
        Ok(AnalyzeOutcome {
            document,
            projection,
            findings,
            summary,
            business,
            spelling: proofread.issues,
            proofread_degraded: proofread.degraded,
            report,
        })
    }

    /// Run the clean flow: analyze, selectively remove, apply approved
    /// corrections, rescore, and report.
    pub fn clean(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        original_name: &str,
        options: &CleanOptions,
        cancel: &CancelToken,
    ) -> Result<CleanOutcome> {
        let started = Instant::now();
        let analysis = self.analyze(bytes, format, original_name, cancel)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut document = analysis.document.clone();
        let redact_values = approved_redaction_values(&analysis.projection, options);
        let cleaning = clean::clean(&mut document, options, &redact_values)?;

        let corrections: Option<ApplyStats> = if options.correct_spelling {
            let issues = select_spelling(&analysis.spelling, &options.approved_spelling);
            if issues.is_empty() {
                None
            } else {
                let rebuilt = extract::extract(&document);
                let edits: Vec<EditOp> = issues.iter().map(|i| EditOp::from(*i)).collect();
                Some(apply::apply(&mut document, &rebuilt, &edits)?)
            }
        } else {
            None
        };

        // Rescore against what actually remains in the cleaned container
        let projection_after = extract::extract(&document);
        let remaining = detectors::run_all(&document, &projection_after);
        let summary_after = scorer::score_after(&analysis.summary, &remaining);
        let stats_after = DocumentStats::compute(&projection_after, part_count(&document));

        let cleaned = document.save()?;
        let report = report::assemble(ReportInputs {
            document_id: &analysis.document.id,
            original_name,
            format,
            findings: &analysis.findings,
            summary: &analysis.summary,
            spelling: &analysis.spelling,
            business: &analysis.business,
            stats: DocumentStats::compute(&analysis.projection, part_count(&analysis.document)),
            stats_after: Some(stats_after),
            summary_after: Some(&summary_after),
            cleaning: Some(cleaning),
            corrections,
            processing_time_ms: started.elapsed().as_millis() as u64,
            proofread_degraded: analysis.proofread_degraded,
        });
        Ok(CleanOutcome {
            cleaned,
            report,
            format,
            original_name: original_name.to_string(),
        })
    }

    /// Rewrite-for-clarity mode. Not wired in this build.
    pub fn rephrase(
        &self,
        _bytes: &[u8],
        _format: DocumentFormat,
        _original_name: &str,
        _options: &CleanOptions,
        _cancel: &CancelToken,
    ) -> Result<CleanOutcome> {
        Err(Error::Unsupported("rephrase mode".to_string()))
    }
}

fn part_count(document: &Document) -> usize {
    match document.ooxml() {
        Some(container) => container.part_paths().len(),
        None => document
            .pdf()
            .map(|pdf| pdf.page_ids().len())
            .unwrap_or(0),
    }
}

/// Map approved sensitive-finding ids back to their raw values by
/// re-scanning the projection. The report only ever carried masked
/// values; ids recompute identically here because ids hash the masked
/// rendering.
fn approved_redaction_values(projection: &TextProjection, options: &CleanOptions) -> Vec<String> {
    if options.redact_sensitive.is_empty() {
        return Vec::new();
    }
    let mut values = Vec::new();
    for m in patterns::scan(&projection.text) {
        let category = if m.kind == "confidential_keyword" {
            FindingCategory::ComplianceRisks
        } else {
            FindingCategory::SensitiveData
        };
        let id = finding_id(
            category,
            m.kind,
            &format!("text position {}", m.start),
            Some(&m.masked),
        );
        if options.redact_sensitive.contains(&id) && !values.contains(&m.value) {
            values.push(m.value.clone());
        }
    }
    values
}

/// Filter spelling issues to the approved set; an empty approval list
/// under `correct_spelling` means "apply everything found".
fn select_spelling<'a>(
    issues: &'a [SpellingIssue],
    approved: &[String],
) -> Vec<&'a SpellingIssue> {
    if approved.is_empty() {
        issues.iter().collect()
    } else {
        issues.iter().filter(|i| approved.contains(&i.id)).collect()
    }
}

/// Package clean outcomes into the output archive.
///
/// A single document yields `cleaned.<ext>`, `report.html`, and
/// `report.json`; several documents prefix each entry with the source
/// file's base name.
pub fn package(outcomes: &[CleanOutcome]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let zip_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for outcome in outcomes {
        let prefix = if outcomes.len() == 1 {
            String::new()
        } else {
            let stem = outcome
                .original_name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(&outcome.original_name);
            format!("{}_", stem)
        };
        writer.start_file(
            format!("{}cleaned.{}", prefix, outcome.format.extension()),
            zip_options,
        )?;
        writer.write_all(&outcome.cleaned)?;
        writer.start_file(format!("{}report.json", prefix), zip_options)?;
        writer.write_all(report::to_json(&outcome.report)?.as_bytes())?;
        writer.start_file(format!("{}report.html", prefix), zip_options)?;
        writer.write_all(report::html::render(&outcome.report).as_bytes())?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| Error::Internal(format!("archive finalize failed: {}", e)))?;
    Ok(cursor.into_inner())
}
