//! Detector framework.
//!
//! Each detector is pure: it reads the document and the text projection
//! and emits typed findings. Detectors are independent; the framework
//! recovers per-detector failures locally (log and empty result),
//! deduplicates findings by `(category, location, value)`, and orders them
//! by severity descending then location.

mod comments;
pub(crate) mod embedded;
mod formulas;
pub(crate) mod hidden;
mod metadata;
mod orphan;
mod sensitive;
mod spelling;
mod track_changes;
mod visual;

use crate::container::Document;
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{compare_findings, Finding};
use quick_xml::events::BytesStart;
use std::collections::HashSet;

/// A single detection capability.
pub trait Detector: Sync {
    /// Stable detector name for logs.
    fn name(&self) -> &'static str;

    /// Inspect the document; never panics, may fail (recovered by the
    /// framework).
    fn detect(&self, doc: &Document, projection: &TextProjection) -> Result<Vec<Finding>>;
}

static METADATA: metadata::MetadataDetector = metadata::MetadataDetector;
static COMMENTS: comments::CommentsDetector = comments::CommentsDetector;
static TRACK_CHANGES: track_changes::TrackChangesDetector = track_changes::TrackChangesDetector;
static HIDDEN: hidden::HiddenContentDetector = hidden::HiddenContentDetector;
static FORMULAS: formulas::SensitiveFormulasDetector = formulas::SensitiveFormulasDetector;
static EMBEDDED: embedded::EmbeddedObjectsDetector = embedded::EmbeddedObjectsDetector;
static MACROS: embedded::MacrosDetector = embedded::MacrosDetector;
static VISUAL: visual::VisualObjectsDetector = visual::VisualObjectsDetector;
static ORPHAN: orphan::OrphanDataDetector = orphan::OrphanDataDetector;
static SENSITIVE: sensitive::SensitiveDataDetector = sensitive::SensitiveDataDetector;
static SPELLING: spelling::SpellingDetector = spelling::SpellingDetector;

static DETECTORS: [&dyn Detector; 11] = [
    &METADATA,
    &COMMENTS,
    &TRACK_CHANGES,
    &HIDDEN,
    &FORMULAS,
    &EMBEDDED,
    &MACROS,
    &VISUAL,
    &ORPHAN,
    &SENSITIVE,
    &SPELLING,
];

/// The fixed detector registry.
pub fn registry() -> &'static [&'static dyn Detector] {
    &DETECTORS
}

/// Run every detector, dedupe, and order the combined findings.
pub fn run_all(doc: &Document, projection: &TextProjection) -> Vec<Finding> {
    let mut findings = Vec::new();
    for detector in registry() {
        match detector.detect(doc, projection) {
            Ok(found) => findings.extend(found),
            Err(e) => {
                log::warn!("detector '{}' failed: {}", detector.name(), e);
            },
        }
    }
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    findings.retain(|f| {
        seen.insert((
            f.category.as_str().to_string(),
            f.location.clone(),
            f.value.clone().unwrap_or_default(),
        ))
    });
    findings.sort_by(compare_findings);
    findings
}

/// Read an attribute value by qualified name.
pub(crate) fn attr(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        (a.key.as_ref() == name.as_bytes())
            .then(|| String::from_utf8_lossy(&a.value).into_owned())
    })
}

/// Concatenate all text content of an XML string, tags stripped, single
/// spaces between text nodes.
pub(crate) fn strip_tags(xml: &str) -> String {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Text(ref t)) => {
                if let Ok(text) = t.unescape() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(trimmed);
                    }
                }
            },
            Ok(quick_xml::events::Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    out
}

/// Slide number from a part path like `ppt/slides/slide3.xml`.
pub(crate) fn slide_number(path: &str) -> u32 {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DocumentFormat;
    use crate::extract;
    use crate::findings::Severity;

    #[test]
    fn test_run_all_orders_by_severity() {
        let bytes = crate::test_support::build_docx_with(
            "<w:p><w:r><w:t>hello world</w:t></w:r></w:p>",
            &[(
                "docProps/core.xml",
                "<cp:coreProperties xmlns:cp=\"x\" xmlns:dc=\"y\"><dc:creator>Alice</dc:creator><dc:title>Plan</dc:title></cp:coreProperties>",
            )],
        );
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let projection = extract::extract(&doc);
        let findings = run_all(&doc, &projection);
        assert!(!findings.is_empty());
        for window in findings.windows(2) {
            assert!(window[0].severity >= window[1].severity);
        }
    }

    #[test]
    fn test_run_all_dedupes() {
        let bytes = crate::test_support::build_docx("<w:p><w:r><w:t>x</w:t></w:r></w:p>");
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let projection = extract::extract(&doc);
        let findings = run_all(&doc, &projection);
        let mut keys: Vec<_> = findings
            .iter()
            .map(|f| (f.category, f.location.clone(), f.value.clone()))
            .collect();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn test_enrichment_never_reduces_findings() {
        let plain = crate::test_support::build_docx("<w:p><w:r><w:t>hello</w:t></w:r></w:p>");
        let enriched = crate::test_support::build_docx_with(
            "<w:p><w:r><w:t>hello</w:t></w:r></w:p>",
            &[(
                "docProps/core.xml",
                "<cp:coreProperties xmlns:cp=\"x\" xmlns:dc=\"y\"><dc:creator>Alice</dc:creator></cp:coreProperties>",
            )],
        );
        let doc_plain = Document::open(&plain, DocumentFormat::Docx, "a.docx").unwrap();
        let doc_rich = Document::open(&enriched, DocumentFormat::Docx, "a.docx").unwrap();
        let findings_plain = run_all(&doc_plain, &extract::extract(&doc_plain));
        let findings_rich = run_all(&doc_rich, &extract::extract(&doc_rich));
        assert!(findings_rich.len() >= findings_plain.len());
        assert!(findings_rich
            .iter()
            .any(|f| f.severity == Severity::High && f.kind == "author"));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<a><b>one</b><c>two</c></a>"),
            "one two"
        );
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide12.xml"), 12);
    }
}
