//! Orphan-data detector.
//!
//! Leftovers that signal sloppy document hygiene: relationship targets
//! pointing at local files or SharePoint, slides with almost no text, and
//! whitespace residue from deleted content.

use super::{attr, Detector};
use crate::container::{Document, DocumentFormat};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use quick_xml::events::Event;
use quick_xml::Reader;

pub struct OrphanDataDetector;

/// Minimum slide text length to not be considered near-empty.
const MIN_SLIDE_CHARS: usize = 10;

/// How many long whitespace runs constitute residue.
const RESIDUE_RUNS: usize = 5;

impl Detector for OrphanDataDetector {
    fn name(&self) -> &'static str {
        "orphan_data"
    }

    fn detect(&self, doc: &Document, projection: &TextProjection) -> Result<Vec<Finding>> {
        let Some(container) = doc.ooxml() else {
            return Ok(Vec::new());
        };
        let mut findings = Vec::new();

        // Broken or internal link targets in relationship parts
        for part in container.list_parts("*_rels/*.rels") {
            let Ok(xml) = container.read_part_str(&part) else {
                continue;
            };
            let mut reader = Reader::from_str(&xml);
            let mut buf = Vec::new();
            loop {
                match reader.read_event_into(&mut buf) {
                    Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                        if e.local_name().as_ref() == b"Relationship" {
                            let target = attr(e, "Target").unwrap_or_default();
                            let lower = target.to_lowercase();
                            if lower.starts_with("file://") {
                                findings.push(
                                    Finding::new(
                                        FindingCategory::BrokenLinks,
                                        "local_file_link",
                                        Severity::Medium,
                                        part.clone(),
                                    )
                                    .with_value(target),
                                );
                            } else if lower.contains("sharepoint") {
                                findings.push(
                                    Finding::new(
                                        FindingCategory::BrokenLinks,
                                        "sharepoint_link",
                                        Severity::Medium,
                                        part.clone(),
                                    )
                                    .with_value(target),
                                );
                            }
                        }
                    },
                    Ok(Event::Eof) | Err(_) => break,
                    _ => {},
                }
                buf.clear();
            }
        }

        // Near-empty slides
        if doc.format == DocumentFormat::Pptx {
            for part in container.list_parts("ppt/slides/slide*.xml") {
                if let Ok(xml) = container.read_part_str(&part) {
                    let text = super::strip_tags(&xml);
                    if text.trim().len() < MIN_SLIDE_CHARS {
                        findings.push(
                            Finding::new(
                                FindingCategory::OrphanData,
                                "near_empty_slide",
                                Severity::Low,
                                format!("slide {}", super::slide_number(&part)),
                            )
                            .with_value(format!("{} chars of text", text.trim().len())),
                        );
                    }
                }
            }
        }

        // Whitespace residue in the projection
        let runs = whitespace_runs(&projection.text);
        if runs >= RESIDUE_RUNS {
            findings.push(
                Finding::new(
                    FindingCategory::OrphanData,
                    "whitespace_residue",
                    Severity::Low,
                    "document text",
                )
                .with_value(format!("{} long whitespace runs", runs)),
            );
        }
        Ok(findings)
    }
}

/// Count runs of three or more consecutive whitespace characters.
fn whitespace_runs(text: &str) -> usize {
    let mut runs = 0usize;
    let mut current = 0usize;
    for ch in text.chars() {
        if ch.is_whitespace() {
            current += 1;
        } else {
            if current >= 3 {
                runs += 1;
            }
            current = 0;
        }
    }
    if current >= 3 {
        runs += 1;
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn test_local_file_link() {
        let rels = "<Relationships xmlns=\"r\">\
            <Relationship Id=\"rId9\" Type=\"hyperlink\" Target=\"file:///C:/temp/old.docx\" TargetMode=\"External\"/>\
            </Relationships>";
        let bytes = crate::test_support::build_docx_with(
            "<w:p/>",
            &[("word/_rels/document.xml.rels", rels)],
        );
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let findings = OrphanDataDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert!(findings.iter().any(|f| f.kind == "local_file_link"));
    }

    #[test]
    fn test_sharepoint_link() {
        let rels = "<Relationships xmlns=\"r\">\
            <Relationship Id=\"rId9\" Type=\"hyperlink\" Target=\"https://acme.sharepoint.com/sites/finance/doc.xlsx\" TargetMode=\"External\"/>\
            </Relationships>";
        let bytes = crate::test_support::build_docx_with(
            "<w:p/>",
            &[("word/_rels/document.xml.rels", rels)],
        );
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let findings = OrphanDataDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert!(findings.iter().any(|f| f.kind == "sharepoint_link"));
    }

    #[test]
    fn test_near_empty_slide() {
        let bytes = crate::test_support::build_pptx(&[
            "<p:sp><p:txBody><a:p><a:r><a:t>ok</a:t></a:r></a:p></p:txBody></p:sp>",
        ]);
        let doc = Document::open(&bytes, DocumentFormat::Pptx, "t.pptx").unwrap();
        let findings = OrphanDataDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert!(findings.iter().any(|f| f.kind == "near_empty_slide"));
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(whitespace_runs("a   b    c"), 2);
        assert_eq!(whitespace_runs("a b c"), 0);
    }
}
