//! Tracked-changes detector (DOCX only).
//!
//! One finding per `<w:ins>` or `<w:del>` element. Insertions adjacent to
//! deletions are deliberately not merged; a replacement shows up as two
//! findings.

use super::{attr, Detector};
use crate::container::{Document, DocumentFormat};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use quick_xml::events::Event;
use quick_xml::Reader;

pub struct TrackChangesDetector;

impl Detector for TrackChangesDetector {
    fn name(&self) -> &'static str {
        "track_changes"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        if doc.format != DocumentFormat::Docx {
            return Ok(Vec::new());
        }
        let Some(container) = doc.ooxml() else {
            return Ok(Vec::new());
        };
        let Ok(xml) = container.read_part_str("word/document.xml") else {
            return Ok(Vec::new());
        };

        let mut findings = Vec::new();
        let mut reader = Reader::from_str(&xml);
        let mut buf = Vec::new();
        // Stack of open revision elements (kind, author, date, text)
        let mut stack: Vec<(bool, String, String, String)> = Vec::new();
        let mut index = 0usize;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"w:ins" | b"w:del" => {
                        let is_insertion = e.name().as_ref() == b"w:ins";
                        stack.push((
                            is_insertion,
                            attr(e, "w:author").unwrap_or_default(),
                            attr(e, "w:date").unwrap_or_default(),
                            String::new(),
                        ));
                    },
                    _ => {},
                },
                Ok(Event::Text(ref t)) => {
                    if let Some(top) = stack.last_mut() {
                        if let Ok(text) = t.unescape() {
                            top.3.push_str(&text);
                        }
                    }
                },
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"w:ins" | b"w:del" => {
                        if let Some((is_insertion, author, date, text)) = stack.pop() {
                            index += 1;
                            let kind = if is_insertion { "insertion" } else { "deletion" };
                            let mut finding = Finding::new(
                                FindingCategory::TrackChanges,
                                kind,
                                Severity::Medium,
                                format!("word/document.xml change {}", index),
                            )
                            .with_value(text.trim());
                            let mut evidence = String::new();
                            if !author.is_empty() {
                                evidence.push_str(&format!("author: {}", author));
                            }
                            if !date.is_empty() {
                                if !evidence.is_empty() {
                                    evidence.push_str(", ");
                                }
                                evidence.push_str(&format!("date: {}", date));
                            }
                            if !evidence.is_empty() {
                                finding = finding.with_evidence(evidence);
                            }
                            findings.push(finding);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) | Err(_) => break,
                _ => {},
            }
            buf.clear();
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn test_insertion_and_deletion_stay_separate() {
        let body = "<w:p>\
            <w:del w:id=\"1\" w:author=\"Alice\" w:date=\"2024-03-01T09:00:00Z\">\
            <w:r><w:delText>old price</w:delText></w:r></w:del>\
            <w:ins w:id=\"2\" w:author=\"Alice\" w:date=\"2024-03-01T09:00:00Z\">\
            <w:r><w:t>new price</w:t></w:r></w:ins>\
            </w:p>";
        let bytes = crate::test_support::build_docx(body);
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let findings = TrackChangesDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert_eq!(findings.len(), 2);
        let deletion = findings.iter().find(|f| f.kind == "deletion").unwrap();
        assert_eq!(deletion.value.as_deref(), Some("old price"));
        assert!(deletion.evidence.as_deref().unwrap().contains("Alice"));
        let insertion = findings.iter().find(|f| f.kind == "insertion").unwrap();
        assert_eq!(insertion.value.as_deref(), Some("new price"));
    }

    #[test]
    fn test_not_applicable_to_pptx() {
        let bytes = crate::test_support::build_pptx(&["<p:sp/>"]);
        let doc = Document::open(&bytes, DocumentFormat::Pptx, "t.pptx").unwrap();
        let findings = TrackChangesDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert!(findings.is_empty());
    }
}
