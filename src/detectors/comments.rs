//! Comments and speaker-notes detector.

use super::{attr, slide_number, strip_tags, Detector};
use crate::container::Document;
use crate::container::DocumentFormat;
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

pub struct CommentsDetector;

/// Severity from comment body keywords.
fn severity_for_text(text: &str) -> Severity {
    let lower = text.to_lowercase();
    if ["confidential", "urgent", "password"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Severity::High
    } else if ["draft", "internal", "review"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Severity::Medium
    } else {
        Severity::Low
    }
}

impl Detector for CommentsDetector {
    fn name(&self) -> &'static str {
        "comments"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        if let Some(pdf) = doc.pdf() {
            for (page, subtypes) in pdf.page_annotations().iter().enumerate() {
                if !subtypes.is_empty() {
                    findings.push(
                        Finding::new(
                            FindingCategory::Comments,
                            "annotation",
                            Severity::Medium,
                            format!("page {}", page + 1),
                        )
                        .with_value(format!("{} annotations: {}", subtypes.len(), subtypes.join(", "))),
                    );
                }
            }
            return Ok(findings);
        }
        let Some(container) = doc.ooxml() else {
            return Ok(Vec::new());
        };
        match doc.format {
            DocumentFormat::Docx => {
                if let Ok(xml) = container.read_part_str("word/comments.xml") {
                    collect_docx_comments(&xml, &mut findings);
                } else if let Ok(doc_xml) = container.read_part_str("word/document.xml") {
                    // Markers without a comments part still leak that a
                    // discussion existed.
                    let markers = doc_xml.matches("<w:commentReference").count();
                    if markers > 0 {
                        findings.push(
                            Finding::new(
                                FindingCategory::Comments,
                                "comment_reference",
                                Severity::Low,
                                "word/document.xml",
                            )
                            .with_value(format!("{} orphaned comment markers", markers)),
                        );
                    }
                }
            },
            DocumentFormat::Pptx => {
                let authors = container
                    .read_part_str("ppt/commentAuthors.xml")
                    .map(|xml| parse_comment_authors(&xml))
                    .unwrap_or_default();
                let mut comment_parts = container.list_parts("ppt/comments/comment*.xml");
                comment_parts.extend(container.list_parts("ppt/modernComments/*.xml"));
                for part in comment_parts {
                    if let Ok(xml) = container.read_part_str(&part) {
                        collect_pptx_comments(&part, &xml, &authors, &mut findings);
                    }
                }
                for part in container.list_parts("ppt/notesSlides/notesSlide*.xml") {
                    if let Ok(xml) = container.read_part_str(&part) {
                        let text = strip_tags(&xml);
                        if text.len() > 10 {
                            findings.push(
                                Finding::new(
                                    FindingCategory::Comments,
                                    "speaker_note",
                                    severity_for_text(&text),
                                    format!("notes slide {}", slide_number(&part)),
                                )
                                .with_value(truncate(&text, 200)),
                            );
                        }
                    }
                }
            },
            DocumentFormat::Xlsx => {
                for part in container.list_parts("xl/comments*.xml") {
                    if let Ok(xml) = container.read_part_str(&part) {
                        collect_xlsx_comments(&part, &xml, &mut findings);
                    }
                }
            },
            DocumentFormat::Pdf => {},
        }
        Ok(findings)
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

fn collect_docx_comments(xml: &str, findings: &mut Vec<Finding>) {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut id = String::new();
    let mut author = String::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"w:comment" {
                    depth += 1;
                    if depth == 1 {
                        id = attr(e, "w:id").unwrap_or_default();
                        author = attr(e, "w:author").unwrap_or_default();
                        text.clear();
                    }
                }
            },
            Ok(Event::Text(ref t)) => {
                if depth > 0 {
                    if let Ok(content) = t.unescape() {
                        text.push_str(&content);
                    }
                }
            },
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"w:comment" && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        let mut finding = Finding::new(
                            FindingCategory::Comments,
                            "comment",
                            severity_for_text(&text),
                            format!("word/comments.xml#{}", id),
                        )
                        .with_value(truncate(text.trim(), 200));
                        if !author.is_empty() {
                            finding = finding.with_evidence(format!("author: {}", author));
                        }
                        findings.push(finding);
                    }
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
}

fn parse_comment_authors(xml: &str) -> HashMap<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut authors = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"cmAuthor" || e.local_name().as_ref() == b"author" {
                    if let (Some(id), Some(name)) = (attr(e, "id"), attr(e, "name")) {
                        authors.insert(id, name);
                    }
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    authors
}

fn collect_pptx_comments(
    part: &str,
    xml: &str,
    authors: &HashMap<String, String>,
    findings: &mut Vec<Finding>,
) {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut in_comment = false;
    let mut author_id = String::new();
    let mut text = String::new();
    let mut index = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name().as_ref().to_vec();
                if local == b"cm" {
                    in_comment = true;
                    author_id = attr(e, "authorId").unwrap_or_default();
                    text.clear();
                }
            },
            Ok(Event::Text(ref t)) => {
                if in_comment {
                    if let Ok(content) = t.unescape() {
                        text.push_str(&content);
                    }
                }
            },
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"cm" && in_comment {
                    in_comment = false;
                    index += 1;
                    let mut finding = Finding::new(
                        FindingCategory::Comments,
                        "comment",
                        severity_for_text(&text),
                        format!("{}#{}", part, index),
                    )
                    .with_value(truncate(text.trim(), 200));
                    if let Some(name) = authors.get(&author_id) {
                        finding = finding.with_evidence(format!("author: {}", name));
                    }
                    findings.push(finding);
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
}

fn collect_xlsx_comments(part: &str, xml: &str, findings: &mut Vec<Finding>) {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut cell = String::new();
    let mut in_comment = false;
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"comment" {
                    in_comment = true;
                    cell = attr(e, "ref").unwrap_or_default();
                    text.clear();
                }
            },
            Ok(Event::Text(ref t)) => {
                if in_comment {
                    if let Ok(content) = t.unescape() {
                        text.push_str(&content);
                    }
                }
            },
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"comment" && in_comment {
                    in_comment = false;
                    findings.push(
                        Finding::new(
                            FindingCategory::Comments,
                            "comment",
                            severity_for_text(&text),
                            format!("{} cell {}", part, cell),
                        )
                        .with_value(truncate(text.trim(), 200)),
                    );
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
}
