//! Document-properties detector.
//!
//! Reads `docProps/core.xml`, `docProps/app.xml`, and `docProps/custom.xml`
//! for OOXML, or the info dictionary for PDF. Every non-empty recognized
//! value becomes one finding; identity-bearing keys rank high.

use super::{attr, Detector};
use crate::container::{Container, Document};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use quick_xml::events::Event;
use quick_xml::Reader;

pub struct MetadataDetector;

/// Severity for a recognized metadata key.
fn severity_for(kind: &str) -> Severity {
    match kind {
        "author" | "lastModifiedBy" | "company" | "manager" => Severity::High,
        "editingTime" | "created" | "modified" => Severity::Medium,
        _ => Severity::Low,
    }
}

impl Detector for MetadataDetector {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        match &doc.container {
            Container::Ooxml(container) => {
                if let Ok(xml) = container.read_part_str("docProps/core.xml") {
                    collect_core(&xml, &mut findings);
                }
                if let Ok(xml) = container.read_part_str("docProps/app.xml") {
                    collect_app(&xml, &mut findings);
                }
                if let Ok(xml) = container.read_part_str("docProps/custom.xml") {
                    collect_custom(&xml, &mut findings);
                }
            },
            Container::Pdf(pdf) => {
                for (key, value) in pdf.info_entries() {
                    let kind = match key.as_str() {
                        "Author" => "author",
                        "Title" => "title",
                        "Subject" => "subject",
                        "Keywords" => "keywords",
                        "Creator" | "Producer" => "application",
                        "CreationDate" => "created",
                        "ModDate" => "modified",
                        _ => continue,
                    };
                    findings.push(make_finding(kind, "pdf info dictionary", &value));
                }
            },
        }
        Ok(findings)
    }
}

fn make_finding(kind: &str, location: &str, value: &str) -> Finding {
    Finding::new(
        FindingCategory::Metadata,
        kind,
        severity_for(kind),
        location,
    )
    .with_value(value)
}

/// Map core.xml element local names to metadata kinds.
fn collect_core(xml: &str, findings: &mut Vec<Finding>) {
    for (local, value) in element_texts(xml) {
        let kind = match local.as_str() {
            "creator" => "author",
            "lastModifiedBy" => "lastModifiedBy",
            "title" => "title",
            "subject" => "subject",
            "keywords" => "keywords",
            "created" => "created",
            "modified" => "modified",
            _ => continue,
        };
        if !value.trim().is_empty() {
            findings.push(make_finding(kind, "docProps/core.xml", value.trim()));
        }
    }
}

fn collect_app(xml: &str, findings: &mut Vec<Finding>) {
    for (local, value) in element_texts(xml) {
        let kind = match local.as_str() {
            "Company" => "company",
            "Manager" => "manager",
            "Application" => "application",
            "TotalTime" => "editingTime",
            _ => continue,
        };
        if !value.trim().is_empty() && value.trim() != "0" {
            findings.push(make_finding(kind, "docProps/app.xml", value.trim()));
        }
    }
}

/// Custom properties: every named value is reported.
fn collect_custom(xml: &str, findings: &mut Vec<Finding>) {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_value = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"property" {
                    current_name = attr(e, "name");
                    current_value.clear();
                }
            },
            Ok(Event::Text(ref t)) => {
                if current_name.is_some() {
                    if let Ok(text) = t.unescape() {
                        current_value.push_str(&text);
                    }
                }
            },
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"property" {
                    if let Some(name) = current_name.take() {
                        if !current_value.trim().is_empty() {
                            findings.push(
                                Finding::new(
                                    FindingCategory::Metadata,
                                    "custom",
                                    Severity::Low,
                                    "docProps/custom.xml",
                                )
                                .with_value(format!("{}={}", name, current_value.trim())),
                            );
                        }
                    }
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
}

/// (local element name, text content) pairs of a flat properties part.
fn element_texts(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut value = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                value.clear();
            },
            Ok(Event::Text(ref t)) => {
                if current.is_some() {
                    if let Ok(text) = t.unescape() {
                        value.push_str(&text);
                    }
                }
            },
            Ok(Event::End(_)) => {
                if let Some(name) = current.take() {
                    out.push((name, value.clone()));
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    out
}
