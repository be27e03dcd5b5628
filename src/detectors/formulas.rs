//! Sensitive-formula detector (XLSX).
//!
//! Scans `<f>` elements in every worksheet and classifies the risk of the
//! formula source: external workbook references, SQL/ODBC bridges, web
//! functions, local paths, and dynamic indirection.

use super::{attr, Detector};
use crate::container::{Document, DocumentFormat};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

pub struct SensitiveFormulasDetector;

lazy_static! {
    static ref RE_SQL: Regex = Regex::new(r"(?i)SQL\.REQUEST|ODBC|DSN=").unwrap();
    static ref RE_WEB: Regex = Regex::new(r"(?i)\b(WEBSERVICE|FILTERXML)\s*\(").unwrap();
    static ref RE_DYNAMIC: Regex = Regex::new(r"(?i)\b(INDIRECT|OFFSET)\s*\(").unwrap();
}

/// Classify one formula; `None` when it is unremarkable.
fn classify(formula: &str) -> Option<(Severity, &'static str)> {
    if formula.contains('[') && formula.contains(']') {
        return Some((Severity::High, "External file reference"));
    }
    if RE_SQL.is_match(formula) {
        return Some((Severity::High, "SQL/ODBC data source"));
    }
    if RE_WEB.is_match(formula) {
        return Some((Severity::High, "Web service call"));
    }
    if formula.contains("C:\\") || formula.contains("/Users/") {
        return Some((Severity::Medium, "Local path reference"));
    }
    if RE_DYNAMIC.is_match(formula) {
        return Some((Severity::Low, "Dynamic reference"));
    }
    None
}

impl Detector for SensitiveFormulasDetector {
    fn name(&self) -> &'static str {
        "sensitive_formulas"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        if doc.format != DocumentFormat::Xlsx {
            return Ok(Vec::new());
        }
        let Some(container) = doc.ooxml() else {
            return Ok(Vec::new());
        };
        let mut findings = Vec::new();
        for part in container.list_parts("xl/worksheets/sheet*.xml") {
            let Ok(xml) = container.read_part_str(&part) else {
                continue;
            };
            let mut reader = Reader::from_str(&xml);
            let mut buf = Vec::new();
            let mut cell = String::new();
            let mut in_formula = false;
            let mut formula = String::new();
            loop {
                match reader.read_event_into(&mut buf) {
                    Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                        b"c" => cell = attr(e, "r").unwrap_or_default(),
                        b"f" => {
                            in_formula = true;
                            formula.clear();
                        },
                        _ => {},
                    },
                    Ok(Event::Empty(ref e)) => {
                        if e.local_name().as_ref() == b"c" {
                            cell = attr(e, "r").unwrap_or_default();
                        }
                    },
                    Ok(Event::Text(ref t)) => {
                        if in_formula {
                            if let Ok(text) = t.unescape() {
                                formula.push_str(&text);
                            }
                        }
                    },
                    Ok(Event::End(ref e)) => {
                        if e.local_name().as_ref() == b"f" && in_formula {
                            in_formula = false;
                            if let Some((severity, reason)) = classify(&formula) {
                                findings.push(
                                    Finding::new(
                                        FindingCategory::SensitiveFormulas,
                                        "formula",
                                        severity,
                                        format!("{} cell {}", part, cell),
                                    )
                                    .with_value(formula.clone())
                                    .with_evidence(reason),
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
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    fn detect_with(sheet_data: &str) -> Vec<Finding> {
        let bytes = crate::test_support::XlsxBuilder::new()
            .sheet("Sheet1", sheet_data)
            .build();
        let doc = Document::open(&bytes, DocumentFormat::Xlsx, "t.xlsx").unwrap();
        SensitiveFormulasDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap()
    }

    #[test]
    fn test_external_reference_is_high() {
        let findings = detect_with(
            "<row r=\"1\"><c r=\"A1\"><f>[pricebook.xlsx]Sheet1!A1</f><v>10</v></c></row>",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].evidence.as_deref(), Some("External file reference"));
        assert!(findings[0].location.contains("cell A1"));
    }

    #[test]
    fn test_webservice_is_high() {
        let findings = detect_with(
            "<row r=\"1\"><c r=\"B2\"><f>WEBSERVICE(&quot;http://x&quot;)</f></c></row>",
        );
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_local_path_is_medium() {
        let findings = detect_with(
            "<row r=\"1\"><c r=\"C3\"><f>'C:\\data\\[book.xlsx]S'!A1</f></c></row>",
        );
        // External bracket wins over path
        assert_eq!(findings[0].severity, Severity::High);
        let findings =
            detect_with("<row r=\"1\"><c r=\"C3\"><f>INFO(&quot;C:\\temp&quot;)</f></c></row>");
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_dynamic_is_low_and_plain_is_clean() {
        let findings =
            detect_with("<row r=\"1\"><c r=\"D4\"><f>INDIRECT(A1)</f></c></row>");
        assert_eq!(findings[0].severity, Severity::Low);
        assert!(detect_with("<row r=\"1\"><c r=\"D4\"><f>SUM(A1:A9)</f></c></row>").is_empty());
    }
}
