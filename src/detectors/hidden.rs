//! Hidden-content detectors.
//!
//! DOCX: vanished runs, white text, tiny fonts (aggregate counts).
//! PPTX: slides excluded from the show, heavy white-text slides, shapes
//! positioned outside the slide bounds.
//! XLSX: hidden and very-hidden sheets, hidden rows and columns, defined
//! names that point into hidden sheets.

use super::{attr, slide_number, Detector};
use crate::container::{Document, DocumentFormat};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

/// Approximate slide bounds in EMU (16:9 default).
const SLIDE_WIDTH_EMU: i64 = 9_144_000;
const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

lazy_static! {
    static ref RE_VANISH: Regex = Regex::new(r"<w:vanish\s*/>").unwrap();
    static ref RE_WHITE: Regex = Regex::new(r#"w:val="FFFFFF""#).unwrap();
    static ref RE_TINY_SZ: Regex = Regex::new(r#"<w:sz w:val="[1-9]"\s*/>"#).unwrap();
    static ref RE_WHITE_SRGB: Regex = Regex::new(r#"<a:srgbClr val="FFFFFF""#).unwrap();
}

pub struct HiddenContentDetector;

impl Detector for HiddenContentDetector {
    fn name(&self) -> &'static str {
        "hidden_content"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        match doc.format {
            DocumentFormat::Docx => detect_docx(doc),
            DocumentFormat::Pptx => detect_pptx(doc),
            DocumentFormat::Xlsx => detect_xlsx(doc),
            DocumentFormat::Pdf => Ok(Vec::new()),
        }
    }
}

fn detect_docx(doc: &Document) -> Result<Vec<Finding>> {
    let Some(container) = doc.ooxml() else {
        return Ok(Vec::new());
    };
    let Ok(xml) = container.read_part_str("word/document.xml") else {
        return Ok(Vec::new());
    };
    let mut findings = Vec::new();
    let vanish = RE_VANISH.find_iter(&xml).count();
    if vanish > 0 {
        findings.push(aggregate(
            "hidden_text",
            Severity::High,
            "word/document.xml",
            vanish,
            "runs formatted as hidden",
        ));
    }
    let white = RE_WHITE.find_iter(&xml).count();
    if white > 0 {
        findings.push(aggregate(
            "white_text",
            Severity::Medium,
            "word/document.xml",
            white,
            "white-on-white color uses",
        ));
    }
    let tiny = RE_TINY_SZ.find_iter(&xml).count();
    if tiny > 0 {
        findings.push(aggregate(
            "tiny_font",
            Severity::Medium,
            "word/document.xml",
            tiny,
            "runs below readable size",
        ));
    }
    Ok(findings)
}

fn aggregate(kind: &str, severity: Severity, location: &str, count: usize, what: &str) -> Finding {
    Finding::new(FindingCategory::HiddenContent, kind, severity, location)
        .with_value(format!("{} {}", count, what))
}

fn detect_pptx(doc: &Document) -> Result<Vec<Finding>> {
    let Some(container) = doc.ooxml() else {
        return Ok(Vec::new());
    };
    let mut findings = Vec::new();

    // Slides excluded from the slide show
    if let Ok(pres) = container.read_part_str("ppt/presentation.xml") {
        let mut reader = Reader::from_str(&pres);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() == b"sldId"
                        && attr(e, "show").as_deref() == Some("0")
                    {
                        let id = attr(e, "id").unwrap_or_default();
                        findings.push(
                            Finding::new(
                                FindingCategory::HiddenContent,
                                "hidden_slide",
                                Severity::High,
                                format!("slide id {}", id),
                            )
                            .with_value("slide excluded from slide show"),
                        );
                    }
                },
                Ok(Event::Eof) | Err(_) => break,
                _ => {},
            }
            buf.clear();
        }
    }

    for part in container.list_parts("ppt/slides/slide*.xml") {
        let Ok(xml) = container.read_part_str(&part) else {
            continue;
        };
        let white = RE_WHITE_SRGB.find_iter(&xml).count();
        if white > 2 {
            findings.push(
                Finding::new(
                    FindingCategory::HiddenContent,
                    "white_text",
                    Severity::Medium,
                    format!("slide {}", slide_number(&part)),
                )
                .with_value(format!("{} white-text uses", white)),
            );
        }
        let off_slide = count_off_slide_shapes(&xml);
        if off_slide > 0 {
            findings.push(
                Finding::new(
                    FindingCategory::HiddenContent,
                    "off_slide_shape",
                    Severity::High,
                    format!("slide {}", slide_number(&part)),
                )
                .with_value(format!("{} shapes positioned outside the slide", off_slide)),
            );
        }
    }
    Ok(findings)
}

fn count_off_slide_shapes(xml: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut count = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"a:off" {
                    let x: i64 = attr(e, "x").and_then(|v| v.parse().ok()).unwrap_or(0);
                    let y: i64 = attr(e, "y").and_then(|v| v.parse().ok()).unwrap_or(0);
                    if x < 0 || y < 0 || x > SLIDE_WIDTH_EMU || y > SLIDE_HEIGHT_EMU {
                        count += 1;
                    }
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    count
}

/// Hidden sheet entry parsed from workbook.xml.
pub(crate) struct SheetEntry {
    pub name: String,
    pub rel_id: String,
    pub state: Option<String>,
}

/// Parse `<sheet>` entries from workbook.xml.
pub(crate) fn workbook_sheets(xml: &str) -> Vec<SheetEntry> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    sheets.push(SheetEntry {
                        name: attr(e, "name").unwrap_or_default(),
                        rel_id: attr(e, "r:id").unwrap_or_default(),
                        state: attr(e, "state"),
                    });
                }
            },
            Ok(Event::Eof) | Err(_) => break,
            _ => {},
        }
        buf.clear();
    }
    sheets
}

fn detect_xlsx(doc: &Document) -> Result<Vec<Finding>> {
    let Some(container) = doc.ooxml() else {
        return Ok(Vec::new());
    };
    let mut findings = Vec::new();
    let mut hidden_names: Vec<String> = Vec::new();

    if let Ok(workbook) = container.read_part_str("xl/workbook.xml") {
        for sheet in workbook_sheets(&workbook) {
            match sheet.state.as_deref() {
                Some("hidden") => {
                    hidden_names.push(sheet.name.clone());
                    findings.push(
                        Finding::new(
                            FindingCategory::HiddenSheets,
                            "hidden_sheet",
                            Severity::High,
                            format!("sheet '{}'", sheet.name),
                        )
                        .with_value(sheet.name.clone()),
                    );
                },
                Some("veryHidden") => {
                    hidden_names.push(sheet.name.clone());
                    findings.push(
                        Finding::new(
                            FindingCategory::HiddenSheets,
                            "very_hidden_sheet",
                            Severity::High,
                            format!("sheet '{}'", sheet.name),
                        )
                        .with_value(sheet.name.clone()),
                    );
                },
                _ => {},
            }
        }

        // Defined names pointing into hidden sheets
        let mut reader = Reader::from_str(&workbook);
        let mut buf = Vec::new();
        let mut in_defined = false;
        let mut defined_name = String::new();
        let mut defined_value = String::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"definedName" {
                        in_defined = true;
                        defined_name = attr(e, "name").unwrap_or_default();
                        defined_value.clear();
                    }
                },
                Ok(Event::Text(ref t)) => {
                    if in_defined {
                        if let Ok(text) = t.unescape() {
                            defined_value.push_str(&text);
                        }
                    }
                },
                Ok(Event::End(ref e)) => {
                    if e.local_name().as_ref() == b"definedName" && in_defined {
                        in_defined = false;
                        if hidden_names
                            .iter()
                            .any(|n| defined_value.contains(n.as_str()))
                        {
                            findings.push(
                                Finding::new(
                                    FindingCategory::ExcelHiddenData,
                                    "defined_name",
                                    Severity::Medium,
                                    "xl/workbook.xml",
                                )
                                .with_value(format!("{}={}", defined_name, defined_value)),
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

    for part in container.list_parts("xl/worksheets/sheet*.xml") {
        let Ok(xml) = container.read_part_str(&part) else {
            continue;
        };
        let mut hidden_cols = 0usize;
        let mut hidden_rows = 0usize;
        let mut reader = Reader::from_str(&xml);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let hidden = attr(e, "hidden").as_deref() == Some("1")
                        || attr(e, "hidden").as_deref() == Some("true");
                    match e.local_name().as_ref() {
                        b"col" if hidden => hidden_cols += 1,
                        b"row" if hidden => hidden_rows += 1,
                        _ => {},
                    }
                },
                Ok(Event::Eof) | Err(_) => break,
                _ => {},
            }
            buf.clear();
        }
        if hidden_cols > 0 {
            findings.push(
                Finding::new(
                    FindingCategory::HiddenColumns,
                    "hidden_columns",
                    Severity::Medium,
                    part.clone(),
                )
                .with_value(format!("{} hidden column ranges", hidden_cols)),
            );
        }
        if hidden_rows > 0 {
            findings.push(
                Finding::new(
                    FindingCategory::HiddenColumns,
                    "hidden_rows",
                    Severity::Medium,
                    part.clone(),
                )
                .with_value(format!("{} hidden rows", hidden_rows)),
            );
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn test_docx_hidden_aggregates() {
        let body = "<w:p><w:r><w:rPr><w:vanish/></w:rPr><w:t>secret</w:t></w:r>\
            <w:r><w:rPr><w:color w:val=\"FFFFFF\"/></w:rPr><w:t>white</w:t></w:r>\
            <w:r><w:rPr><w:sz w:val=\"2\"/></w:rPr><w:t>tiny</w:t></w:r></w:p>";
        let bytes = crate::test_support::build_docx(body);
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let findings = HiddenContentDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().any(|f| f.kind == "hidden_text" && f.severity == Severity::High));
        assert!(findings.iter().any(|f| f.kind == "white_text"));
        assert!(findings.iter().any(|f| f.kind == "tiny_font"));
    }

    #[test]
    fn test_xlsx_hidden_sheets() {
        let bytes = crate::test_support::XlsxBuilder::new()
            .sheet("Visible", "")
            .hidden_sheet("HiddenPrices", "", false)
            .hidden_sheet("Secrets", "", true)
            .build();
        let doc = Document::open(&bytes, DocumentFormat::Xlsx, "t.xlsx").unwrap();
        let findings = HiddenContentDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        let hidden: Vec<_> = findings
            .iter()
            .filter(|f| f.category == FindingCategory::HiddenSheets)
            .collect();
        assert_eq!(hidden.len(), 2);
        assert!(hidden.iter().any(|f| f.kind == "hidden_sheet"));
        assert!(hidden.iter().any(|f| f.kind == "very_hidden_sheet"));
    }

    #[test]
    fn test_xlsx_hidden_rows_and_columns() {
        let bytes = crate::test_support::XlsxBuilder::new()
            .sheet(
                "Sheet1",
                "<row r=\"1\" hidden=\"1\"><c r=\"A1\"><v>1</v></c></row>",
            )
            .build();
        let doc = Document::open(&bytes, DocumentFormat::Xlsx, "t.xlsx").unwrap();
        let findings = HiddenContentDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert!(findings.iter().any(|f| f.kind == "hidden_rows"));
    }

    #[test]
    fn test_pptx_off_slide_shape() {
        let slide = "<p:sp><p:spPr><a:xfrm><a:off x=\"12000000\" y=\"0\"/><a:ext cx=\"100\" cy=\"100\"/></a:xfrm></p:spPr>\
            <p:txBody><a:p><a:r><a:t>hidden note</a:t></a:r></a:p></p:txBody></p:sp>";
        let bytes = crate::test_support::build_pptx(&[slide]);
        let doc = Document::open(&bytes, DocumentFormat::Pptx, "t.pptx").unwrap();
        let findings = HiddenContentDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        let off = findings.iter().find(|f| f.kind == "off_slide_shape").unwrap();
        assert_eq!(off.severity, Severity::High);
        assert!(off.location.contains("slide 1"));
    }
}
