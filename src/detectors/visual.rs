//! Visual-object detector.
//!
//! Large, solid-filled shapes without text are the classic way content is
//! "redacted" by covering it. PPTX: aggregated per slide. DOCX: anchored
//! drawings with a solid fill.

use super::{attr, slide_number, Detector};
use crate::container::{Document, DocumentFormat};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Minimum shape size (EMU) to be considered a covering object.
const MIN_CX_EMU: i64 = 2_000_000;
const MIN_CY_EMU: i64 = 500_000;

pub struct VisualObjectsDetector;

impl Detector for VisualObjectsDetector {
    fn name(&self) -> &'static str {
        "visual_objects"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        let Some(container) = doc.ooxml() else {
            return Ok(Vec::new());
        };
        let mut findings = Vec::new();
        match doc.format {
            DocumentFormat::Pptx => {
                for part in container.list_parts("ppt/slides/slide*.xml") {
                    let Ok(xml) = container.read_part_str(&part) else {
                        continue;
                    };
                    let count = count_covering_shapes(&xml, "p:sp");
                    if count > 0 {
                        findings.push(
                            Finding::new(
                                FindingCategory::VisualObjects,
                                "covering_shape",
                                Severity::Medium,
                                format!("slide {}", slide_number(&part)),
                            )
                            .with_value(format!("{} large filled shapes without text", count)),
                        );
                    }
                }
            },
            DocumentFormat::Docx => {
                let Ok(xml) = container.read_part_str("word/document.xml") else {
                    return Ok(findings);
                };
                let anchored = xml.matches("<wp:anchor").count();
                let filled = xml.matches("<a:solidFill").count();
                if anchored > 0 && filled > 0 {
                    findings.push(
                        Finding::new(
                            FindingCategory::VisualObjects,
                            "anchored_drawing",
                            Severity::Medium,
                            "word/document.xml",
                        )
                        .with_value(format!("{} anchored drawings with solid fill", anchored)),
                    );
                }
            },
            _ => {},
        }
        Ok(findings)
    }
}

/// Count shapes with a solid fill, no text, and covering size.
fn count_covering_shapes(xml: &str, shape_tag: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut count = 0usize;
    let mut depth = 0usize;
    let mut has_fill = false;
    let mut has_text = false;
    let mut big = false;
    let open = shape_tag.as_bytes();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == open {
                    depth += 1;
                    if depth == 1 {
                        has_fill = false;
                        has_text = false;
                        big = false;
                    }
                } else if depth > 0 {
                    match e.name().as_ref() {
                        b"a:solidFill" => has_fill = true,
                        b"a:t" => has_text = true,
                        _ => {},
                    }
                }
            },
            Ok(Event::Empty(ref e)) => {
                if depth > 0 && e.name().as_ref() == b"a:ext" {
                    let cx: i64 = attr(e, "cx").and_then(|v| v.parse().ok()).unwrap_or(0);
                    let cy: i64 = attr(e, "cy").and_then(|v| v.parse().ok()).unwrap_or(0);
                    if cx >= MIN_CX_EMU && cy >= MIN_CY_EMU {
                        big = true;
                    }
                }
            },
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == open && depth > 0 {
                    depth -= 1;
                    if depth == 0 && has_fill && !has_text && big {
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
