//! Embedded-object and macro detectors.

use super::Detector;
use crate::container::{Container, Document};
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};

/// One finding per embedded OLE object part (or PDF attachment).
pub struct EmbeddedObjectsDetector;

impl Detector for EmbeddedObjectsDetector {
    fn name(&self) -> &'static str {
        "embedded_objects"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        match &doc.container {
            Container::Ooxml(container) => {
                for part in container.list_parts("*/embeddings/*") {
                    let name = part.rsplit('/').next().unwrap_or(&part).to_string();
                    findings.push(
                        Finding::new(
                            FindingCategory::EmbeddedObjects,
                            "embedded_object",
                            Severity::Medium,
                            part.clone(),
                        )
                        .with_value(name),
                    );
                }
            },
            Container::Pdf(pdf) => {
                for name in pdf.embedded_file_names() {
                    findings.push(
                        Finding::new(
                            FindingCategory::EmbeddedObjects,
                            "attachment",
                            Severity::Medium,
                            "pdf embedded files",
                        )
                        .with_value(name),
                    );
                }
            },
        }
        Ok(findings)
    }
}

/// A single critical finding when any VBA project blob is present.
pub struct MacrosDetector;

impl Detector for MacrosDetector {
    fn name(&self) -> &'static str {
        "macros"
    }

    fn detect(&self, doc: &Document, _projection: &TextProjection) -> Result<Vec<Finding>> {
        let Some(container) = doc.ooxml() else {
            return Ok(Vec::new());
        };
        let blobs = macro_parts(container);
        if blobs.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::new(
            FindingCategory::Macros,
            "vba_project",
            Severity::Critical,
            blobs[0].clone(),
        )
        .with_value(format!("{} macro blobs", blobs.len()))])
    }
}

/// Parts that carry VBA code.
pub(crate) fn macro_parts(container: &crate::container::OoxmlContainer) -> Vec<String> {
    let mut parts = container.list_parts("*vbaProject*");
    for extra in container.list_parts("*vbaData*") {
        if !parts.contains(&extra) {
            parts.push(extra);
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DocumentFormat;
    use crate::extract;

    #[test]
    fn test_embedded_objects() {
        let bytes = crate::test_support::build_docx_with(
            "<w:p/>",
            &[("word/embeddings/oleObject1.bin", "BLOB")],
        );
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let findings = EmbeddedObjectsDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].value.as_deref(), Some("oleObject1.bin"));
    }

    #[test]
    fn test_macro_gate_single_critical() {
        let bytes = crate::test_support::XlsxBuilder::new()
            .sheet("Sheet1", "")
            .part("xl/vbaProject.bin", b"\xd0\xcf\x11\xe0 fake vba")
            .build();
        let doc = Document::open(&bytes, DocumentFormat::Xlsx, "t.xlsx").unwrap();
        let findings = MacrosDetector.detect(&doc, &extract::extract(&doc)).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn test_no_macros_no_finding() {
        let bytes = crate::test_support::build_docx("<w:p/>");
        let doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        assert!(MacrosDetector
            .detect(&doc, &extract::extract(&doc))
            .unwrap()
            .is_empty());
    }
}
