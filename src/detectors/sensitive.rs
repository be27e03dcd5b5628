//! Sensitive-data detector: projects the pattern library over the text.
//!
//! All finding values are the masked renderings; raw secrets never leave
//! the pattern module. Confidential-marker matches are classified as
//! compliance risks, the rest as sensitive data.

use super::Detector;
use crate::container::Document;
use crate::error::Result;
use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory};
use crate::patterns;

pub struct SensitiveDataDetector;

impl Detector for SensitiveDataDetector {
    fn name(&self) -> &'static str {
        "sensitive_data"
    }

    fn detect(&self, _doc: &Document, projection: &TextProjection) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for m in patterns::scan(&projection.text) {
            let category = if m.kind == "confidential_keyword" {
                FindingCategory::ComplianceRisks
            } else {
                FindingCategory::SensitiveData
            };
            findings.push(
                Finding::new(
                    category,
                    m.kind,
                    m.severity,
                    format!("text position {}", m.start),
                )
                .with_value(m.masked.clone())
                .with_context(m.context.clone())
                .with_gdpr(m.gdpr_relevant),
            );
        }
        Ok(findings)
    }
}
