//! Technical risk scorer.
//!
//! Two tables drive the score: severity weights and per-category capped
//! penalties. The scoring function is a pure reduction over findings;
//! no branching logic hides in it.

use crate::findings::{Finding, FindingCategory, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity weight table.
pub const SEVERITY_WEIGHTS: [(Severity, u32); 4] = [
    (Severity::Critical, 25),
    (Severity::High, 10),
    (Severity::Medium, 5),
    (Severity::Low, 2),
];

/// Per-category cap table: (breakdown key, per-finding penalty, cap).
const CATEGORY_CAPS: [(&str, u32, u32); 10] = [
    ("sensitiveData", 25, 50),
    ("macros", 15, 30),
    ("hidden", 8, 24),
    ("comments", 3, 15),
    ("trackChanges", 3, 15),
    ("metadata", 2, 10),
    ("embeddedObjects", 5, 15),
    ("spelling", 1, 10),
    ("brokenLinks", 4, 12),
    ("compliance", 12, 36),
];

/// Extra penalty per finding beyond this count.
const VOLUME_THRESHOLD: usize = 10;
const VOLUME_UNIT: u32 = 2;

/// Overall risk level derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// 90 and above
    Safe,
    /// 70 to 89
    Low,
    /// 50 to 69
    Medium,
    /// 25 to 49
    High,
    /// Below 25
    Critical,
}

impl RiskLevel {
    /// Ordinal thresholds per the scoring model.
    pub fn from_score(score: u32) -> Self {
        match score {
            90..=100 => RiskLevel::Safe,
            70..=89 => RiskLevel::Low,
            50..=69 => RiskLevel::Medium,
            25..=49 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

/// Severity counts plus the derived score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Critical findings.
    pub critical: usize,
    /// High findings.
    pub high: usize,
    /// Medium findings.
    pub medium: usize,
    /// Low findings.
    pub low: usize,
    /// Total findings.
    pub total_issues: usize,
    /// Risk score in `[0, 100]`.
    pub risk_score: u32,
    /// Ordinal risk level.
    pub risk_level: RiskLevel,
    /// Penalty attributable to each category (severity plus cap), plus
    /// the volume penalty.
    pub risk_breakdown: BTreeMap<String, u32>,
}

fn breakdown_key(category: FindingCategory) -> &'static str {
    match category {
        FindingCategory::SensitiveData => "sensitiveData",
        FindingCategory::Macros => "macros",
        FindingCategory::HiddenContent
        | FindingCategory::HiddenSheets
        | FindingCategory::HiddenColumns
        | FindingCategory::ExcelHiddenData => "hidden",
        FindingCategory::Comments => "comments",
        FindingCategory::TrackChanges => "trackChanges",
        FindingCategory::Metadata => "metadata",
        FindingCategory::EmbeddedObjects => "embeddedObjects",
        FindingCategory::SpellingErrors => "spelling",
        FindingCategory::BrokenLinks => "brokenLinks",
        FindingCategory::ComplianceRisks => "compliance",
        FindingCategory::OrphanData => "orphanData",
        FindingCategory::SensitiveFormulas => "sensitiveFormulas",
        FindingCategory::VisualObjects => "visualObjects",
    }
}

fn severity_weight(severity: Severity) -> u32 {
    SEVERITY_WEIGHTS
        .iter()
        .find(|(s, _)| *s == severity)
        .map(|(_, w)| *w)
        .unwrap_or(0)
}

/// Score a finding set.
pub fn score(findings: &[Finding]) -> Summary {
    let mut critical = 0usize;
    let mut high = 0usize;
    let mut medium = 0usize;
    let mut low = 0usize;
    let mut breakdown: BTreeMap<String, u32> = BTreeMap::new();
    let mut category_counts: BTreeMap<&'static str, u32> = BTreeMap::new();

    for finding in findings {
        match finding.severity {
            Severity::Critical => critical += 1,
            Severity::High => high += 1,
            Severity::Medium => medium += 1,
            Severity::Low => low += 1,
        }
        let key = breakdown_key(finding.category);
        *breakdown.entry(key.to_string()).or_default() += severity_weight(finding.severity);
        *category_counts.entry(key).or_default() += 1;
    }

    for (key, per, cap) in CATEGORY_CAPS {
        if let Some(&n) = category_counts.get(key) {
            *breakdown.entry(key.to_string()).or_default() += (per * n).min(cap);
        }
    }

    let total = findings.len();
    if total > VOLUME_THRESHOLD {
        breakdown.insert(
            "volume".to_string(),
            (total - VOLUME_THRESHOLD) as u32 * VOLUME_UNIT,
        );
    }

    let penalty: u32 = breakdown.values().sum();
    let risk_score = 100u32.saturating_sub(penalty).min(100);
    Summary {
        critical,
        high,
        medium,
        low,
        total_issues: total,
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
        risk_breakdown: breakdown,
    }
}

/// After-cleaning score: the cleaned document's findings are rescored,
/// bounded below by the pre-cleaning score so that removing findings can
/// never lower the score.
pub fn score_after(before: &Summary, remaining: &[Finding]) -> Summary {
    let mut after = score(remaining);
    if after.risk_score < before.risk_score {
        after.risk_score = before.risk_score;
        after.risk_level = RiskLevel::from_score(after.risk_score);
    }
    after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::FindingCategory;

    fn finding(category: FindingCategory, severity: Severity, location: &str) -> Finding {
        Finding::new(category, "t", severity, location)
    }

    #[test]
    fn test_empty_is_perfect() {
        let summary = score(&[]);
        assert_eq!(summary.risk_score, 100);
        assert_eq!(summary.risk_level, RiskLevel::Safe);
        assert_eq!(summary.total_issues, 0);
    }

    #[test]
    fn test_macro_gate_scenario() {
        // One critical macro finding: 25 severity + 15 category = 60
        let findings = vec![finding(FindingCategory::Macros, Severity::Critical, "xl/vbaProject.bin")];
        let summary = score(&findings);
        assert!(summary.risk_score <= 70);
        assert_eq!(summary.risk_score, 60);
        assert_eq!(summary.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_severity_counts_sum() {
        let findings = vec![
            finding(FindingCategory::Metadata, Severity::High, "a"),
            finding(FindingCategory::Comments, Severity::Low, "b"),
            finding(FindingCategory::SensitiveData, Severity::Critical, "c"),
        ];
        let summary = score(&findings);
        assert_eq!(
            summary.critical + summary.high + summary.medium + summary.low,
            summary.total_issues
        );
    }

    #[test]
    fn test_category_caps_bound_penalties() {
        // 30 spelling findings: severity 30*2=60 would swamp the score,
        // but the spelling cap holds the category penalty at 10.
        let findings: Vec<Finding> = (0..30)
            .map(|i| {
                finding(
                    FindingCategory::SpellingErrors,
                    Severity::Low,
                    &format!("text position {}", i),
                )
            })
            .collect();
        let summary = score(&findings);
        let spelling = summary.risk_breakdown.get("spelling").copied().unwrap_or(0);
        assert_eq!(spelling, 30 * 2 + 10);
        assert!(summary.risk_breakdown.contains_key("volume"));
        assert_eq!(summary.risk_breakdown["volume"], 40);
    }

    #[test]
    fn test_author_leak_scenario() {
        let findings = vec![
            finding(FindingCategory::Metadata, Severity::High, "docProps/core.xml"),
            finding(FindingCategory::Comments, Severity::Low, "word/comments.xml#1"),
        ];
        let before = score(&findings);
        // metadata 10+2, comments 2+3
        assert_eq!(before.risk_score, 100 - 17);
        let after = score_after(&before, &[]);
        assert!(after.risk_score - before.risk_score >= 5);
        assert_eq!(after.risk_score, 100);
    }

    #[test]
    fn test_score_monotone_under_removal() {
        let findings = vec![
            finding(FindingCategory::Macros, Severity::Critical, "a"),
            finding(FindingCategory::Metadata, Severity::High, "b"),
        ];
        let before = score(&findings);
        let remaining = vec![findings[1].clone()];
        let after = score_after(&before, &remaining);
        assert!(after.risk_score >= before.risk_score);
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(95), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(90), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(89), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(24), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Critical);
    }
}
