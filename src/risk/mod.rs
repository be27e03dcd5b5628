//! Business risk engine.
//!
//! Five fixed categories evaluated by deterministic rules over detector
//! output and the text projection. Rules are data: each carries its
//! pattern set and a combine mode; no LLM is consulted. Compliance acts
//! as a gate — one critical flag makes the document not client-ready.

pub mod scorer;

use crate::extract::TextProjection;
use crate::findings::{Finding, FindingCategory, Severity};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Business risk categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessCategory {
    /// Pricing and margin exposure.
    Margin,
    /// Delivery over-commitment.
    Delivery,
    /// Negotiation position leakage.
    Negotiation,
    /// Regulatory / confidentiality exposure.
    Compliance,
    /// Professional credibility.
    Credibility,
}

impl BusinessCategory {
    /// All categories in report order.
    pub fn all() -> &'static [BusinessCategory] {
        &[
            BusinessCategory::Margin,
            BusinessCategory::Delivery,
            BusinessCategory::Negotiation,
            BusinessCategory::Compliance,
            BusinessCategory::Credibility,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            BusinessCategory::Margin => "margin",
            BusinessCategory::Delivery => "delivery",
            BusinessCategory::Negotiation => "negotiation",
            BusinessCategory::Compliance => "compliance",
            BusinessCategory::Credibility => "credibility",
        }
    }
}

/// Ordinal flag level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusinessLevel {
    /// No signal.
    None,
    /// Minor signal.
    Low,
    /// Worth a review.
    Medium,
    /// Blocks client readiness.
    High,
    /// Gate: never client-ready.
    Critical,
}

impl BusinessLevel {
    /// Numeric value for the weighted score.
    pub fn numeric(&self) -> u32 {
        match self {
            BusinessLevel::None => 100,
            BusinessLevel::Low => 85,
            BusinessLevel::Medium => 60,
            BusinessLevel::High => 25,
            BusinessLevel::Critical => 0,
        }
    }
}

/// One deterministic-rule classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessFlag {
    /// Stable flag id.
    pub id: String,
    /// Category.
    pub category: BusinessCategory,
    /// Level.
    pub level: BusinessLevel,
    /// Rule that fired.
    pub rule_id: String,
    /// Human-readable reason.
    pub reason: String,
    /// Where the signal came from.
    pub location: String,
    /// Supporting evidence (counts, sample phrases).
    pub evidence: String,
}

/// The business risk verdict for a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRisk {
    /// All flags, ordered by level descending.
    pub flags: Vec<BusinessFlag>,
    /// Highest level per category.
    pub category_levels: BTreeMap<String, BusinessLevel>,
    /// `round(0.25·(margin + delivery + negotiation + credibility))`.
    pub business_risk_score: u32,
    /// The client-ready gate decision.
    pub client_ready: bool,
}

/// How a rule's pattern hits combine into a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    /// Total hit count matters.
    CountHits,
    /// Any hit matters.
    Presence,
    /// Hits are weighed against dependency-marker hits.
    DependencyAware,
}

/// A text rule: patterns plus combine mode.
struct TextRule {
    category: BusinessCategory,
    rule_id: &'static str,
    patterns: &'static [&'static str],
    combine: Combine,
}

static TEXT_RULES: [TextRule; 11] = [
    TextRule {
        category: BusinessCategory::Margin,
        rule_id: "margin.pricing_terms",
        patterns: &[r"\b(rate|cost|margin|markup|discount|pricing)\b"],
        combine: Combine::CountHits,
    },
    TextRule {
        category: BusinessCategory::Delivery,
        rule_id: "delivery.engagement",
        patterns: &[r"\bwe (will|commit|guarantee|ensure)\b", r"\bdeliver by\b", r"\bcommitment\b"],
        combine: Combine::DependencyAware,
    },
    TextRule {
        category: BusinessCategory::Delivery,
        rule_id: "delivery.open_ended",
        patterns: &[
            r"\bas needed\b",
            r"\bunlimited\b",
            r"\bongoing\b",
            r"\bcontinuous\b",
            r"\bsupport until\b",
            r"\bfull ownership\b",
            r"\bend-to-end\b",
        ],
        combine: Combine::DependencyAware,
    },
    TextRule {
        category: BusinessCategory::Delivery,
        rule_id: "delivery.fixed_price",
        patterns: &[r"\bfixed price\b", r"\bflat fee\b", r"\ball-inclusive\b", r"\bturnkey\b"],
        combine: Combine::DependencyAware,
    },
    TextRule {
        category: BusinessCategory::Delivery,
        rule_id: "delivery.deadline",
        patterns: &[
            r"\bby (monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            r"\bby (end of|eo)[a-z]* (week|month|quarter|year)\b",
            r"\bby q[1-4]\b",
        ],
        combine: Combine::DependencyAware,
    },
    TextRule {
        category: BusinessCategory::Delivery,
        rule_id: "delivery.dependency",
        patterns: &[
            r"\bsubject to\b",
            r"\bassuming\b",
            r"\bdependent on\b",
            r"\bclient to provide\b",
            r"\bprerequisite\b",
        ],
        combine: Combine::DependencyAware,
    },
    TextRule {
        category: BusinessCategory::Negotiation,
        rule_id: "negotiation.assumptions",
        patterns: &[
            r"\bwe assume\b",
            r"\bour assumption\b",
            r"\binternally\b",
            r"\bto be confirmed\b",
            r"\btbc\b",
            r"\btbd\b",
        ],
        combine: Combine::CountHits,
    },
    TextRule {
        category: BusinessCategory::Negotiation,
        rule_id: "negotiation.options",
        patterns: &[r"\boption [abc]\b"],
        combine: Combine::CountHits,
    },
    TextRule {
        category: BusinessCategory::Negotiation,
        rule_id: "negotiation.client_dependency",
        patterns: &[r"\bpending client\b", r"\bawaiting client\b", r"\bclient to provide\b"],
        combine: Combine::CountHits,
    },
    TextRule {
        category: BusinessCategory::Negotiation,
        rule_id: "negotiation.benchmarks",
        patterns: &[
            r"\bbenchmark\b",
            r"\btarget rate\b",
            r"\bwalk-away\b",
            r"\breservation price\b",
            r"\bmargin target\b",
        ],
        combine: Combine::CountHits,
    },
    TextRule {
        category: BusinessCategory::Compliance,
        rule_id: "compliance.markers",
        patterns: &[
            r"\b(confidential|vertraulich|confidentiel|riservato|confidencial)\b",
            r"\b(?-i:[A-Z]{2,6}-\d{2,6})\b",
            r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}",
        ],
        combine: Combine::Presence,
    },
];

lazy_static! {
    static ref COMPILED: Vec<(usize, Regex)> = {
        let mut compiled = Vec::new();
        for (i, rule) in TEXT_RULES.iter().enumerate() {
            for pattern in rule.patterns {
                compiled.push((i, Regex::new(&format!("(?i){}", pattern)).unwrap()));
            }
        }
        compiled
    };
}

fn flag_id(rule_id: &str, reason: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule_id.as_bytes());
    hasher.update(b"|");
    hasher.update(reason.as_bytes());
    let digest = hasher.finalize();
    digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Count pattern hits per rule id.
fn rule_hits(text: &str) -> BTreeMap<&'static str, usize> {
    let mut hits: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (rule_index, regex) in COMPILED.iter() {
        let rule = &TEXT_RULES[*rule_index];
        let count = regex.find_iter(text).count();
        *hits.entry(rule.rule_id).or_default() += count;
    }
    hits
}

/// Evaluate the business risk of a document.
pub fn evaluate(findings: &[Finding], projection: &TextProjection) -> BusinessRisk {
    let text = projection.normalized();
    let hits = rule_hits(&text);
    let mut flags: Vec<BusinessFlag> = Vec::new();

    let count = |category: FindingCategory| -> usize {
        findings.iter().filter(|f| f.category == category).count()
    };
    let hidden_structural = count(FindingCategory::HiddenContent)
        + count(FindingCategory::HiddenSheets)
        + count(FindingCategory::HiddenColumns)
        + count(FindingCategory::ExcelHiddenData);

    // margin: structural Excel signals and pricing language
    if count(FindingCategory::HiddenSheets) > 0 {
        push_flag(
            &mut flags,
            BusinessCategory::Margin,
            BusinessLevel::High,
            "margin.hidden_sheets",
            "Hidden sheets may carry internal pricing",
            "workbook",
            format!("{} hidden sheets", count(FindingCategory::HiddenSheets)),
        );
    } else if count(FindingCategory::SensitiveFormulas) > 0
        || count(FindingCategory::ExcelHiddenData) > 0
    {
        push_flag(
            &mut flags,
            BusinessCategory::Margin,
            BusinessLevel::Medium,
            "margin.structural",
            "Formulas or defined names reference internal sources",
            "workbook",
            format!(
                "{} sensitive formulas, {} hidden-data names",
                count(FindingCategory::SensitiveFormulas),
                count(FindingCategory::ExcelHiddenData)
            ),
        );
    }
    let pricing_hits = hits.get("margin.pricing_terms").copied().unwrap_or(0);
    if pricing_hits >= 6 {
        push_flag(
            &mut flags,
            BusinessCategory::Margin,
            BusinessLevel::Medium,
            "margin.pricing_terms",
            "Dense pricing vocabulary",
            "document text",
            format!("{} pricing keyword hits", pricing_hits),
        );
    }

    // delivery: dependency-aware combination
    let engagement = hits.get("delivery.engagement").copied().unwrap_or(0);
    let open_ended = hits.get("delivery.open_ended").copied().unwrap_or(0);
    let fixed_price = hits.get("delivery.fixed_price").copied().unwrap_or(0);
    let deadline = hits.get("delivery.deadline").copied().unwrap_or(0);
    let dependency = hits.get("delivery.dependency").copied().unwrap_or(0);
    let committing = engagement + fixed_price + deadline;
    let combined = committing + open_ended;
    if combined + dependency > 0 {
        let level = if dependency == 0 && committing > 0 {
            BusinessLevel::High
        } else if combined >= 4 {
            BusinessLevel::Medium
        } else {
            BusinessLevel::Low
        };
        push_flag(
            &mut flags,
            BusinessCategory::Delivery,
            level,
            "delivery.commitments",
            "Engagement language versus stated dependencies",
            "document text",
            format!(
                "{} engagement, {} open-ended, {} fixed-price, {} deadline, {} dependency markers",
                engagement, open_ended, fixed_price, deadline, dependency
            ),
        );
    }

    // negotiation: internal positioning leakage, elevated by hygiene signals
    let negotiation_hits = hits.get("negotiation.assumptions").copied().unwrap_or(0)
        + hits.get("negotiation.options").copied().unwrap_or(0)
        + hits.get("negotiation.client_dependency").copied().unwrap_or(0)
        + hits.get("negotiation.benchmarks").copied().unwrap_or(0);
    if negotiation_hits > 0 {
        let mut level = match negotiation_hits {
            1..=2 => BusinessLevel::Low,
            3..=5 => BusinessLevel::Medium,
            _ => BusinessLevel::High,
        };
        if count(FindingCategory::Metadata) > 0 && hidden_structural > 0 {
            level = elevate(level);
        }
        push_flag(
            &mut flags,
            BusinessCategory::Negotiation,
            level,
            "negotiation.position",
            "Internal negotiation position is visible",
            "document text",
            format!("{} positioning hits", negotiation_hits),
        );
    }

    // compliance: gate on critical findings, otherwise marker density
    let critical_sensitive = findings.iter().any(|f| {
        (f.category == FindingCategory::SensitiveData
            || f.category == FindingCategory::ComplianceRisks)
            && f.severity >= Severity::Critical
    });
    if critical_sensitive {
        push_flag(
            &mut flags,
            BusinessCategory::Compliance,
            BusinessLevel::Critical,
            "compliance.critical_data",
            "Critical sensitive data present",
            "document text",
            "critical sensitive-data findings".to_string(),
        );
    } else {
        let marker_hits = hits.get("compliance.markers").copied().unwrap_or(0);
        if marker_hits >= 3 {
            push_flag(
                &mut flags,
                BusinessCategory::Compliance,
                BusinessLevel::High,
                "compliance.markers",
                "Multiple confidentiality markers and identifiers",
                "document text",
                format!("{} marker hits", marker_hits),
            );
        } else if marker_hits > 0 {
            push_flag(
                &mut flags,
                BusinessCategory::Compliance,
                BusinessLevel::Medium,
                "compliance.markers",
                "Confidentiality markers present",
                "document text",
                format!("{} marker hits", marker_hits),
            );
        }
    }

    // credibility: hygiene finding volume
    let credibility_count = count(FindingCategory::Comments)
        + count(FindingCategory::TrackChanges)
        + count(FindingCategory::SpellingErrors)
        + count(FindingCategory::OrphanData)
        + hidden_structural;
    if credibility_count > 0 {
        let level = match credibility_count {
            1..=3 => BusinessLevel::Low,
            4..=9 => BusinessLevel::Medium,
            _ => BusinessLevel::High,
        };
        push_flag(
            &mut flags,
            BusinessCategory::Credibility,
            level,
            "credibility.hygiene",
            "Editing residue visible to the recipient",
            "document",
            format!("{} hygiene findings", credibility_count),
        );
    }

    finish(flags)
}

fn elevate(level: BusinessLevel) -> BusinessLevel {
    match level {
        BusinessLevel::None => BusinessLevel::Low,
        BusinessLevel::Low => BusinessLevel::Medium,
        BusinessLevel::Medium => BusinessLevel::High,
        other => other,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_flag(
    flags: &mut Vec<BusinessFlag>,
    category: BusinessCategory,
    level: BusinessLevel,
    rule_id: &str,
    reason: &str,
    location: &str,
    evidence: String,
) {
    flags.push(BusinessFlag {
        id: flag_id(rule_id, reason),
        category,
        level,
        rule_id: rule_id.to_string(),
        reason: reason.to_string(),
        location: location.to_string(),
        evidence,
    });
}

fn finish(mut flags: Vec<BusinessFlag>) -> BusinessRisk {
    flags.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.rule_id.cmp(&b.rule_id)));

    let mut category_levels: BTreeMap<String, BusinessLevel> = BTreeMap::new();
    for category in BusinessCategory::all() {
        let level = flags
            .iter()
            .filter(|f| f.category == *category)
            .map(|f| f.level)
            .max()
            .unwrap_or(BusinessLevel::None);
        category_levels.insert(category.as_str().to_string(), level);
    }

    let weighted: u32 = [
        BusinessCategory::Margin,
        BusinessCategory::Delivery,
        BusinessCategory::Negotiation,
        BusinessCategory::Credibility,
    ]
    .iter()
    .map(|c| category_levels[c.as_str()].numeric())
    .sum();
    let business_risk_score = ((weighted as f64) * 0.25).round() as u32;

    let any_critical = flags.iter().any(|f| f.level == BusinessLevel::Critical);
    let any_high = category_levels.values().any(|l| *l == BusinessLevel::High);
    let client_ready = !any_critical && !any_high;

    BusinessRisk {
        flags,
        category_levels,
        business_risk_score,
        client_ready,
    }
}
