//! Sensitive-pattern library.
//!
//! A fixed, closed set of pattern rules for PII, financial tokens, and
//! confidential markers. Patterns are compiled once and shared across
//! requests; every match carries a masked rendering so raw secrets never
//! travel further than this module's callers need.

use crate::findings::Severity;
use lazy_static::lazy_static;
use regex::Regex;

/// One rule of the pattern library.
pub struct PatternRule {
    /// Rule kind, e.g. `email`, `iban`.
    pub kind: &'static str,
    /// Compiled matcher.
    pub regex: &'static Regex,
    /// Optional structural validator applied to each match.
    pub validator: Option<fn(&str) -> bool>,
    /// Severity of findings produced from this rule.
    pub severity: Severity,
    /// Whether matches are GDPR-relevant personal data.
    pub gdpr_relevant: bool,
}

/// A validated match with its masked rendering and context window.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    /// Rule kind.
    pub kind: &'static str,
    /// Severity from the rule table.
    pub severity: Severity,
    /// GDPR relevance from the rule table.
    pub gdpr_relevant: bool,
    /// The raw matched text. Callers must not surface this for critical
    /// kinds; use `masked`.
    pub value: String,
    /// Masked rendering per the masking rules.
    pub masked: String,
    /// Match offset in the scanned text.
    pub start: usize,
    /// End offset.
    pub end: usize,
    /// 50 chars of context either side, with the match itself masked.
    pub context: String,
}

const CONTEXT_WINDOW: usize = 50;

lazy_static! {
    static ref RE_EMAIL: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    static ref RE_PHONE: Regex =
        Regex::new(r"\+?\d[\d .\-()/]{6,18}\d").unwrap();
    static ref RE_IBAN: Regex =
        Regex::new(r"\b[A-Z]{2}\d{2}[A-Z0-9]{4}\d{7,18}\b").unwrap();
    static ref RE_CREDIT_CARD: Regex =
        Regex::new(r"\b\d(?:[ -]?\d){12,18}\b").unwrap();
    static ref RE_SSN_FR: Regex =
        Regex::new(r"\b[12]\d{12}\b").unwrap();
    static ref RE_IP: Regex =
        Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap();
    static ref RE_PROJECT_CODE: Regex =
        Regex::new(r"\b[A-Z]{2,6}-\d{2,6}\b").unwrap();
    static ref RE_FILE_PATH: Regex = Regex::new(
        r#"(?:[A-Za-z]:\\[^\s"<>|]+|\\\\[A-Za-z0-9._$-]+\\[^\s"<>|]+|/(?:home|Users|var|etc|opt|srv)/[^\s"<>|]+)"#
    )
    .unwrap();
    static ref RE_INTERNAL_URL: Regex = Regex::new(
        r"(?i)https?://(?:[a-z0-9.-]*\b(?:intranet|internal|dev|staging|local)\b[a-z0-9.-]*|localhost|10\.\d{1,3}\.\d{1,3}\.\d{1,3}|172\.(?:1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3}|192\.168\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/[^\s]*)?"
    )
    .unwrap();
    static ref RE_PRICE: Regex = Regex::new(
        r"(?:[$€£]\s?\d{1,3}(?:[ ,.]\d{3})+(?:[.,]\d{1,2})?|[$€£]\s?\d{4,}(?:[.,]\d{1,2})?|\b\d{1,3}(?:[ ,.]\d{3})+(?:[.,]\d{1,2})?\s?(?:EUR|USD|GBP|CHF)\b|\b\d{4,}(?:[.,]\d{1,2})?\s?(?:EUR|USD|GBP|CHF)\b|\b(?:EUR|USD|GBP|CHF)\s?\d{4,}\b)"
    )
    .unwrap();
    static ref RE_CONFIDENTIAL: Regex = Regex::new(
        r"(?i)\b(?:strictly\s+confidential|streng\s+vertraulich|diffusion\s+restreinte|internal\s+use\s+only|do\s+not\s+(?:distribute|share|forward)|confidential|vertraulich|confidentiel(?:le)?|riservato|confidencial|ne\s+pas\s+diffuser)\b"
    )
    .unwrap();
    // Financial rules come first so their spans are claimed before the
    // looser phone rule can swallow a digit run.
    static ref RULES: Vec<PatternRule> = vec![
        PatternRule {
            kind: "iban",
            regex: &RE_IBAN,
            validator: None,
            severity: Severity::Critical,
            gdpr_relevant: false,
        },
        PatternRule {
            kind: "credit_card",
            regex: &RE_CREDIT_CARD,
            validator: Some(validate_luhn),
            severity: Severity::Critical,
            gdpr_relevant: true,
        },
        PatternRule {
            kind: "ssn",
            regex: &RE_SSN_FR,
            validator: Some(validate_ssn_fr),
            severity: Severity::Critical,
            gdpr_relevant: true,
        },
        PatternRule {
            kind: "email",
            regex: &RE_EMAIL,
            validator: None,
            severity: Severity::Medium,
            gdpr_relevant: true,
        },
        PatternRule {
            kind: "phone",
            regex: &RE_PHONE,
            validator: Some(validate_phone),
            severity: Severity::Medium,
            gdpr_relevant: true,
        },
        PatternRule {
            kind: "ip_address",
            regex: &RE_IP,
            validator: Some(validate_ip),
            severity: Severity::Medium,
            gdpr_relevant: false,
        },
        PatternRule {
            kind: "project_code",
            regex: &RE_PROJECT_CODE,
            validator: None,
            severity: Severity::Medium,
            gdpr_relevant: false,
        },
        PatternRule {
            kind: "file_path",
            regex: &RE_FILE_PATH,
            validator: None,
            severity: Severity::High,
            gdpr_relevant: false,
        },
        PatternRule {
            kind: "internal_url",
            regex: &RE_INTERNAL_URL,
            validator: None,
            severity: Severity::High,
            gdpr_relevant: false,
        },
        PatternRule {
            kind: "price",
            regex: &RE_PRICE,
            validator: None,
            severity: Severity::Medium,
            gdpr_relevant: false,
        },
        PatternRule {
            kind: "confidential_keyword",
            regex: &RE_CONFIDENTIAL,
            validator: None,
            severity: Severity::High,
            gdpr_relevant: false,
        },
    ];
}

/// The shared, precompiled rule table.
pub fn rules() -> &'static [PatternRule] {
    &RULES
}

/// Scan text with every rule. Matches claimed by an earlier rule are not
/// re-reported by later ones (an IBAN is not also a project code), keyed
/// on identical spans.
pub fn scan(text: &str) -> Vec<PatternMatch> {
    let mut matches: Vec<PatternMatch> = Vec::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    for rule in rules() {
        for m in rule.regex.find_iter(text) {
            let value = m.as_str();
            if let Some(validate) = rule.validator {
                if !validate(value) {
                    continue;
                }
            }
            if claimed
                .iter()
                .any(|&(s, e)| m.start() >= s && m.end() <= e)
            {
                continue;
            }
            claimed.push((m.start(), m.end()));
            let masked = mask(rule.kind, value);
            matches.push(PatternMatch {
                kind: rule.kind,
                severity: rule.severity,
                gdpr_relevant: rule.gdpr_relevant,
                value: value.to_string(),
                masked: masked.clone(),
                start: m.start(),
                end: m.end(),
                context: masked_context(text, m.start(), m.end(), &masked),
            });
        }
    }
    matches.sort_by_key(|m| (m.start, m.end));
    matches
}

fn masked_context(text: &str, start: usize, end: usize, masked: &str) -> String {
    let before_start = text[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_WINDOW)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let after_end = text[end..]
        .char_indices()
        .take(CONTEXT_WINDOW + 1)
        .last()
        .map(|(i, _)| end + i)
        .unwrap_or(end);
    format!("{}{}{}", &text[before_start..start], masked, &text[end..after_end.min(text.len())])
}

/// Render a value per the masking rules of its kind.
pub fn mask(kind: &str, value: &str) -> String {
    match kind {
        "email" => {
            let (local, domain) = value.split_once('@').unwrap_or((value, ""));
            let kept: String = local.chars().take(2).collect();
            format!("{}***@{}", kept, domain)
        },
        "phone" => {
            let digits_total = value.chars().filter(|c| c.is_ascii_digit()).count();
            let mut seen = 0usize;
            value
                .chars()
                .map(|c| {
                    if c.is_ascii_digit() {
                        seen += 1;
                        if seen + 2 > digits_total {
                            c
                        } else {
                            '*'
                        }
                    } else {
                        c
                    }
                })
                .collect()
        },
        "iban" => {
            let compact: String = value.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            if compact.len() >= 8 {
                format!("{} **** **** {}", &compact[..4], &compact[compact.len() - 4..])
            } else {
                format!("{}***", &compact[..compact.len().min(3)])
            }
        },
        "credit_card" => {
            let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() >= 4 {
                format!("**** **** **** {}", &digits[digits.len() - 4..])
            } else {
                "****".to_string()
            }
        },
        _ => {
            let kept: String = value.chars().take(3).collect();
            format!("{}***", kept)
        },
    }
}

fn validate_phone(value: &str) -> bool {
    let digits: Vec<u8> = value
        .bytes()
        .filter(|b| b.is_ascii_digit())
        .map(|b| b - b'0')
        .collect();
    if !(8..=15).contains(&digits.len()) {
        return false;
    }
    // Year spans like "2019-2024" or "2023 / 2024" are not phone numbers
    if digits.len() == 8 {
        let first: u32 = digits[..4].iter().fold(0, |acc, &d| acc * 10 + d as u32);
        let second: u32 = digits[4..].iter().fold(0, |acc, &d| acc * 10 + d as u32);
        if (1900..2100).contains(&first) && (1900..2100).contains(&second) {
            return false;
        }
    }
    true
}

fn validate_luhn(value: &str) -> bool {
    let digits: Vec<u32> = value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn validate_ssn_fr(value: &str) -> bool {
    // 13 digits: sex, year, month, department, commune, order
    if value.len() != 13 {
        return false;
    }
    let month: u32 = value[3..5].parse().unwrap_or(0);
    (1..=12).contains(&month)
}

fn validate_ip(value: &str) -> bool {
    if value.starts_with("0.") || value.starts_with("127.") {
        return false;
    }
    value
        .split('.')
        .all(|octet| octet.parse::<u32>().map(|n| n <= 255).unwrap_or(false))
}
