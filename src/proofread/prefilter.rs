//! Deterministic proofreading prefilter.
//!
//! Five rule families that catch the mechanical damage document editing
//! inflicts on text: spaces inside words, punctuation inside words,
//! camel-case stuck words, stuck connectors, and runaway space runs. The
//! allow-list is consulted before any merge so that two valid tokens are
//! never joined.

use super::words;
use crate::findings::{Severity, SpellingIssue};
use lazy_static::lazy_static;
use regex::Regex;

/// Cap for inside-word-space findings per document.
pub const MAX_INSIDE_WORD_FINDINGS: usize = 250;

const CONTEXT_CHARS: usize = 30;

lazy_static! {
    static ref RE_PUNCT_IN_WORD: Regex =
        Regex::new(r"([A-Za-z]{2,})[,.;:'\-]([A-Za-z]{2,})").unwrap();
    static ref RE_TOKEN: Regex = Regex::new(r"[A-Za-z]{2,}").unwrap();
}

/// A maximal run of spaces/tabs with the letter runs on both sides.
struct SpaceGap {
    start: usize,
    end: usize,
    left: (usize, usize),
    right: (usize, usize),
}

/// Enumerate every maximal horizontal-whitespace run together with the
/// full letter runs adjacent to it. Scanning runs directly avoids the
/// overlap blindness of non-overlapping regex iteration.
fn space_gaps(text: &str) -> Vec<SpaceGap> {
    let bytes = text.as_bytes();
    let mut gaps = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b' ' || bytes[i] == b'\t' {
            let start = i;
            while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
                i += 1;
            }
            let end = i;
            let mut left_start = start;
            while left_start > 0 && bytes[left_start - 1].is_ascii_alphabetic() {
                left_start -= 1;
            }
            let mut right_end = end;
            while right_end < bytes.len() && bytes[right_end].is_ascii_alphabetic() {
                right_end += 1;
            }
            if left_start < start && right_end > end {
                gaps.push(SpaceGap {
                    start,
                    end,
                    left: (left_start, start),
                    right: (end, right_end),
                });
            }
        } else {
            i += 1;
        }
    }
    gaps
}

/// Run all prefilter rules over the projection text.
pub fn prefilter(text: &str) -> Vec<SpellingIssue> {
    let mut issues = Vec::new();
    inside_word_space(text, &mut issues);
    punctuation_in_word(text, &mut issues);
    camel_case(text, &mut issues);
    stuck_connectors(text, &mut issues);
    multiple_spaces(text, &mut issues);
    issues
}

fn wordish_boundaries(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map(|c| !c.is_alphabetic())
        .unwrap_or(true);
    let after_ok = text[end..]
        .chars()
        .next()
        .map(|c| !c.is_alphabetic())
        .unwrap_or(true);
    before_ok && after_ok
}

fn context_before(text: &str, start: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_CHARS)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    text[from..start].to_string()
}

fn context_after(text: &str, end: usize) -> String {
    let upto = text[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[end..upto].to_string()
}

fn push_issue(
    issues: &mut Vec<SpellingIssue>,
    text: &str,
    start: usize,
    end: usize,
    correction: String,
    kind: &str,
    severity: Severity,
    message: &str,
) {
    let issue = SpellingIssue::new(
        &text[start..end],
        correction,
        kind,
        message,
        context_before(text, start),
        context_after(text, end),
    );
    let mut issue = issue.with_offsets(start, end);
    issue.severity = severity;
    issues.push(issue);
}

/// Rule (i): a 1-3 space gap splitting a word into short fragments.
fn inside_word_space(text: &str, issues: &mut Vec<SpellingIssue>) {
    let mut count = 0usize;
    for gap in space_gaps(text) {
        if count >= MAX_INSIDE_WORD_FINDINGS {
            break;
        }
        if gap.end - gap.start > 3 {
            continue;
        }
        let left = &text[gap.left.0..gap.left.1];
        let right = &text[gap.right.0..gap.right.1];
        if left.len() > 3 || right.len() > 3 {
            continue;
        }
        let joined = format!("{}{}", left, right);
        if !words::is_real_word(&joined) {
            continue;
        }
        // Never merge two valid tokens ("to do" is not "todo")
        if (words::is_real_word(left) || words::is_stopword(left))
            && (words::is_real_word(right) || words::is_stopword(right))
        {
            continue;
        }
        push_issue(
            issues,
            text,
            gap.left.0,
            gap.right.1,
            joined,
            "inside_word_space",
            Severity::Medium,
            "Space splits a word",
        );
        count += 1;
    }
}

/// Rule (ii): punctuation wedged inside a word.
fn punctuation_in_word(text: &str, issues: &mut Vec<SpellingIssue>) {
    for caps in RE_PUNCT_IN_WORD.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let left = caps.get(1).unwrap().as_str();
        let right = caps.get(2).unwrap().as_str();
        if !wordish_boundaries(text, whole.start(), whole.end()) {
            continue;
        }
        let joined = format!("{}{}", left, right);
        if !words::is_real_word(&joined) {
            continue;
        }
        if words::is_real_word(left) && words::is_real_word(right) {
            continue;
        }
        push_issue(
            issues,
            text,
            whole.start(),
            whole.end(),
            joined,
            "punct_in_word",
            Severity::Medium,
            "Punctuation splits a word",
        );
    }
}

/// Rule (iii): camel-case stuck words ("togetherWe").
fn camel_case(text: &str, issues: &mut Vec<SpellingIssue>) {
    for token in RE_TOKEN.find_iter(text) {
        let word = token.as_str();
        if words::camel_stoplisted(word) {
            continue;
        }
        if !wordish_boundaries(text, token.start(), token.end()) {
            continue;
        }
        let bytes = word.as_bytes();
        let split = (1..bytes.len().saturating_sub(1)).find(|&i| {
            bytes[i - 1].is_ascii_lowercase()
                && bytes[i].is_ascii_uppercase()
                && bytes[i + 1].is_ascii_lowercase()
        });
        let Some(split) = split else { continue };
        let left = &word[..split];
        let right = &word[split..];
        if left.len() < 2 || right.len() < 2 || !words::is_real_word(left) {
            continue;
        }
        push_issue(
            issues,
            text,
            token.start(),
            token.end(),
            format!("{} {}", left, right),
            "stuck_camel",
            Severity::Low,
            "Missing space between words",
        );
    }
}

/// Rule (iv): a connector stuck between two words inside one token.
fn stuck_connectors(text: &str, issues: &mut Vec<SpellingIssue>) {
    for token in RE_TOKEN.find_iter(text) {
        let word = token.as_str();
        if !(5..=30).contains(&word.len()) {
            continue;
        }
        if words::is_real_word(word) {
            continue;
        }
        if !wordish_boundaries(text, token.start(), token.end()) {
            continue;
        }
        let lower = word.to_ascii_lowercase();
        let mut found = None;
        'connectors: for conn in words::CONNECTORS {
            let mut search_from = 1usize;
            while let Some(rel) = lower[search_from..].find(conn) {
                let at = search_from + rel;
                let left = &word[..at];
                let right = &word[at + conn.len()..];
                let right_ok = right.len() >= 3
                    || (right.len() == 1 && right.chars().all(|c| c.is_ascii_uppercase()));
                if left.len() >= 3
                    && right_ok
                    && words::is_real_word(left)
                    && (right.len() == 1 || words::is_real_word(right))
                {
                    found = Some(format!("{} {} {}", left, conn, right));
                    break 'connectors;
                }
                search_from = at + 1;
            }
        }
        let Some(correction) = found else { continue };
        push_issue(
            issues,
            text,
            token.start(),
            token.end(),
            correction,
            "stuck_connector",
            Severity::Medium,
            "Words run together around a connector",
        );
    }
}

/// Rule (v): runs of two or more spaces between words.
fn multiple_spaces(text: &str, issues: &mut Vec<SpellingIssue>) {
    for gap in space_gaps(text) {
        let run = &text[gap.start..gap.end];
        if run.len() < 2 || run.contains('\t') {
            continue;
        }
        let left = &text[gap.left.0..gap.left.1];
        let right = &text[gap.right.0..gap.right.1];
        push_issue(
            issues,
            text,
            gap.left.0,
            gap.right.1,
            format!("{} {}", left, right),
            "multiple_spaces",
            Severity::Low,
            "Multiple consecutive spaces",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_word_space_merge() {
        let issues = prefilter("join the soc ial media team");
        let merge = issues
            .iter()
            .find(|i| i.kind == "inside_word_space")
            .expect("merge issue");
        assert_eq!(merge.error, "soc ial");
        assert_eq!(merge.correction, "social");
        assert_eq!(merge.start_index, Some(9));
    }

    #[test]
    fn test_two_valid_tokens_not_merged() {
        // "to" and "do" are both valid; "todo" is not suggested
        let issues = prefilter("things to do today");
        assert!(issues.iter().all(|i| i.kind != "inside_word_space"));
    }

    #[test]
    fn test_punctuation_inside_word() {
        let issues = prefilter("the bud-get for next year");
        let fix = issues
            .iter()
            .find(|i| i.kind == "punct_in_word")
            .expect("punct issue");
        assert_eq!(fix.error, "bud-get");
        assert_eq!(fix.correction, "budget");
    }

    #[test]
    fn test_hyphenated_compound_kept() {
        let issues = prefilter("a well-known risk");
        assert!(issues.iter().all(|i| i.kind != "punct_in_word"));
    }

    #[test]
    fn test_camel_case_split() {
        let issues = prefilter("see planWe discussed");
        let split = issues
            .iter()
            .find(|i| i.kind == "stuck_camel")
            .expect("camel issue");
        assert_eq!(split.error, "planWe");
        assert_eq!(split.correction, "plan We");
    }

    #[test]
    fn test_camel_stoplist_guard() {
        let issues = prefilter("therefore we proceed");
        assert!(issues.iter().all(|i| i.kind != "stuck_camel"));
    }

    #[test]
    fn test_stuck_connector() {
        let issues = prefilter("the planofaction is ready");
        let split = issues
            .iter()
            .find(|i| i.kind == "stuck_connector")
            .expect("connector issue");
        assert_eq!(split.error, "planofaction");
        assert_eq!(split.correction, "plan of action");
    }

    #[test]
    fn test_multiple_spaces() {
        let issues = prefilter("total  due soon");
        let space = issues
            .iter()
            .find(|i| i.kind == "multiple_spaces")
            .expect("space issue");
        assert_eq!(space.error, "total  due");
        assert_eq!(space.correction, "total due");
    }

    #[test]
    fn test_whitespace_preserved_in_error() {
        let issues = prefilter("join the soc ial media team");
        let merge = issues.iter().find(|i| i.kind == "inside_word_space").unwrap();
        assert!(merge.error.contains(' '));
        assert_eq!(merge.error.len(), 7);
    }
}
