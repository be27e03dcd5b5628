//! Sensitive-data redaction.
//!
//! Replaces approved literal values with `[REDACTED]` inside run-level
//! text nodes across all text-bearing parts. The replacement is confined
//! to text node bodies; tags and attributes are never touched. Values
//! that styling fragments across several runs are out of reach of this
//! pass — the anchored applier handles targeted multi-run edits.

use crate::apply::{enumerate_segments, text_parts};
use crate::container::Document;
use quick_xml::escape::escape;

const REPLACEMENT: &str = "[REDACTED]";
const MAX_EXAMPLES: usize = 5;
const EXAMPLE_CHARS: usize = 120;

/// Replace every occurrence of each value. Returns the replacement count
/// and up to five post-redaction snippets (safe to surface: the raw value
/// is gone from them).
pub fn redact(doc: &mut Document, values: &[String]) -> (usize, Vec<String>) {
    let mut total = 0usize;
    let mut examples = Vec::new();
    let parts = text_parts(doc);
    for (path, tag) in parts {
        let Some(container) = doc.ooxml() else { break };
        let Ok(xml) = container.read_part_str(&path) else {
            continue;
        };
        let segments = enumerate_segments(&xml, &tag);
        let mut rewritten = xml.clone();
        let mut changed = false;
        // Rewrite back-to-front so earlier offsets stay valid
        for segment in segments.iter().rev() {
            if segment.self_closing || segment.text.is_empty() {
                continue;
            }
            let mut new_text = segment.text.clone();
            let mut hits = 0usize;
            for value in values {
                if value.is_empty() {
                    continue;
                }
                hits += new_text.matches(value.as_str()).count();
                new_text = new_text.replace(value.as_str(), REPLACEMENT);
            }
            if hits == 0 {
                continue;
            }
            total += hits;
            changed = true;
            if examples.len() < MAX_EXAMPLES {
                examples.push(truncate(&new_text));
            }
            let escaped = escape(&new_text).into_owned();
            rewritten.replace_range(segment.inner_start..segment.inner_end, &escaped);
        }
        if changed {
            if let Some(container) = doc.ooxml_mut() {
                container.write_part(&path, rewritten.into_bytes());
            }
        }
    }
    (total, examples)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= EXAMPLE_CHARS {
        text.to_string()
    } else {
        text.chars().take(EXAMPLE_CHARS).collect()
    }
}
