//! Per-format selective removal.
//!
//! Each removal records counts for rescoring. Every per-part operation is
//! best-effort: a part that fails to parse is logged and skipped, never
//! fatal. After format-specific cleaning, `[Content_Types].xml` overrides
//! and relationship entries pointing at removed parts are scrubbed so the
//! archive stays valid for reference parsers.

mod docx;
mod pdf;
mod pptx;
pub mod redact;
mod xlsx;

use crate::config::CleanOptions;
use crate::container::{Document, DocumentFormat, OoxmlContainer};
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Removal counters for rescoring and the report.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanStats {
    /// Metadata parts or entries removed.
    pub metadata_removed: usize,
    /// Comments removed (elements, not parts).
    pub comments_removed: usize,
    /// Tracked changes accepted (deletions dropped, insertions kept).
    pub track_changes_accepted: usize,
    /// Hidden items removed (sheets, runs).
    pub hidden_removed: usize,
    /// Embedded objects removed.
    pub embedded_removed: usize,
    /// Macro blobs removed.
    pub macros_removed: usize,
    /// Drawings and pictures removed.
    pub drawings_removed: usize,
    /// Formulas replaced by their cached values.
    pub formulas_flattened: usize,
    /// Sensitive values redacted.
    pub redactions_applied: usize,
    /// Up to five post-redaction snippets (never contain the raw value).
    pub redaction_examples: Vec<String>,
    /// PDF pages whose annotations were cleared.
    pub annotations_cleared: usize,
    /// PDF attachments removed.
    pub attachments_removed: usize,
}

/// Clean a document in place per the options. `redact_values` carries the
/// raw strings of caller-approved sensitive findings.
pub fn clean(
    doc: &mut Document,
    options: &CleanOptions,
    redact_values: &[String],
) -> Result<CleanStats> {
    let mut stats = match doc.format {
        DocumentFormat::Docx => docx::clean(doc, options)?,
        DocumentFormat::Pptx => pptx::clean(doc, options)?,
        DocumentFormat::Xlsx => xlsx::clean(doc, options)?,
        DocumentFormat::Pdf => pdf::clean(doc, options)?,
    };
    if !redact_values.is_empty() && doc.format.is_ooxml() {
        let (count, examples) = redact::redact(doc, redact_values);
        stats.redactions_applied = count;
        stats.redaction_examples = examples;
    }
    if let Some(container) = doc.ooxml_mut() {
        scrub_content_types(container);
        scrub_dangling_relationships(container);
    }
    Ok(stats)
}

/// Remove all parts matching the given patterns. Returns how many went.
pub(crate) fn remove_parts(container: &mut OoxmlContainer, patterns: &[&str]) -> usize {
    let mut removed = 0usize;
    for pattern in patterns {
        for path in container.list_parts(pattern) {
            if container.remove_part(&path) {
                removed += 1;
            }
        }
    }
    removed
}

lazy_static! {
    static ref RE_OVERRIDE: Regex =
        Regex::new(r#"<Override[^>]*PartName="([^"]+)"[^>]*/>"#).unwrap();
    static ref RE_RELATIONSHIP: Regex = Regex::new(r#"<Relationship\b[^>]*/>"#).unwrap();
    static ref RE_REL_TARGET: Regex = Regex::new(r#"Target="([^"]+)""#).unwrap();
}

/// Drop `[Content_Types].xml` overrides that reference removed parts.
pub(crate) fn scrub_content_types(container: &mut OoxmlContainer) {
    let Ok(xml) = container.read_part_str("[Content_Types].xml") else {
        return;
    };
    let cleaned = RE_OVERRIDE.replace_all(&xml, |caps: &regex::Captures| {
        let part = caps[1].trim_start_matches('/').to_string();
        if container.has_part(&part) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    if cleaned != xml {
        container.write_part("[Content_Types].xml", cleaned.into_owned().into_bytes());
    }
}

/// Drop relationship entries whose internal targets no longer exist.
pub(crate) fn scrub_dangling_relationships(container: &mut OoxmlContainer) {
    for rels_path in container.list_parts("*_rels/*.rels") {
        let Ok(xml) = container.read_part_str(&rels_path) else {
            continue;
        };
        // `word/_rels/document.xml.rels` resolves targets relative to `word/`
        let base = rels_path
            .rsplit_once("_rels/")
            .map(|(prefix, _)| prefix.trim_end_matches('/'))
            .unwrap_or("");
        let cleaned = RE_RELATIONSHIP.replace_all(&xml, |caps: &regex::Captures| {
            let entry = &caps[0];
            if entry.contains("TargetMode=\"External\"") {
                return entry.to_string();
            }
            let Some(target) = RE_REL_TARGET
                .captures(entry)
                .map(|c| c[1].to_string())
            else {
                return entry.to_string();
            };
            let resolved = resolve_part_path(base, &target);
            if container.has_part(&resolved) {
                entry.to_string()
            } else {
                String::new()
            }
        });
        if cleaned != xml {
            container.write_part(&rels_path, cleaned.into_owned().into_bytes());
        }
    }
}

/// Resolve a relationship target against its source part's directory.
pub(crate) fn resolve_part_path(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = if base.is_empty() {
        Vec::new()
    } else {
        base.split('/').collect()
    };
    for piece in target.split('/') {
        match piece {
            "." | "" => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Remove whole element blocks (`<tag ...>...</tag>` and `<tag .../>`).
/// Returns the new XML and the number removed.
pub(crate) fn remove_blocks(xml: &str, tag: &str) -> (String, usize) {
    let pattern = format!(
        r"(?s)<{tag}\b[^>]*/>|<{tag}\b[^>]*>.*?</{tag}>",
        tag = regex::escape(tag)
    );
    let re = Regex::new(&pattern).expect("static tag pattern");
    let count = re.find_iter(xml).count();
    (re.replace_all(xml, "").into_owned(), count)
}

/// Remove only the open/close tags of `tag`, keeping the inner content.
pub(crate) fn unwrap_blocks(xml: &str, tag: &str) -> (String, usize) {
    let open = Regex::new(&format!(r"<{}\b[^>]*>", regex::escape(tag))).expect("tag pattern");
    let close = Regex::new(&format!(r"</{}>", regex::escape(tag))).expect("tag pattern");
    let count = open.find_iter(xml).count();
    let unwrapped = open.replace_all(xml, "");
    (close.replace_all(&unwrapped, "").into_owned(), count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_part_path() {
        assert_eq!(resolve_part_path("word", "comments.xml"), "word/comments.xml");
        assert_eq!(resolve_part_path("word", "../docProps/core.xml"), "docProps/core.xml");
        assert_eq!(resolve_part_path("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_part_path("xl", "/xl/styles.xml"), "xl/styles.xml");
        assert_eq!(
            resolve_part_path("xl", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
    }

    #[test]
    fn test_remove_blocks() {
        let (out, n) = remove_blocks(
            "<a><w:del id=\"1\"><w:r/></w:del>keep<w:del/></a>",
            "w:del",
        );
        assert_eq!(out, "<a>keep</a>");
        assert_eq!(n, 2);
    }

    #[test]
    fn test_unwrap_blocks() {
        let (out, n) = unwrap_blocks(
            "<a><w:ins w:id=\"2\"><w:r><w:t>kept</w:t></w:r></w:ins></a>",
            "w:ins",
        );
        assert_eq!(out, "<a><w:r><w:t>kept</w:t></w:r></a>");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_scrub_content_types_drops_dangling() {
        let ct = "<Types xmlns=\"ct\">\
            <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
            <Override PartName=\"/word/document.xml\" ContentType=\"a\"/>\
            <Override PartName=\"/word/comments.xml\" ContentType=\"b\"/>\
            </Types>";
        let bytes = crate::test_support::build_docx("<w:p/>");
        let mut container = OoxmlContainer::open(&bytes).unwrap();
        container.write_part("[Content_Types].xml", ct.as_bytes().to_vec());
        scrub_content_types(&mut container);
        let cleaned = container.read_part_str("[Content_Types].xml").unwrap();
        assert!(cleaned.contains("/word/document.xml"));
        assert!(!cleaned.contains("/word/comments.xml"));
    }

    #[test]
    fn test_scrub_relationships_keeps_external() {
        let rels = "<Relationships xmlns=\"r\">\
            <Relationship Id=\"rId1\" Type=\"t\" Target=\"comments.xml\"/>\
            <Relationship Id=\"rId2\" Type=\"t\" Target=\"https://acme.com\" TargetMode=\"External\"/>\
            </Relationships>";
        let bytes = crate::test_support::build_docx("<w:p/>");
        let mut container = OoxmlContainer::open(&bytes).unwrap();
        container.write_part("word/_rels/document.xml.rels", rels.as_bytes().to_vec());
        scrub_dangling_relationships(&mut container);
        let cleaned = container
            .read_part_str("word/_rels/document.xml.rels")
            .unwrap();
        assert!(!cleaned.contains("comments.xml"));
        assert!(cleaned.contains("https://acme.com"));
    }
}
