//! XLSX cleaner.
//!
//! Metadata is cleaned at the element level (the property parts stay,
//! identity-bearing entries go). Hidden-sheet removal rewrites
//! `xl/workbook.xml`, drops the workbook relationship, and deletes the
//! worksheet part itself. Shared strings referenced only by a removed
//! sheet are left in place; sanitization is by part, not by reference.

use super::{remove_parts, resolve_part_path, CleanStats};
use crate::config::CleanOptions;
use crate::container::{Document, OoxmlContainer};
use crate::detectors::embedded::macro_parts;
use crate::detectors::hidden::workbook_sheets;
use crate::error::{Error, Result};
use crate::findings::{finding_id, FindingCategory};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_FORMULA: Regex = Regex::new(r"(?s)<f\b[^>]*>.*?</f>|<f\b[^>]*/>").unwrap();
}

/// core.xml entries cleared on metadata removal.
const CORE_TAGS: [&str; 6] = [
    "dc:creator",
    "dc:title",
    "dc:subject",
    "cp:keywords",
    "cp:lastModifiedBy",
    "cp:revision",
];

/// app.xml entries cleared on metadata removal.
const APP_TAGS: [&str; 3] = ["Company", "Manager", "Application"];

pub(crate) fn clean(doc: &mut Document, options: &CleanOptions) -> Result<CleanStats> {
    let mut stats = CleanStats::default();
    let hidden_selection = options.hidden_to_clean.clone();
    let container = doc
        .ooxml_mut()
        .ok_or_else(|| Error::Internal("xlsx cleaner on non-OOXML document".to_string()))?;

    if options.remove_metadata {
        stats.metadata_removed += clear_elements(container, "docProps/core.xml", &CORE_TAGS);
        stats.metadata_removed += clear_elements(container, "docProps/app.xml", &APP_TAGS);
        stats.metadata_removed += remove_parts(container, &["docProps/custom.xml", "customXml/*"]);
    }

    if options.remove_comments {
        for part in container.list_parts("xl/comments*.xml") {
            if let Ok(xml) = container.read_part_str(&part) {
                stats.comments_removed += xml.matches("<comment ").count();
            }
        }
        remove_parts(container, &["xl/comments*.xml"]);
    }

    if options.remove_hidden_content {
        stats.hidden_removed += remove_hidden_sheets(container, &hidden_selection);
    }

    if options.remove_embedded_objects {
        stats.embedded_removed += remove_parts(container, &["xl/embeddings/*"]);
    }

    if options.remove_macros {
        for part in macro_parts(container) {
            if container.remove_part(&part) {
                stats.macros_removed += 1;
            }
        }
    }

    if options.flatten_formulas {
        for part in container.list_parts("xl/worksheets/sheet*.xml") {
            let Ok(xml) = container.read_part_str(&part) else {
                continue;
            };
            let count = RE_FORMULA.find_iter(&xml).count();
            if count > 0 {
                let flattened = RE_FORMULA.replace_all(&xml, "").into_owned();
                container.write_part(&part, flattened.into_bytes());
                stats.formulas_flattened += count;
            }
        }
    }

    Ok(stats)
}

/// Empty the listed elements of a properties part. Returns how many held
/// a value.
fn clear_elements(container: &mut OoxmlContainer, part: &str, tags: &[&str]) -> usize {
    let Ok(xml) = container.read_part_str(part) else {
        return 0;
    };
    let mut cleaned = xml.clone();
    let mut cleared = 0usize;
    for tag in tags {
        let pattern = format!(
            r"(?s)<{tag}(\b[^>]*)?>.+?</{tag}>",
            tag = regex::escape(tag)
        );
        let re = Regex::new(&pattern).expect("static tag pattern");
        let next = re.replace_all(&cleaned, "").into_owned();
        if next != cleaned {
            cleared += 1;
            cleaned = next;
        }
    }
    if cleared > 0 {
        container.write_part(part, cleaned.into_bytes());
    }
    cleared
}

/// Remove hidden and very-hidden sheets. When `selection` is non-empty,
/// only sheets whose finding id is selected are removed.
fn remove_hidden_sheets(container: &mut OoxmlContainer, selection: &[String]) -> usize {
    let Ok(workbook) = container.read_part_str("xl/workbook.xml") else {
        return 0;
    };
    let mut removed = 0usize;
    let mut workbook_xml = workbook.clone();
    let rels_path = "xl/_rels/workbook.xml.rels";
    let mut rels_xml = container.read_part_str(rels_path).unwrap_or_default();

    for sheet in workbook_sheets(&workbook) {
        let state = sheet.state.as_deref();
        if !matches!(state, Some("hidden") | Some("veryHidden")) {
            continue;
        }
        if !selection.is_empty() {
            let kind = if state == Some("veryHidden") {
                "very_hidden_sheet"
            } else {
                "hidden_sheet"
            };
            let id = finding_id(
                FindingCategory::HiddenSheets,
                kind,
                &format!("sheet '{}'", sheet.name),
                Some(&sheet.name),
            );
            if !selection.contains(&id) {
                continue;
            }
        }

        // Drop the <sheet> entry
        let entry_re = Regex::new(&format!(
            r#"<sheet\b[^>]*name="{}"[^>]*/>"#,
            regex::escape(&sheet.name)
        ))
        .expect("sheet entry pattern");
        workbook_xml = entry_re.replace(&workbook_xml, "").into_owned();

        // Drop the relationship and the worksheet part it points at
        if !sheet.rel_id.is_empty() {
            let rel_re = Regex::new(&format!(
                r#"<Relationship\b[^>]*Id="{}"[^>]*/>"#,
                regex::escape(&sheet.rel_id)
            ))
            .expect("relationship pattern");
            let entry = rel_re.find(&rels_xml).map(|m| m.as_str().to_string());
            if let Some(entry) = entry {
                if let Some(caps) = Regex::new(r#"Target="([^"]+)""#)
                    .expect("target pattern")
                    .captures(&entry)
                {
                    let target = resolve_part_path("xl", &caps[1]);
                    // A sheet whose part is already missing still gets its
                    // entry and relationship dropped
                    container.remove_part(&target);
                }
                rels_xml = rel_re.replace(&rels_xml, "").into_owned();
            }
        }
        removed += 1;
    }

    if removed > 0 {
        container.write_part("xl/workbook.xml", workbook_xml.into_bytes());
        container.write_part(rels_path, rels_xml.into_bytes());
    }
    removed
}
