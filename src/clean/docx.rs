//! DOCX cleaner.

use super::{remove_blocks, remove_parts, unwrap_blocks};
use crate::config::{CleanOptions, DrawPolicy};
use crate::container::Document;
use crate::detectors::embedded::macro_parts;
use crate::error::{Error, Result};
use super::CleanStats;

/// Parts carrying body text that inline cleaning must also touch.
fn body_parts(container: &crate::container::OoxmlContainer) -> Vec<String> {
    let mut parts = vec!["word/document.xml".to_string()];
    parts.extend(container.list_parts("word/header*.xml"));
    parts.extend(container.list_parts("word/footer*.xml"));
    parts.retain(|p| container.has_part(p));
    parts
}

pub(crate) fn clean(doc: &mut Document, options: &CleanOptions) -> Result<CleanStats> {
    let mut stats = CleanStats::default();
    let container = doc
        .ooxml_mut()
        .ok_or_else(|| Error::Internal("docx cleaner on non-OOXML document".to_string()))?;

    if options.remove_metadata {
        stats.metadata_removed += remove_parts(
            container,
            &[
                "docProps/core.xml",
                "docProps/app.xml",
                "docProps/custom.xml",
                "customXml/*",
            ],
        );
    }

    if options.remove_comments {
        // Count comment elements before dropping the parts
        for part in container.list_parts("word/comments*.xml") {
            if let Ok(xml) = container.read_part_str(&part) {
                stats.comments_removed += xml.matches("<w:comment ").count();
            }
        }
        remove_parts(container, &["word/comments*.xml"]);
        for part in body_parts(container) {
            let Ok(xml) = container.read_part_str(&part) else {
                continue;
            };
            let (xml, a) = remove_blocks(&xml, "w:commentRangeStart");
            let (xml, b) = remove_blocks(&xml, "w:commentRangeEnd");
            let (xml, c) = remove_blocks(&xml, "w:commentReference");
            if a + b + c > 0 {
                container.write_part(&part, xml.into_bytes());
            }
        }
    }

    if options.accept_track_changes {
        for part in body_parts(container) {
            let Ok(xml) = container.read_part_str(&part) else {
                continue;
            };
            let (xml, deletions) = remove_blocks(&xml, "w:del");
            let (xml, insertions) = unwrap_blocks(&xml, "w:ins");
            if deletions + insertions > 0 {
                stats.track_changes_accepted += deletions + insertions;
                container.write_part(&part, xml.into_bytes());
            }
        }
    }

    if options.remove_hidden_content {
        for part in body_parts(container) {
            let Ok(xml) = container.read_part_str(&part) else {
                continue;
            };
            let (xml, removed) = remove_hidden_runs(&xml);
            if removed > 0 {
                stats.hidden_removed += removed;
                container.write_part(&part, xml.into_bytes());
            }
        }
    }

    if options.remove_embedded_objects {
        stats.embedded_removed += remove_parts(container, &["word/embeddings/*"]);
    }

    if options.remove_macros {
        for part in macro_parts(container) {
            if container.remove_part(&part) {
                stats.macros_removed += 1;
            }
        }
    }

    match options.draw_policy {
        DrawPolicy::None => {},
        DrawPolicy::Auto => {
            for part in body_parts(container) {
                let Ok(xml) = container.read_part_str(&part) else {
                    continue;
                };
                let (xml, ink) = remove_blocks(&xml, "a14:ink");
                let (xml, pict) = remove_blocks(&xml, "w:pict");
                if ink + pict > 0 {
                    stats.drawings_removed += ink + pict;
                    container.write_part(&part, xml.into_bytes());
                }
            }
        },
        DrawPolicy::All => {
            for part in body_parts(container) {
                let Ok(xml) = container.read_part_str(&part) else {
                    continue;
                };
                let (xml, ink) = remove_blocks(&xml, "a14:ink");
                let (xml, pict) = remove_blocks(&xml, "w:pict");
                let (xml, drawings) = remove_blocks(&xml, "w:drawing");
                if ink + pict + drawings > 0 {
                    stats.drawings_removed += ink + pict + drawings;
                    container.write_part(&part, xml.into_bytes());
                }
            }
            stats.drawings_removed += remove_parts(container, &["word/media/*"]);
        },
    }

    Ok(stats)
}

/// Remove `<w:r>` runs whose properties mark them hidden. Runs do not
/// nest, so a plain scan is sound.
fn remove_hidden_runs(xml: &str) -> (String, usize) {
    let mut out = String::with_capacity(xml.len());
    let mut pos = 0usize;
    let mut removed = 0usize;
    while let Some(found) = xml[pos..].find("<w:r") {
        let start = pos + found;
        let after = &xml[start + 4..];
        // Exclude <w:rPr>, <w:rFonts> and friends
        let boundary = after.chars().next();
        if !matches!(boundary, Some('>') | Some(' ')) {
            out.push_str(&xml[pos..start + 4]);
            pos = start + 4;
            continue;
        }
        let Some(end_rel) = xml[start..].find("</w:r>") else {
            break;
        };
        let end = start + end_rel + "</w:r>".len();
        let run = &xml[start..end];
        out.push_str(&xml[pos..start]);
        if run.contains("<w:vanish/>") || run.contains("<w:vanish ") {
            removed += 1;
        } else {
            out.push_str(run);
        }
        pos = end;
    }
    out.push_str(&xml[pos..]);
    (out, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DocumentFormat;

    fn clean_doc(body: &str, extra: &[(&str, &str)], options: &CleanOptions) -> (Document, CleanStats) {
        let bytes = crate::test_support::build_docx_with(body, extra);
        let mut doc = Document::open(&bytes, DocumentFormat::Docx, "t.docx").unwrap();
        let stats = super::super::clean(&mut doc, options, &[]).unwrap();
        (doc, stats)
    }

    #[test]
    fn test_metadata_parts_removed() {
        let (doc, stats) = clean_doc(
            "<w:p/>",
            &[(
                "docProps/core.xml",
                "<cp:coreProperties xmlns:cp=\"c\" xmlns:dc=\"d\"><dc:creator>Alice</dc:creator></cp:coreProperties>",
            )],
            &CleanOptions {
                remove_metadata: true,
                ..Default::default()
            },
        );
        assert_eq!(stats.metadata_removed, 1);
        assert!(!doc.ooxml().unwrap().has_part("docProps/core.xml"));
    }

    #[test]
    fn test_comments_removed_with_markers() {
        let body = "<w:p><w:r><w:commentRangeStart w:id=\"1\"/><w:t>text</w:t>\
            <w:commentRangeEnd w:id=\"1\"/><w:commentReference w:id=\"1\"/></w:r></w:p>";
        let comments = "<w:comments xmlns:w=\"w\"><w:comment w:id=\"1\" w:author=\"A\"><w:p><w:r><w:t>note</w:t></w:r></w:p></w:comment></w:comments>";
        let (doc, stats) = clean_doc(
            body,
            &[("word/comments.xml", comments)],
            &CleanOptions {
                remove_comments: true,
                ..Default::default()
            },
        );
        assert_eq!(stats.comments_removed, 1);
        let container = doc.ooxml().unwrap();
        assert!(!container.has_part("word/comments.xml"));
        let xml = container.read_part_str("word/document.xml").unwrap();
        assert!(!xml.contains("commentRangeStart"));
        assert!(!xml.contains("commentReference"));
        assert!(xml.contains("<w:t>text</w:t>"));
    }

    #[test]
    fn test_track_changes_accepted() {
        let body = "<w:p>\
            <w:del w:id=\"1\" w:author=\"A\"><w:r><w:delText>old</w:delText></w:r></w:del>\
            <w:ins w:id=\"2\" w:author=\"A\"><w:r><w:t>new</w:t></w:r></w:ins>\
            </w:p>";
        let (doc, stats) = clean_doc(
            body,
            &[],
            &CleanOptions {
                accept_track_changes: true,
                ..Default::default()
            },
        );
        assert_eq!(stats.track_changes_accepted, 2);
        let xml = doc
            .ooxml()
            .unwrap()
            .read_part_str("word/document.xml")
            .unwrap();
        assert!(!xml.contains("<w:del"));
        assert!(!xml.contains("<w:ins"));
        assert!(!xml.contains("old"));
        assert!(xml.contains("<w:t>new</w:t>"));
    }

    #[test]
    fn test_hidden_runs_removed() {
        let body = "<w:p><w:r><w:rPr><w:vanish/></w:rPr><w:t>secret</w:t></w:r>\
            <w:r><w:t>visible</w:t></w:r></w:p>";
        let (doc, stats) = clean_doc(
            body,
            &[],
            &CleanOptions {
                remove_hidden_content: true,
                ..Default::default()
            },
        );
        assert_eq!(stats.hidden_removed, 1);
        let xml = doc
            .ooxml()
            .unwrap()
            .read_part_str("word/document.xml")
            .unwrap();
        assert!(!xml.contains("secret"));
        assert!(xml.contains("visible"));
    }

    #[test]
    fn test_draw_policy_auto_keeps_drawings() {
        let body = "<w:p><w:r><w:pict><v:shape id=\"s1\"/></w:pict>\
            <w:drawing><wp:inline/></w:drawing><w:t>x</w:t></w:r></w:p>";
        let (doc, stats) = clean_doc(
            body,
            &[],
            &CleanOptions::none().with_draw_policy(DrawPolicy::Auto),
        );
        assert_eq!(stats.drawings_removed, 1);
        let xml = doc
            .ooxml()
            .unwrap()
            .read_part_str("word/document.xml")
            .unwrap();
        assert!(!xml.contains("<w:pict>"));
        assert!(xml.contains("<w:drawing>"));
    }

    #[test]
    fn test_draw_policy_all_purges_media() {
        let body = "<w:p><w:r><w:drawing><wp:inline/></w:drawing><w:t>x</w:t></w:r></w:p>";
        let (doc, _stats) = clean_doc(
            body,
            &[("word/media/image1.png", "PNGDATA")],
            &CleanOptions::none().with_draw_policy(DrawPolicy::All),
        );
        let container = doc.ooxml().unwrap();
        assert!(!container.has_part("word/media/image1.png"));
        let xml = container.read_part_str("word/document.xml").unwrap();
        assert!(!xml.contains("<w:drawing>"));
    }
}
