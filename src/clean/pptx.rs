//! PPTX cleaner.

use super::{remove_blocks, remove_parts, CleanStats};
use crate::config::{CleanOptions, DrawPolicy};
use crate::container::Document;
use crate::detectors::embedded::macro_parts;
use crate::error::{Error, Result};

pub(crate) fn clean(doc: &mut Document, options: &CleanOptions) -> Result<CleanStats> {
    let mut stats = CleanStats::default();
    let container = doc
        .ooxml_mut()
        .ok_or_else(|| Error::Internal("pptx cleaner on non-OOXML document".to_string()))?;

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
        for part in container.list_parts("ppt/comments/comment*.xml") {
            if let Ok(xml) = container.read_part_str(&part) {
                stats.comments_removed += xml.matches("<p:cm ").count().max(1);
            }
        }
        remove_parts(
            container,
            &[
                "ppt/comments/*",
                "ppt/modernComments/*",
                "ppt/commentAuthors.xml",
            ],
        );
    }

    if options.remove_embedded_objects {
        stats.embedded_removed += remove_parts(container, &["ppt/embeddings/*"]);
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
            for part in container.list_parts("ppt/slides/slide*.xml") {
                let Ok(xml) = container.read_part_str(&part) else {
                    continue;
                };
                let (xml, a) = remove_blocks(&xml, "a14:ink");
                let (xml, b) = remove_blocks(&xml, "p14:ink");
                if a + b > 0 {
                    stats.drawings_removed += a + b;
                    container.write_part(&part, xml.into_bytes());
                }
            }
        },
        DrawPolicy::All => {
            for part in container.list_parts("ppt/slides/slide*.xml") {
                let Ok(xml) = container.read_part_str(&part) else {
                    continue;
                };
                let (xml, a) = remove_blocks(&xml, "a14:ink");
                let (xml, b) = remove_blocks(&xml, "p14:ink");
                let (xml, pics) = remove_blocks(&xml, "p:pic");
                if a + b + pics > 0 {
                    stats.drawings_removed += a + b + pics;
                    container.write_part(&part, xml.into_bytes());
                }
            }
            stats.drawings_removed += remove_parts(container, &["ppt/media/*"]);
        },
    }

    Ok(stats)
}
