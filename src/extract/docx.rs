//! DOCX text extraction.
//!
//! Walks `word/document.xml`, headers, footers, footnotes, and endnotes.
//! Each `<w:p>` ends a paragraph; `<w:tab/>` and `<w:br/>` map to their
//! characters; `<w:t>` nodes supply content. Unknown tags are elided with
//! no whitespace inserted. Tab stops declared inside property blocks
//! (`<w:pPr>`/`<w:rPr>`) are layout definitions, not content.

use super::{ProjectionBuilder, TextProjection};
use crate::container::Document;
use quick_xml::events::Event;
use quick_xml::Reader;

pub(crate) fn extract(doc: &Document) -> TextProjection {
    let mut builder = ProjectionBuilder::new();
    let Some(container) = doc.ooxml() else {
        return builder.finish();
    };
    let mut parts = Vec::new();
    if container.has_part("word/document.xml") {
        parts.push("word/document.xml".to_string());
    }
    parts.extend(container.list_parts("word/header*.xml"));
    parts.extend(container.list_parts("word/footer*.xml"));
    for extra in ["word/footnotes.xml", "word/endnotes.xml"] {
        if container.has_part(extra) {
            parts.push(extra.to_string());
        }
    }
    for part in parts {
        match container.read_part_str(&part) {
            Ok(xml) => walk_part(&part, &xml, &mut builder),
            Err(e) => log::warn!("skipping part in projection: {}", e),
        }
    }
    builder.finish()
}

fn walk_part(part: &str, xml: &str, builder: &mut ProjectionBuilder) {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut segment_index = 0usize;
    let mut in_text = false;
    let mut props_depth = 0usize;
    let mut pending = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:t" => {
                    in_text = true;
                    pending.clear();
                },
                b"w:pPr" | b"w:rPr" => props_depth += 1,
                _ => {},
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" if props_depth == 0 => builder.push_separator('\t'),
                b"w:br" | b"w:cr" if props_depth == 0 => builder.push_separator('\n'),
                // An empty run still occupies a segment slot
                b"w:t" => segment_index += 1,
                _ => {},
            },
            Ok(Event::Text(ref t)) => {
                if in_text {
                    if let Ok(text) = t.unescape() {
                        pending.push_str(&text);
                    }
                }
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => {
                    builder.push_segment(part, segment_index, &pending);
                    segment_index += 1;
                    in_text = false;
                },
                b"w:p" => builder.push_separator('\n'),
                b"w:pPr" | b"w:rPr" => props_depth = props_depth.saturating_sub(1),
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML error in '{}' projection: {}", part, e);
                break;
            },
            _ => {},
        }
        buf.clear();
    }
}
