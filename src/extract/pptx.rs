//! PPTX text extraction.
//!
//! Walks `ppt/slides/slide*.xml` sorted by numeric suffix, then
//! `ppt/notesSlides/notesSlide*.xml`. Each `<a:p>` ends with a newline,
//! `<a:br/>` maps to a newline, `<a:t>` nodes supply content.

use super::{sort_by_numeric_suffix, ProjectionBuilder, TextProjection};
use crate::container::Document;
use quick_xml::events::Event;
use quick_xml::Reader;

pub(crate) fn extract(doc: &Document) -> TextProjection {
    let mut builder = ProjectionBuilder::new();
    let Some(container) = doc.ooxml() else {
        return builder.finish();
    };
    let mut slides = container.list_parts("ppt/slides/slide*.xml");
    sort_by_numeric_suffix(&mut slides);
    let mut notes = container.list_parts("ppt/notesSlides/notesSlide*.xml");
    sort_by_numeric_suffix(&mut notes);
    slides.extend(notes);
    for part in slides {
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
    let mut pending = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"a:t" {
                    in_text = true;
                    pending.clear();
                }
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"a:br" => builder.push_separator('\n'),
                b"a:t" => segment_index += 1,
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
                b"a:t" => {
                    builder.push_segment(part, segment_index, &pending);
                    segment_index += 1;
                    in_text = false;
                },
                b"a:p" => builder.push_separator('\n'),
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
