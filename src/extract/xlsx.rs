//! XLSX text extraction.
//!
//! Only `xl/sharedStrings.xml` feeds the projection; cell formulas are
//! analyzed separately by the formula detector. Each `<si>` entry ends
//! with a newline, rich-text runs inside an entry concatenate.

use super::{ProjectionBuilder, TextProjection};
use crate::container::Document;
use quick_xml::events::Event;
use quick_xml::Reader;

pub(crate) fn extract(doc: &Document) -> TextProjection {
    let mut builder = ProjectionBuilder::new();
    let Some(container) = doc.ooxml() else {
        return builder.finish();
    };
    let part = "xl/sharedStrings.xml";
    let Ok(xml) = container.read_part_str(part) else {
        return builder.finish();
    };

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut segment_index = 0usize;
    let mut in_text = false;
    let mut pending = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"t" {
                    in_text = true;
                    pending.clear();
                }
            },
            Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"t" {
                    segment_index += 1;
                }
            },
            Ok(Event::Text(ref t)) => {
                if in_text {
                    if let Ok(text) = t.unescape() {
                        pending.push_str(&text);
                    }
                }
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"t" => {
                    builder.push_segment(part, segment_index, &pending);
                    segment_index += 1;
                    in_text = false;
                },
                b"si" => builder.push_separator('\n'),
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
    builder.finish()
}
