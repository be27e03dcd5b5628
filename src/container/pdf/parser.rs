//! PDF object and document-skeleton parsing.
//!
//! The container scans the whole byte buffer for `N G obj … endobj` spans
//! instead of trusting the cross-reference table. Scanning parses damaged
//! files, classic-xref files, and xref-stream files identically, at the
//! cost of reading the full buffer once — acceptable for the document sizes
//! this crate handles. Members of compressed object streams are inflated
//! and promoted to regular objects so the rewriting saver can emit a
//! classic xref table.

use super::lexer::{
    is_regular, lex_hex_string, lex_keyword, lex_literal_string, lex_name, lex_number, skip_ws,
};
use super::object::{ObjectId, PdfObject};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::io::Read;

lazy_static! {
    static ref RE_INDIRECT_OBJ: Regex =
        Regex::new(r"(?-u)(\d{1,10})[\r\n\t \x00\x0c]+(\d{1,5})[\r\n\t \x00\x0c]+obj").unwrap();
    static ref RE_TRAILER: Regex = Regex::new(r"(?-u)trailer").unwrap();
}

/// Parse a single object at the head of `input` (whitespace already allowed).
/// Returns the remaining input and the object.
pub fn parse_object(input: &[u8]) -> Option<(&[u8], PdfObject)> {
    let input = skip_ws(input);

    // Dictionary
    if input.starts_with(b"<<") {
        return parse_dict_body(&input[2..]).map(|(rest, d)| (rest, PdfObject::Dictionary(d)));
    }
    // Array
    if input.first() == Some(&b'[') {
        let mut rest = &input[1..];
        let mut items = Vec::new();
        loop {
            rest = skip_ws(rest);
            if rest.first() == Some(&b']') {
                return Some((&rest[1..], PdfObject::Array(items)));
            }
            let (next, item) = parse_object(rest)?;
            items.push(item);
            rest = next;
        }
    }
    // Strings
    if let Ok((rest, bytes)) = lex_literal_string(input) {
        return Some((rest, PdfObject::String(bytes)));
    }
    if let Ok((rest, bytes)) = lex_hex_string(input) {
        return Some((rest, PdfObject::String(bytes)));
    }
    // Name
    if let Ok((rest, name)) = lex_name(input) {
        return Some((rest, PdfObject::Name(name)));
    }
    // Keywords
    if let Some(rest) = lex_keyword(input, "true") {
        return Some((rest, PdfObject::Boolean(true)));
    }
    if let Some(rest) = lex_keyword(input, "false") {
        return Some((rest, PdfObject::Boolean(false)));
    }
    if let Some(rest) = lex_keyword(input, "null") {
        return Some((rest, PdfObject::Null));
    }
    // Number, possibly the head of an `N G R` reference
    if let Ok((rest, (int_val, real_val))) = lex_number(input) {
        if let Some(real) = real_val {
            return Some((rest, PdfObject::Real(real)));
        }
        if int_val >= 0 {
            let after_first = skip_ws(rest);
            if let Ok((after_second, (gen, None))) = lex_number(after_first) {
                if (0..=65535).contains(&gen) {
                    let after_gen = skip_ws(after_second);
                    if after_gen.first() == Some(&b'R')
                        && after_gen.get(1).map_or(true, |&b| !is_regular(b))
                    {
                        return Some((
                            &after_gen[1..],
                            PdfObject::Reference((int_val as u32, gen as u16)),
                        ));
                    }
                }
            }
        }
        return Some((rest, PdfObject::Integer(int_val)));
    }
    None
}

fn parse_dict_body(mut input: &[u8]) -> Option<(&[u8], IndexMap<String, PdfObject>)> {
    let mut dict = IndexMap::new();
    loop {
        input = skip_ws(input);
        if input.starts_with(b">>") {
            return Some((&input[2..], dict));
        }
        let (rest, key) = lex_name(input).ok()?;
        let (rest, value) = parse_object(rest)?;
        dict.insert(key, value);
        input = rest;
    }
}

/// One scanned indirect object with its byte span.
pub struct ScannedObject {
    /// Object id
    pub id: ObjectId,
    /// Parsed content
    pub object: PdfObject,
    /// End offset of the span (just past `endobj`)
    pub end: usize,
}

/// Parse the indirect object whose `N G obj` header starts at `buf[start..]`.
pub fn parse_indirect_at(buf: &[u8], start: usize) -> Option<ScannedObject> {
    let input = &buf[start..];
    let Ok((rest, (num, None))) = lex_number(input) else {
        return None;
    };
    let rest = skip_ws(rest);
    let Ok((rest, (gen, None))) = lex_number(rest) else {
        return None;
    };
    let rest = skip_ws(rest);
    let rest = lex_keyword(rest, "obj")?;
    let (rest, mut object) = parse_object(rest)?;

    // A dictionary followed by `stream` is a stream object.
    let mut rest = skip_ws(rest);
    if matches!(object, PdfObject::Dictionary(_)) {
        if let Some(after_kw) = lex_keyword(rest, "stream") {
            let dict = match object {
                PdfObject::Dictionary(d) => d,
                _ => unreachable!(),
            };
            let data_start = match after_kw {
                [b'\r', b'\n', ..] => &after_kw[2..],
                [b'\n', ..] => &after_kw[1..],
                other => other,
            };
            let data = match dict.get("Length").and_then(|l| l.as_int()) {
                Some(len) if len >= 0 && (len as usize) <= data_start.len() => {
                    // Trust /Length only when endstream actually follows
                    let after = skip_ws(&data_start[len as usize..]);
                    if lex_keyword(after, "endstream").is_some() {
                        data_start[..len as usize].to_vec()
                    } else {
                        find_stream_end(data_start)?
                    }
                },
                _ => find_stream_end(data_start)?,
            };
            let after_data = skip_ws(&data_start[data.len()..]);
            rest = lex_keyword(after_data, "endstream")?;
            rest = skip_ws(rest);
            object = PdfObject::Stream { dict, data };
        }
    }
    let rest = lex_keyword(rest, "endobj")?;
    let end = buf.len() - rest.len();
    Some(ScannedObject {
        id: (num as u32, gen as u16),
        object,
        end,
    })
}

/// Locate stream data by searching for the `endstream` keyword, trimming a
/// single trailing EOL. Used when /Length is absent, indirect, or wrong.
fn find_stream_end(data: &[u8]) -> Option<Vec<u8>> {
    let needle = b"endstream";
    let pos = data
        .windows(needle.len())
        .position(|window| window == needle)?;
    let mut end = pos;
    if end > 0 && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && data[end - 1] == b'\r' {
        end -= 1;
    }
    Some(data[..end].to_vec())
}

/// Scan the full buffer for indirect objects. Later definitions of the same
/// id (incremental updates) win. Matches that fall inside a previously
/// parsed span (e.g. binary stream data) are skipped.
pub fn scan_objects(buf: &[u8]) -> IndexMap<ObjectId, PdfObject> {
    let mut objects: IndexMap<ObjectId, PdfObject> = IndexMap::new();
    let mut next_allowed = 0usize;
    for m in RE_INDIRECT_OBJ.find_iter(buf) {
        if m.start() < next_allowed {
            continue;
        }
        // A digit right before the match means the object number was
        // truncated ("19 0 obj" seen as "9 0 obj")
        if m.start() > 0 && buf[m.start() - 1].is_ascii_digit() {
            continue;
        }
        match parse_indirect_at(buf, m.start()) {
            Some(scanned) => {
                next_allowed = scanned.end;
                objects.insert(scanned.id, scanned.object);
            },
            None => {
                log::debug!("skipping unparseable object candidate at byte {}", m.start());
            },
        }
    }
    objects
}

/// Merge all `trailer` dictionaries found in the buffer; later ones take
/// precedence key-by-key (incremental update chains).
pub fn scan_trailer(buf: &[u8]) -> IndexMap<String, PdfObject> {
    let mut merged: IndexMap<String, PdfObject> = IndexMap::new();
    for m in RE_TRAILER.find_iter(buf) {
        let rest = &buf[m.end()..];
        if let Some((_, PdfObject::Dictionary(dict))) = parse_object(rest) {
            for (key, value) in dict {
                merged.insert(key, value);
            }
        }
    }
    merged
}

/// Inflate a compressed object stream and parse its members.
///
/// Returns the member objects (all generation 0). Streams with filters
/// other than FlateDecode, or with predictor parameters, are rejected.
pub fn extract_object_stream(
    dict: &IndexMap<String, PdfObject>,
    data: &[u8],
) -> Result<Vec<(ObjectId, PdfObject)>> {
    match dict.get("Filter").and_then(|f| f.as_name()) {
        Some("FlateDecode") => {},
        other => {
            return Err(Error::part_parse(
                "ObjStm",
                format!("unsupported filter {:?}", other),
            ))
        },
    }
    if dict.contains_key("DecodeParms") {
        return Err(Error::part_parse("ObjStm", "predictor parameters unsupported"));
    }
    let n = dict
        .get("N")
        .and_then(|v| v.as_int())
        .ok_or_else(|| Error::part_parse("ObjStm", "missing /N"))? as usize;
    let first = dict
        .get("First")
        .and_then(|v| v.as_int())
        .ok_or_else(|| Error::part_parse("ObjStm", "missing /First"))? as usize;

    let mut inflated = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut inflated)
        .map_err(|e| Error::part_parse("ObjStm", format!("inflate failed: {}", e)))?;
    if first > inflated.len() {
        return Err(Error::part_parse("ObjStm", "/First beyond stream"));
    }

    // Header: N pairs of (object number, offset relative to /First)
    let mut header = &inflated[..first];
    let mut pairs = Vec::with_capacity(n);
    for _ in 0..n {
        header = skip_ws(header);
        let Ok((rest, (num, None))) = lex_number(header) else {
            return Err(Error::part_parse("ObjStm", "bad header pair"));
        };
        let rest = skip_ws(rest);
        let Ok((rest, (offset, None))) = lex_number(rest) else {
            return Err(Error::part_parse("ObjStm", "bad header pair"));
        };
        pairs.push((num as u32, offset as usize));
        header = rest;
    }

    let body = &inflated[first..];
    let mut members = Vec::with_capacity(n);
    for (num, offset) in pairs {
        if offset > body.len() {
            return Err(Error::part_parse("ObjStm", "member offset beyond stream"));
        }
        match parse_object(&body[offset..]) {
            Some((_, object)) => members.push(((num, 0u16), object)),
            None => {
                return Err(Error::part_parse(
                    "ObjStm",
                    format!("member object {} unparseable", num),
                ))
            },
        }
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_vs_integers() {
        let (_, obj) = parse_object(b"10 0 R ").unwrap();
        assert_eq!(obj, PdfObject::Reference((10, 0)));
        let (rest, obj) = parse_object(b"10 20 30]").unwrap();
        assert_eq!(obj, PdfObject::Integer(10));
        assert_eq!(rest, b" 20 30]");
    }

    #[test]
    fn test_parse_nested_dict() {
        let input = b"<< /Type /Catalog /Pages 2 0 R /Extra << /A [1 2 3] >> >>";
        let (_, obj) = parse_object(input).unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Type").unwrap().as_name(), Some("Catalog"));
        assert_eq!(dict.get("Pages").unwrap().as_reference(), Some((2, 0)));
        let extra = dict.get("Extra").unwrap().as_dict().unwrap();
        assert_eq!(extra.get("A").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_parse_indirect_stream_by_length() {
        let buf = b"1 0 obj\n<< /Length 5 >>\nstream\nhello\nendstream\nendobj\n";
        let scanned = parse_indirect_at(buf, 0).unwrap();
        assert_eq!(scanned.id, (1, 0));
        match scanned.object {
            PdfObject::Stream { data, .. } => assert_eq!(data, b"hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_indirect_stream_bad_length_recovers() {
        let buf = b"1 0 obj\n<< /Length 9999 >>\nstream\nhello\nendstream\nendobj\n";
        let scanned = parse_indirect_at(buf, 0).unwrap();
        match scanned.object {
            PdfObject::Stream { data, .. } => assert_eq!(data, b"hello"),
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_objects_incremental_update_wins() {
        let buf =
            b"1 0 obj\n(first)\nendobj\n2 0 obj\n42\nendobj\n1 0 obj\n(second)\nendobj\n";
        let objects = scan_objects(buf);
        assert_eq!(objects.len(), 2);
        assert_eq!(
            objects.get(&(1, 0)),
            Some(&PdfObject::String(b"second".to_vec()))
        );
    }

    #[test]
    fn test_scan_trailer_merges() {
        let buf = b"trailer\n<< /Size 5 /Root 1 0 R >>\nstartxref\n0\ntrailer\n<< /Size 7 >>\n";
        let trailer = scan_trailer(buf);
        assert_eq!(trailer.get("Size").unwrap().as_int(), Some(7));
        assert_eq!(trailer.get("Root").unwrap().as_reference(), Some((1, 0)));
    }

    #[test]
    fn test_extract_object_stream() {
        use std::io::Write;
        // Two members: "11 0" -> (eleven), "12 6" -> 42
        let body = b"11 0 12 9 (eleven) 42";
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(body).unwrap();
        let data = encoder.finish().unwrap();

        let mut dict = IndexMap::new();
        dict.insert("Type".to_string(), PdfObject::Name("ObjStm".to_string()));
        dict.insert("Filter".to_string(), PdfObject::Name("FlateDecode".to_string()));
        dict.insert("N".to_string(), PdfObject::Integer(2));
        dict.insert("First".to_string(), PdfObject::Integer(10));

        let members = extract_object_stream(&dict, &data).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].0, (11, 0));
        assert_eq!(members[0].1, PdfObject::String(b"eleven".to_vec()));
        assert_eq!(members[1].1, PdfObject::Integer(42));
    }
}
