//! PDF object model.
//!
//! A compact representation of PDF's eight basic object types plus streams
//! and indirect references. Stream data is carried verbatim; this crate
//! never rewrites content streams, only dictionary-level structure.

use indexmap::IndexMap;

/// Reference to an indirect object: object number and generation.
pub type ObjectId = (u32, u16);

/// A PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    /// null
    Null,
    /// true / false
    Boolean(bool),
    /// Integer number
    Integer(i64),
    /// Real number
    Real(f64),
    /// String bytes (escape sequences already decoded)
    String(Vec<u8>),
    /// Name without the leading slash
    Name(String),
    /// Array of objects
    Array(Vec<PdfObject>),
    /// Dictionary with insertion order preserved
    Dictionary(IndexMap<String, PdfObject>),
    /// Stream: dictionary plus raw (still encoded) data
    Stream {
        /// Stream dictionary
        dict: IndexMap<String, PdfObject>,
        /// Raw stream data, exactly as read
        data: Vec<u8>,
    },
    /// Indirect reference `N G R`
    Reference(ObjectId),
}

impl PdfObject {
    /// Empty dictionary.
    pub fn dict() -> Self {
        PdfObject::Dictionary(IndexMap::new())
    }

    /// View as a dictionary (streams expose their dictionary too).
    pub fn as_dict(&self) -> Option<&IndexMap<String, PdfObject>> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            PdfObject::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Mutable dictionary view.
    pub fn as_dict_mut(&mut self) -> Option<&mut IndexMap<String, PdfObject>> {
        match self {
            PdfObject::Dictionary(d) => Some(d),
            PdfObject::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// View as an array.
    pub fn as_array(&self) -> Option<&[PdfObject]> {
        match self {
            PdfObject::Array(a) => Some(a),
            _ => None,
        }
    }

    /// View as a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfObject::Name(n) => Some(n),
            _ => None,
        }
    }

    /// View as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// View as a reference id.
    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            PdfObject::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Decode string bytes to text: UTF-16BE when BOM-prefixed, otherwise
    /// byte-per-char (PDFDocEncoding approximated as Latin-1).
    pub fn as_text(&self) -> Option<String> {
        match self {
            PdfObject::String(bytes) => Some(decode_pdf_text(bytes)),
            _ => None,
        }
    }
}

/// Decode PDF text-string bytes.
pub fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Serialize an object into `out` in PDF syntax.
pub fn write_object(obj: &PdfObject, out: &mut Vec<u8>) {
    match obj {
        PdfObject::Null => out.extend_from_slice(b"null"),
        PdfObject::Boolean(true) => out.extend_from_slice(b"true"),
        PdfObject::Boolean(false) => out.extend_from_slice(b"false"),
        PdfObject::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        PdfObject::Real(r) => {
            if r.fract() == 0.0 && r.abs() < 1e15 {
                out.extend_from_slice(format!("{:.1}", r).as_bytes());
            } else {
                out.extend_from_slice(r.to_string().as_bytes());
            }
        },
        PdfObject::String(bytes) => write_literal_string(bytes, out),
        PdfObject::Name(name) => write_name(name, out),
        PdfObject::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(item, out);
            }
            out.push(b']');
        },
        PdfObject::Dictionary(dict) => write_dict(dict, out),
        PdfObject::Stream { dict, data } => {
            write_dict(dict, out);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        },
        PdfObject::Reference((num, gen)) => {
            out.extend_from_slice(format!("{} {} R", num, gen).as_bytes());
        },
    }
}

fn write_dict(dict: &IndexMap<String, PdfObject>, out: &mut Vec<u8>) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict {
        out.push(b' ');
        write_name(key, out);
        out.push(b' ');
        write_object(value, out);
    }
    out.extend_from_slice(b" >>");
}

fn write_name(name: &str, out: &mut Vec<u8>) {
    out.push(b'/');
    for &b in name.as_bytes() {
        // Delimiters and whitespace must be #-escaped inside names
        let special = matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        ) || b <= b' '
            || b > b'~';
        if special {
            out.extend_from_slice(format!("#{:02X}", b).as_bytes());
        } else {
            out.push(b);
        }
    }
}

fn write_literal_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
        }
    }
    out.push(b')');
}

/// Encode text as a PDF string object, using UTF-16BE when needed.
pub fn encode_pdf_text(text: &str) -> PdfObject {
    if text.is_ascii() {
        PdfObject::String(text.as_bytes().to_vec())
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        PdfObject::String(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(obj: &PdfObject) -> String {
        let mut out = Vec::new();
        write_object(obj, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn test_write_primitives() {
        assert_eq!(serialize(&PdfObject::Null), "null");
        assert_eq!(serialize(&PdfObject::Integer(-42)), "-42");
        assert_eq!(serialize(&PdfObject::Real(1.5)), "1.5");
        assert_eq!(serialize(&PdfObject::Name("Type".to_string())), "/Type");
        assert_eq!(serialize(&PdfObject::Reference((10, 0))), "10 0 R");
    }

    #[test]
    fn test_write_string_escapes() {
        let s = PdfObject::String(b"a(b)c\\".to_vec());
        assert_eq!(serialize(&s), "(a\\(b\\)c\\\\)");
    }

    #[test]
    fn test_write_dict() {
        let mut dict = IndexMap::new();
        dict.insert("Type".to_string(), PdfObject::Name("Catalog".to_string()));
        dict.insert("Pages".to_string(), PdfObject::Reference((2, 0)));
        assert_eq!(
            serialize(&PdfObject::Dictionary(dict)),
            "<< /Type /Catalog /Pages 2 0 R >>"
        );
    }

    #[test]
    fn test_decode_utf16_text() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Héllo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_pdf_text(&bytes), "Héllo");
    }

    #[test]
    fn test_decode_latin1_text() {
        assert_eq!(decode_pdf_text(b"Alice"), "Alice");
    }

    #[test]
    fn test_encode_roundtrip() {
        let obj = encode_pdf_text("Résumé");
        assert_eq!(obj.as_text().unwrap(), "Résumé");
    }
}
