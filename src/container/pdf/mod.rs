//! PDF container.
//!
//! Models the pieces of a PDF this crate inspects and rewrites: the info
//! dictionary, per-page annotation arrays, and the embedded-files name
//! tree. Every other object passes through `save` unchanged. Content
//! streams are never decoded or redacted.

pub mod lexer;
pub mod object;
pub mod parser;

use crate::error::{Error, Result};
use indexmap::IndexMap;
pub use object::{decode_pdf_text, encode_pdf_text, ObjectId, PdfObject};

/// An open PDF: the scanned object table plus the merged trailer.
#[derive(Debug, Clone)]
pub struct PdfContainer {
    version: String,
    objects: IndexMap<ObjectId, PdfObject>,
    trailer: IndexMap<String, PdfObject>,
}

const MAX_RESOLVE_DEPTH: u32 = 32;

impl PdfContainer {
    /// Open PDF bytes.
    ///
    /// Rejects non-PDF input and encrypted files. Compressed object
    /// streams are inflated so their members become regular objects; the
    /// stream carriers and cross-reference streams are dropped (a fresh
    /// classic xref is written on save).
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let header_at = bytes
            .windows(5)
            .take(1024)
            .position(|w| w == b"%PDF-")
            .ok_or_else(|| Error::InvalidContainer("missing %PDF- header".to_string()))?;
        let version: String = bytes[header_at + 5..]
            .iter()
            .take_while(|&&b| b.is_ascii_digit() || b == b'.')
            .map(|&b| b as char)
            .collect();
        let version = if version.is_empty() { "1.7".to_string() } else { version };

        let mut objects = parser::scan_objects(bytes);
        if objects.is_empty() {
            return Err(Error::InvalidContainer("no objects found".to_string()));
        }

        // Promote members of compressed object streams, then drop the
        // carriers and any xref streams.
        let mut extracted: Vec<(ObjectId, PdfObject)> = Vec::new();
        let mut carriers: Vec<ObjectId> = Vec::new();
        let mut xref_stream_trailer: Option<IndexMap<String, PdfObject>> = None;
        for (&id, obj) in &objects {
            if let PdfObject::Stream { dict, data } = obj {
                match dict.get("Type").and_then(|t| t.as_name()) {
                    Some("ObjStm") => {
                        match parser::extract_object_stream(dict, data) {
                            Ok(members) => extracted.extend(members),
                            Err(e) => return Err(Error::InvalidContainer(e.to_string())),
                        }
                        carriers.push(id);
                    },
                    Some("XRef") => {
                        let mut cleaned = dict.clone();
                        for key in [
                            "Type", "Filter", "W", "Index", "Length", "Prev", "DecodeParms",
                            "XRefStm",
                        ] {
                            cleaned.shift_remove(key);
                        }
                        xref_stream_trailer = Some(cleaned);
                        carriers.push(id);
                    },
                    _ => {},
                }
            }
        }
        for (id, obj) in extracted {
            // Scanned (uncompressed) definitions take precedence: they are
            // the later incremental update.
            objects.entry(id).or_insert(obj);
        }
        for id in carriers {
            objects.shift_remove(&id);
        }

        let mut trailer = parser::scan_trailer(bytes);
        if trailer.is_empty() {
            if let Some(from_xref) = xref_stream_trailer {
                trailer = from_xref;
            }
        }
        if !trailer.contains_key("Root") {
            // Reconstruct the minimum: point Root at the catalog.
            let catalog = objects.iter().find_map(|(&id, obj)| {
                let dict = obj.as_dict()?;
                (dict.get("Type").and_then(|t| t.as_name()) == Some("Catalog")).then_some(id)
            });
            match catalog {
                Some(id) => {
                    trailer.insert("Root".to_string(), PdfObject::Reference(id));
                },
                None => {
                    return Err(Error::InvalidContainer("no document catalog".to_string()))
                },
            }
        }
        if trailer.contains_key("Encrypt") {
            return Err(Error::InvalidContainer("encrypted PDF is not supported".to_string()));
        }

        Ok(Self {
            version,
            objects,
            trailer,
        })
    }

    /// Follow references until a direct object is reached.
    pub fn resolve<'a>(&'a self, obj: &'a PdfObject) -> &'a PdfObject {
        let mut current = obj;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                PdfObject::Reference(id) => match self.objects.get(id) {
                    Some(target) => current = target,
                    None => return &PdfObject::Null,
                },
                direct => return direct,
            }
        }
        &PdfObject::Null
    }

    /// Direct access to an object by id.
    pub fn object(&self, id: ObjectId) -> Option<&PdfObject> {
        self.objects.get(&id)
    }

    /// Replace an object by id.
    pub fn set_object(&mut self, id: ObjectId, obj: PdfObject) {
        self.objects.insert(id, obj);
    }

    /// The merged trailer dictionary.
    pub fn trailer(&self) -> &IndexMap<String, PdfObject> {
        &self.trailer
    }

    /// Id of the info dictionary object, if the trailer points at one.
    pub fn info_id(&self) -> Option<ObjectId> {
        self.trailer.get("Info").and_then(|i| i.as_reference())
    }

    /// Decoded (key, text) pairs of the info dictionary.
    pub fn info_entries(&self) -> Vec<(String, String)> {
        let Some(info) = self.trailer.get("Info") else {
            return Vec::new();
        };
        let Some(dict) = self.resolve(info).as_dict() else {
            return Vec::new();
        };
        dict.iter()
            .filter_map(|(key, value)| {
                let text = self.resolve(value).as_text()?;
                (!text.is_empty()).then(|| (key.clone(), text))
            })
            .collect()
    }

    /// Mutate the info dictionary in place. No-op when the document has no
    /// info object.
    pub fn update_info(&mut self, f: impl FnOnce(&mut IndexMap<String, PdfObject>)) {
        let Some(id) = self.info_id() else { return };
        if let Some(dict) = self.objects.get_mut(&id).and_then(|o| o.as_dict_mut()) {
            f(dict);
        }
    }

    /// Ids of all page objects, in tree order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        let mut pages = Vec::new();
        let Some(root) = self.trailer.get("Root") else {
            return pages;
        };
        let catalog = self.resolve(root);
        let Some(pages_ref) = catalog.as_dict().and_then(|d| d.get("Pages")) else {
            return pages;
        };
        let mut visited = std::collections::HashSet::new();
        self.collect_pages(pages_ref, &mut pages, &mut visited, 0);
        pages
    }

    fn collect_pages(
        &self,
        node: &PdfObject,
        pages: &mut Vec<ObjectId>,
        visited: &mut std::collections::HashSet<ObjectId>,
        depth: u32,
    ) {
        if depth > MAX_RESOLVE_DEPTH {
            return;
        }
        let id = match node.as_reference() {
            Some(id) => {
                if !visited.insert(id) {
                    return;
                }
                id
            },
            None => return,
        };
        let Some(dict) = self.resolve(node).as_dict() else {
            return;
        };
        match dict.get("Type").and_then(|t| t.as_name()) {
            Some("Pages") => {
                if let Some(kids) = dict.get("Kids").map(|k| self.resolve(k)) {
                    if let Some(kids) = kids.as_array() {
                        let kids = kids.to_vec();
                        for kid in &kids {
                            self.collect_pages(kid, pages, visited, depth + 1);
                        }
                    }
                }
            },
            _ => pages.push(id),
        }
    }

    /// Per-page annotation subtype lists, in page order.
    pub fn page_annotations(&self) -> Vec<Vec<String>> {
        self.page_ids()
            .iter()
            .map(|&id| {
                let Some(dict) = self.objects.get(&id).and_then(|o| o.as_dict()) else {
                    return Vec::new();
                };
                let Some(annots) = dict.get("Annots").map(|a| self.resolve(a)) else {
                    return Vec::new();
                };
                let Some(annots) = annots.as_array() else {
                    return Vec::new();
                };
                annots
                    .iter()
                    .map(|a| {
                        self.resolve(a)
                            .as_dict()
                            .and_then(|d| d.get("Subtype"))
                            .and_then(|s| s.as_name())
                            .unwrap_or("Unknown")
                            .to_string()
                    })
                    .collect()
            })
            .collect()
    }

    /// Set every page's `/Annots` to an empty array.
    pub fn clear_annotations(&mut self) -> usize {
        let mut cleared = 0;
        for id in self.page_ids() {
            if let Some(dict) = self.objects.get_mut(&id).and_then(|o| o.as_dict_mut()) {
                let had = dict
                    .get("Annots")
                    .map(|a| !matches!(a, PdfObject::Array(v) if v.is_empty()))
                    .unwrap_or(false);
                dict.insert("Annots".to_string(), PdfObject::Array(Vec::new()));
                if had {
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Names of embedded files from the catalog's name tree.
    pub fn embedded_file_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Some(tree) = self.embedded_files_tree() else {
            return names;
        };
        self.collect_tree_names(&tree, &mut names, 0);
        names
    }

    fn embedded_files_tree(&self) -> Option<PdfObject> {
        let root = self.trailer.get("Root")?;
        let catalog = self.resolve(root).as_dict()?;
        let names_dict = self.resolve(catalog.get("Names")?).as_dict()?;
        Some(self.resolve(names_dict.get("EmbeddedFiles")?).clone())
    }

    fn collect_tree_names(&self, node: &PdfObject, out: &mut Vec<String>, depth: u32) {
        if depth > MAX_RESOLVE_DEPTH {
            return;
        }
        let Some(dict) = self.resolve(node).as_dict() else {
            return;
        };
        if let Some(kids) = dict.get("Kids").map(|k| self.resolve(k)) {
            if let Some(kids) = kids.as_array() {
                let kids = kids.to_vec();
                for kid in &kids {
                    self.collect_tree_names(kid, out, depth + 1);
                }
            }
        }
        if let Some(names) = dict.get("Names").map(|n| self.resolve(n)) {
            if let Some(pairs) = names.as_array() {
                for pair in pairs.chunks(2) {
                    if let Some(text) = self.resolve(&pair[0]).as_text() {
                        out.push(text);
                    }
                }
            }
        }
    }

    /// Empty the embedded-files name tree. Returns how many files were
    /// attached before.
    pub fn clear_embedded_files(&mut self) -> usize {
        let count = self.embedded_file_names().len();
        if count == 0 {
            return 0;
        }
        // Locate the names dictionary (inline in the catalog or behind a
        // reference) and replace /EmbeddedFiles with an empty tree.
        let Some(root_ref) = self.trailer.get("Root").and_then(|r| r.as_reference()) else {
            return 0;
        };
        let names_entry = self
            .objects
            .get(&root_ref)
            .and_then(|o| o.as_dict())
            .and_then(|d| d.get("Names"))
            .cloned();
        let mut empty = IndexMap::new();
        empty.insert("Names".to_string(), PdfObject::Array(Vec::new()));
        let empty_tree = PdfObject::Dictionary(empty);
        match names_entry {
            Some(PdfObject::Reference(names_id)) => {
                if let Some(dict) = self.objects.get_mut(&names_id).and_then(|o| o.as_dict_mut())
                {
                    dict.insert("EmbeddedFiles".to_string(), empty_tree);
                }
            },
            Some(PdfObject::Dictionary(_)) => {
                if let Some(dict) = self
                    .objects
                    .get_mut(&root_ref)
                    .and_then(|o| o.as_dict_mut())
                    .and_then(|d| d.get_mut("Names"))
                    .and_then(|n| n.as_dict_mut())
                {
                    dict.insert("EmbeddedFiles".to_string(), empty_tree);
                }
            },
            _ => return 0,
        }
        count
    }

    /// Materialize the document: header, every object, a fresh classic
    /// xref table, and the trailer.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(format!("%PDF-{}\n", self.version).as_bytes());
        out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        ids.sort_unstable();
        let mut offsets: Vec<(ObjectId, usize)> = Vec::with_capacity(ids.len());
        for id in &ids {
            let offset = out.len();
            offsets.push((*id, offset));
            out.extend_from_slice(format!("{} {} obj\n", id.0, id.1).as_bytes());
            object::write_object(&self.objects[id], &mut out);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        out.extend_from_slice(b"xref\n");
        out.extend_from_slice(b"0 1\n0000000000 65535 f\r\n");
        let mut i = 0usize;
        while i < offsets.len() {
            let start = offsets[i].0 .0;
            let mut run = 1usize;
            while i + run < offsets.len() && offsets[i + run].0 .0 == start + run as u32 {
                run += 1;
            }
            out.extend_from_slice(format!("{} {}\n", start, run).as_bytes());
            for (id, offset) in &offsets[i..i + run] {
                out.extend_from_slice(format!("{:010} {:05} n\r\n", offset, id.1).as_bytes());
            }
            i += run;
        }

        let mut trailer = self.trailer.clone();
        trailer.shift_remove("Prev");
        trailer.shift_remove("XRefStm");
        let max_id = ids.last().map(|id| id.0).unwrap_or(0);
        trailer.insert("Size".to_string(), PdfObject::Integer(max_id as i64 + 1));
        out.extend_from_slice(b"trailer\n");
        object::write_object(&PdfObject::Dictionary(trailer), &mut out);
        out.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        Ok(out)
    }
}
