//! ZIP-backed OOXML container.
//!
//! OOXML documents (DOCX, PPTX, XLSX) are deflate-compressed ZIP archives
//! whose members are called parts. The container inflates every member up
//! front into an ordered part table, so later reads cannot fail and `save`
//! can materialize a fresh archive atomically from memory.

use crate::container::glob_match;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Ordered table of OOXML parts, owned exclusively by this container.
#[derive(Debug, Clone)]
pub struct OoxmlContainer {
    parts: IndexMap<String, Vec<u8>>,
}

impl OoxmlContainer {
    /// Open a ZIP archive and inflate all members.
    ///
    /// Returns `InvalidContainer` on bad magic, truncated archives, or
    /// undecompressable members.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 || &bytes[..2] != b"PK" {
            return Err(Error::InvalidContainer("not a ZIP archive".to_string()));
        }
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::InvalidContainer(format!("unreadable archive: {}", e)))?;

        let mut parts = IndexMap::new();
        for i in 0..archive.len() {
            let mut member = archive
                .by_index(i)
                .map_err(|e| Error::InvalidContainer(format!("bad member {}: {}", i, e)))?;
            if member.is_dir() {
                continue;
            }
            let name = member.name().to_string();
            let mut content = Vec::with_capacity(member.size() as usize);
            member
                .read_to_end(&mut content)
                .map_err(|e| Error::InvalidContainer(format!("member '{}': {}", name, e)))?;
            parts.insert(name, content);
        }
        if !parts.contains_key("[Content_Types].xml") {
            return Err(Error::InvalidContainer(
                "missing [Content_Types].xml".to_string(),
            ));
        }
        Ok(Self { parts })
    }

    /// Read a part's raw bytes.
    pub fn read_part(&self, path: &str) -> Result<&[u8]> {
        self.parts
            .get(path)
            .map(|v| v.as_slice())
            .ok_or_else(|| Error::MissingPart(path.to_string()))
    }

    /// Read a part as UTF-8 text (lossy for stray bytes).
    pub fn read_part_str(&self, path: &str) -> Result<String> {
        let bytes = self.read_part(path)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Whether a part exists.
    pub fn has_part(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// Replace or insert a part. Buffered in memory until `save`.
    pub fn write_part(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.parts.insert(path.to_string(), content.into());
    }

    /// Remove a part. Returns whether it existed.
    pub fn remove_part(&mut self, path: &str) -> bool {
        self.parts.shift_remove(path).is_some()
    }

    /// All part paths matching `pattern` (`*` wildcard), in archive order.
    pub fn list_parts(&self, pattern: &str) -> Vec<String> {
        self.parts
            .keys()
            .filter(|p| glob_match(pattern, p))
            .cloned()
            .collect()
    }

    /// All part paths, in archive order.
    pub fn part_paths(&self) -> Vec<String> {
        self.parts.keys().cloned().collect()
    }

    /// Materialize a fresh deflate archive from the in-memory part table.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, content) in &self.parts {
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content)?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| Error::Internal(format!("archive finalize failed: {}", e)))?;
        Ok(cursor.into_inner())
    }
}
