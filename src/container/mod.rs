//! Format containers.
//!
//! A [`Document`] wraps the container for its format: OOXML documents are
//! ZIP archives holding named XML parts, PDFs are an object tree of which
//! this crate models the info dictionary, page annotations, and the
//! embedded-files name tree. The container owns the part table exclusively;
//! detectors read through it, only the cleaner and the applier write.

pub mod ooxml;
pub mod pdf;

use crate::error::{Error, Result};

pub use ooxml::OoxmlContainer;
pub use pdf::PdfContainer;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Word document (OOXML)
    Docx,
    /// PowerPoint presentation (OOXML)
    Pptx,
    /// Excel workbook (OOXML)
    Xlsx,
    /// Portable Document Format
    Pdf,
}

impl DocumentFormat {
    /// Resolve a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Ok(DocumentFormat::Docx),
            "pptx" => Ok(DocumentFormat::Pptx),
            "xlsx" => Ok(DocumentFormat::Xlsx),
            "pdf" => Ok(DocumentFormat::Pdf),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pptx => "pptx",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Pdf => "pdf",
        }
    }

    /// Whether the format is a ZIP-backed OOXML container.
    pub fn is_ooxml(&self) -> bool {
        !matches!(self, DocumentFormat::Pdf)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// The open container behind a document.
#[derive(Debug, Clone)]
pub enum Container {
    /// ZIP-backed OOXML part table
    Ooxml(OoxmlContainer),
    /// PDF object tree
    Pdf(PdfContainer),
}

/// An open document: immutable identity plus its container.
///
/// Cleaning produces a new byte vector via [`Document::save`]; the input
/// bytes are never mutated in place.
#[derive(Debug, Clone)]
pub struct Document {
    /// Request-scoped identifier.
    pub id: String,
    /// Original file name as uploaded.
    pub original_name: String,
    /// Container format.
    pub format: DocumentFormat,
    /// Format container owning the part table.
    pub container: Container,
}

impl Document {
    /// Open `bytes` as `format`.
    pub fn open(bytes: &[u8], format: DocumentFormat, original_name: &str) -> Result<Self> {
        let container = match format {
            DocumentFormat::Pdf => Container::Pdf(PdfContainer::open(bytes)?),
            _ => Container::Ooxml(OoxmlContainer::open(bytes)?),
        };
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_name: original_name.to_string(),
            format,
            container,
        })
    }

    /// The OOXML container, if this document is OOXML.
    pub fn ooxml(&self) -> Option<&OoxmlContainer> {
        match &self.container {
            Container::Ooxml(c) => Some(c),
            Container::Pdf(_) => None,
        }
    }

    /// Mutable access to the OOXML container.
    pub fn ooxml_mut(&mut self) -> Option<&mut OoxmlContainer> {
        match &mut self.container {
            Container::Ooxml(c) => Some(c),
            Container::Pdf(_) => None,
        }
    }

    /// The PDF container, if this document is a PDF.
    pub fn pdf(&self) -> Option<&PdfContainer> {
        match &self.container {
            Container::Pdf(c) => Some(c),
            Container::Ooxml(_) => None,
        }
    }

    /// Mutable access to the PDF container.
    pub fn pdf_mut(&mut self) -> Option<&mut PdfContainer> {
        match &mut self.container {
            Container::Pdf(c) => Some(c),
            Container::Ooxml(_) => None,
        }
    }

    /// Materialize the container as bytes. Atomic: either a complete
    /// archive is produced or an error is returned.
    pub fn save(&self) -> Result<Vec<u8>> {
        match &self.container {
            Container::Ooxml(c) => c.save(),
            Container::Pdf(c) => c.save(),
        }
    }
}

/// Match `path` against a pattern where `*` matches any run of characters.
///
/// Used by `list_parts`; patterns like `word/header*.xml` or
/// `*/embeddings/*` cover the lookups the detectors and cleaners need.
pub(crate) fn glob_match(pattern: &str, path: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == path;
    }
    let mut pos = 0usize;
    for (i, piece) in parts.iter().enumerate() {
        if piece.is_empty() {
            continue;
        }
        if i == 0 {
            if !path.starts_with(piece) {
                return false;
            }
            pos = piece.len();
        } else if i == parts.len() - 1 {
            return path.len() >= pos && path[pos..].ends_with(piece);
        } else {
            match path[pos..].find(piece) {
                Some(found) => pos += found + piece.len(),
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("DOCX").unwrap(), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_extension("pdf").unwrap(), DocumentFormat::Pdf);
        assert!(DocumentFormat::from_extension("odt").is_err());
    }

    #[test]
    fn test_format_is_ooxml() {
        assert!(DocumentFormat::Xlsx.is_ooxml());
        assert!(!DocumentFormat::Pdf.is_ooxml());
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("word/header*.xml", "word/header1.xml"));
        assert!(glob_match("*/embeddings/*", "word/embeddings/oleObject1.bin"));
        assert!(glob_match("xl/comments*.xml", "xl/comments1.xml"));
        assert!(!glob_match("word/header*.xml", "word/footer1.xml"));
        assert!(glob_match("word/document.xml", "word/document.xml"));
        assert!(!glob_match("word/document.xml", "word/document2.xml"));
    }
}
