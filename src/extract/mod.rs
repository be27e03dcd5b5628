//! Text extraction.
//!
//! Produces a normalized plain-text projection per format: the ordered
//! concatenation of decoded run texts with paragraph separators between
//! block boundaries. No whitespace is ever injected between adjacent tags
//! inside a paragraph — doing so would fragment words that styling split
//! across runs.
//!
//! The projection carries a mapping from projection offsets back to
//! `(part, segment index, offset in segment)` so detectors can anchor
//! findings. It is invalidated by any edit and must be rebuilt.

mod docx;
mod pptx;
mod xlsx;

use crate::container::{Document, DocumentFormat};

/// Maps one contiguous projection range back to a run-level text node.
#[derive(Debug, Clone)]
pub struct SegmentSpan {
    /// Part path the segment lives in.
    pub part: String,
    /// Ordinal of the text node within the part (document order).
    pub segment_index: usize,
    /// Projection offset where the segment's text starts.
    pub start: usize,
    /// Projection offset just past the segment's text.
    pub end: usize,
}

/// The text view of a document.
///
/// `text` preserves exact run contents and separator characters so that
/// offsets remain valid; [`TextProjection::normalized`] yields the
/// whitespace-normalized variant used for statistics and rule matching.
#[derive(Debug, Clone, Default)]
pub struct TextProjection {
    /// Raw concatenated text with separators.
    pub text: String,
    spans: Vec<SegmentSpan>,
}

impl TextProjection {
    /// A projection over bare text with no segment mapping. Offsets into
    /// it cannot be located back to parts; rule evaluation and tests use
    /// this, the applier never does.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// Whether any text was extracted.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Locate a projection offset: `(part, segment index, offset within
    /// the segment)`. Offsets falling on separator characters resolve to
    /// no segment.
    pub fn locate(&self, offset: usize) -> Option<(&str, usize, usize)> {
        let idx = self
            .spans
            .partition_point(|span| span.end <= offset);
        let span = self.spans.get(idx)?;
        if offset < span.start {
            return None;
        }
        Some((span.part.as_str(), span.segment_index, offset - span.start))
    }

    /// Spans covering the half-open projection range.
    pub fn spans_in(&self, start: usize, end: usize) -> &[SegmentSpan] {
        let lo = self.spans.partition_point(|span| span.end <= start);
        let hi = self.spans.partition_point(|span| span.start < end);
        &self.spans[lo..hi]
    }

    /// Whitespace-normalized text: horizontal space runs collapsed to one
    /// space, tabs and newlines preserved, three or more consecutive
    /// newlines collapsed to two.
    pub fn normalized(&self) -> String {
        normalize_whitespace(&self.text)
    }
}

/// Accumulates segments and separators into a projection.
#[derive(Debug, Default)]
pub(crate) struct ProjectionBuilder {
    text: String,
    spans: Vec<SegmentSpan>,
}

impl ProjectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one run-level text node.
    pub fn push_segment(&mut self, part: &str, segment_index: usize, content: &str) {
        if content.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(content);
        self.spans.push(SegmentSpan {
            part: part.to_string(),
            segment_index,
            start,
            end: self.text.len(),
        });
    }

    /// Append a separator character that belongs to no segment.
    pub fn push_separator(&mut self, sep: char) {
        self.text.push(sep);
    }

    pub fn finish(self) -> TextProjection {
        TextProjection {
            text: self.text,
            spans: self.spans,
        }
    }
}

/// Collapse horizontal whitespace runs and excess blank lines.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut spaces = 0usize;
    let mut newlines = 0usize;
    for ch in text.chars() {
        match ch {
            ' ' => {
                spaces += 1;
            },
            '\n' => {
                spaces = 0;
                newlines += 1;
                if newlines <= 2 {
                    out.push('\n');
                }
            },
            other => {
                if spaces > 0 {
                    out.push(' ');
                    spaces = 0;
                }
                newlines = 0;
                out.push(other);
            },
        }
    }
    out
}

/// Extract the text projection for a document.
///
/// PDF projection is intentionally empty: content streams are out of
/// scope, and all detectors tolerate empty projections.
pub fn extract(doc: &Document) -> TextProjection {
    match doc.format {
        DocumentFormat::Docx => docx::extract(doc),
        DocumentFormat::Pptx => pptx::extract(doc),
        DocumentFormat::Xlsx => xlsx::extract(doc),
        DocumentFormat::Pdf => TextProjection::default(),
    }
}

/// Sort part paths by their numeric suffix (`slide2.xml` before
/// `slide10.xml`).
pub(crate) fn sort_by_numeric_suffix(paths: &mut [String]) {
    fn suffix_number(path: &str) -> u64 {
        let stem = path.rsplit('/').next().unwrap_or(path);
        let digits: String = stem.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().unwrap_or(0)
    }
    paths.sort_by_key(|p| suffix_number(p));
}
