//! Anchored text applier.
//!
//! OOXML fragments text across many run-level nodes for styling reasons,
//! so an edit targeting a semantic string may straddle several segments.
//! The applier rewrites segment inner text through the raw part XML while
//! preserving every tag and attribute: the tag count of a part is
//! identical before and after, only text node contents change.
//!
//! Offsets are part-relative projections (concatenated decoded segment
//! texts with nothing injected between them). Edits carrying global
//! projection offsets are mapped through the extractor's projection;
//! offset-less edits are located by scoring occurrences against their
//! context windows.

use crate::container::{Document, DocumentFormat};
use crate::error::{Error, Result};
use crate::extract::TextProjection;
use crate::findings::SpellingIssue;
use quick_xml::escape::{escape, unescape};

/// One requested text change.
#[derive(Debug, Clone)]
pub struct EditOp {
    /// Exact substring to replace (whitespace significant).
    pub error: String,
    /// Replacement text.
    pub correction: String,
    /// Context preceding the error, when known.
    pub context_before: Option<String>,
    /// Context following the error, when known.
    pub context_after: Option<String>,
    /// Global projection offset of the error, when known.
    pub start: Option<usize>,
    /// Global projection end offset, when known.
    pub end: Option<usize>,
}

impl From<&SpellingIssue> for EditOp {
    fn from(issue: &SpellingIssue) -> Self {
        Self {
            error: issue.error.clone(),
            correction: issue.correction.clone(),
            context_before: Some(issue.context_before.clone()),
            context_after: Some(issue.context_after.clone()),
            start: issue.start_index,
            end: issue.end_index,
        }
    }
}

/// A before/after sample for the report.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditExample {
    /// Text before the change (truncated).
    pub before: String,
    /// Text after the change (truncated).
    pub after: String,
}

/// Statistics returned by [`apply`].
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStats {
    /// Total text nodes enumerated across target parts.
    pub nodes_considered: usize,
    /// Text nodes whose content changed.
    pub nodes_changed: usize,
    /// Edits applied.
    pub applied: usize,
    /// Edits skipped (unlocatable, mismatched, or overlapping).
    pub skipped: usize,
    /// Up to ten before/after samples.
    pub examples: Vec<EditExample>,
}

const MAX_EXAMPLES: usize = 10;
const EXAMPLE_CHARS: usize = 140;

/// A run-level text node with its raw XML span and decoded text.
#[derive(Debug, Clone)]
pub(crate) struct RawSegment {
    /// Offset of `<` of the opening tag in the part XML.
    pub xml_start: usize,
    /// Offset just past `>` of the opening tag (inner text start).
    pub inner_start: usize,
    /// Offset of `<` of the closing tag (inner text end).
    pub inner_end: usize,
    /// Offset just past the closing tag.
    pub xml_end: usize,
    /// Whether the element was self-closing (`<w:t/>`).
    pub self_closing: bool,
    /// Decoded inner text.
    pub text: String,
    /// Part-projection offset where this segment's text starts.
    pub proj_start: usize,
}

impl RawSegment {
    fn proj_end(&self) -> usize {
        self.proj_start + self.text.chars().count()
    }
}

/// Text-bearing parts and their run tag for a format.
pub(crate) fn text_parts(doc: &Document) -> Vec<(String, &'static str)> {
    let Some(container) = doc.ooxml() else {
        return Vec::new();
    };
    match doc.format {
        DocumentFormat::Docx => {
            let mut parts = Vec::new();
            for fixed in ["word/document.xml", "word/footnotes.xml", "word/endnotes.xml"] {
                if container.has_part(fixed) {
                    parts.push(fixed.to_string());
                }
            }
            parts.extend(container.list_parts("word/header*.xml"));
            parts.extend(container.list_parts("word/footer*.xml"));
            parts.into_iter().map(|p| (p, "w:t")).collect()
        },
        DocumentFormat::Pptx => {
            let mut parts = container.list_parts("ppt/slides/slide*.xml");
            parts.extend(container.list_parts("ppt/notesSlides/notesSlide*.xml"));
            parts.into_iter().map(|p| (p, "a:t")).collect()
        },
        DocumentFormat::Xlsx => {
            if container.has_part("xl/sharedStrings.xml") {
                vec![("xl/sharedStrings.xml".to_string(), "t")]
            } else {
                Vec::new()
            }
        },
        DocumentFormat::Pdf => Vec::new(),
    }
}

/// Enumerate `<tag>` text nodes in document order, with raw XML offsets.
///
/// The scanner tracks attribute quoting so `>` inside attribute values
/// cannot end an opening tag early.
pub(crate) fn enumerate_segments(xml: &str, tag: &str) -> Vec<RawSegment> {
    let open_prefix = format!("<{}", tag);
    let close_tag = format!("</{}>", tag);
    let mut segments = Vec::new();
    let mut pos = 0usize;
    let mut proj = 0usize;
    while let Some(found) = xml[pos..].find(&open_prefix) {
        let xml_start = pos + found;
        let after_name = xml_start + open_prefix.len();
        // Must be a real tag boundary, not a prefix of a longer name
        match xml[after_name..].chars().next() {
            Some('>') | Some('/') | Some(' ') | Some('\t') | Some('\r') | Some('\n') => {},
            _ => {
                pos = after_name;
                continue;
            },
        }
        let Some((open_end, self_closing)) = find_tag_end(xml, after_name) else {
            break;
        };
        if self_closing {
            segments.push(RawSegment {
                xml_start,
                inner_start: open_end,
                inner_end: open_end,
                xml_end: open_end,
                self_closing: true,
                text: String::new(),
                proj_start: proj,
            });
            pos = open_end;
            continue;
        }
        let inner_start = open_end;
        let Some(close_at) = xml[inner_start..].find(&close_tag) else {
            break;
        };
        let inner_end = inner_start + close_at;
        let xml_end = inner_end + close_tag.len();
        let text = unescape(&xml[inner_start..inner_end])
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| xml[inner_start..inner_end].to_string());
        let chars = text.chars().count();
        segments.push(RawSegment {
            xml_start,
            inner_start,
            inner_end,
            xml_end,
            self_closing: false,
            text,
            proj_start: proj,
        });
        proj += chars;
        pos = xml_end;
    }
    segments
}

/// Find the end of an opening tag starting after the tag name. Returns the
/// offset just past `>` and whether the tag was self-closing.
fn find_tag_end(xml: &str, from: usize) -> Option<(usize, bool)> {
    let bytes = xml.as_bytes();
    let mut i = from;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            },
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => {
                    let self_closing = i > from && bytes[i - 1] == b'/';
                    return Some((i + 1, self_closing));
                },
                _ => {},
            },
        }
        i += 1;
    }
    None
}

/// A located edit within one part's projection.
struct LocatedEdit {
    edit_index: usize,
    start: usize,
    end: usize,
    correction: String,
}

/// Apply edits to a document in place. Edits that cannot be located, that
/// mismatch their target slice, or that overlap an already-mutated span
/// are skipped and counted, never fatal.
pub fn apply(
    doc: &mut Document,
    projection: &TextProjection,
    edits: &[EditOp],
) -> Result<ApplyStats> {
    let mut stats = ApplyStats::default();
    let parts = text_parts(doc);
    if parts.is_empty() {
        stats.skipped = edits.len();
        return Ok(stats);
    }

    // Locate every edit against the pristine parts first.
    let mut located: Vec<(String, LocatedEdit)> = Vec::new();
    let mut part_segments: Vec<(String, &'static str, String, Vec<RawSegment>)> = Vec::new();
    for (path, tag) in &parts {
        let container = doc.ooxml().ok_or_else(|| {
            Error::Internal("text parts listed for non-OOXML document".to_string())
        })?;
        let xml = match container.read_part_str(path) {
            Ok(xml) => xml,
            Err(e) => {
                log::warn!("applier skipping part: {}", e);
                continue;
            },
        };
        let segments = enumerate_segments(&xml, tag);
        stats.nodes_considered += segments.len();
        part_segments.push((path.clone(), tag, xml, segments));
    }

    // Offset-carrying edits first (ordered by start), then offset-less
    // ordered by descending error length.
    let mut order: Vec<usize> = (0..edits.len()).collect();
    order.sort_by_key(|&i| {
        let edit = &edits[i];
        match edit.start {
            Some(s) => (0usize, s, usize::MAX - edit.error.chars().count()),
            None => (1usize, usize::MAX - edit.error.chars().count(), 0),
        }
    });

    for &edit_index in &order {
        let edit = &edits[edit_index];
        match locate_edit(edit, projection, &part_segments) {
            Some((part, start, end)) => located.push((
                part,
                LocatedEdit {
                    edit_index,
                    start,
                    end,
                    correction: edit.correction.clone(),
                },
            )),
            None => stats.skipped += 1,
        }
    }

    // Apply per part, earliest start first, skipping overlaps.
    for (path, _tag, xml, segments) in part_segments {
        let mut part_edits: Vec<&LocatedEdit> = located
            .iter()
            .filter(|(p, _)| *p == path)
            .map(|(_, e)| e)
            .collect();
        part_edits.sort_by_key(|e| {
            (e.start, usize::MAX - (e.end - e.start), e.edit_index)
        });
        if part_edits.is_empty() {
            continue;
        }
        let mut writer = PartWriter::new(xml, segments);
        let mut last_end = 0usize;
        let mut first = true;
        // Located offsets are pristine; applied edits shift everything
        // after them, so track the cumulative char delta.
        let mut delta: isize = 0;
        for edit in part_edits {
            if !first && edit.start < last_end {
                stats.skipped += 1;
                continue;
            }
            let adj_start = (edit.start as isize + delta) as usize;
            let adj_end = (edit.end as isize + delta) as usize;
            match writer.replace_range(adj_start, adj_end, &edit.correction) {
                Ok(changed) => {
                    stats.applied += 1;
                    stats.nodes_changed += changed.nodes_changed;
                    if stats.examples.len() < MAX_EXAMPLES {
                        stats.examples.push(changed.example);
                    }
                    last_end = edit.end;
                    first = false;
                    delta += edit.correction.chars().count() as isize
                        - (edit.end - edit.start) as isize;
                },
                Err(e) => {
                    log::warn!("edit skipped: {}", e);
                    stats.skipped += 1;
                },
            }
        }
        let rewritten = writer.finish();
        if let Some(container) = doc.ooxml_mut() {
            container.write_part(&path, rewritten.into_bytes());
        }
    }
    Ok(stats)
}

/// Resolve an edit to `(part, part-projection char start, end)`.
fn locate_edit(
    edit: &EditOp,
    projection: &TextProjection,
    parts: &[(String, &'static str, String, Vec<RawSegment>)],
) -> Option<(String, usize, usize)> {
    // Explicit global offsets map through the extractor projection. The
    // projection hands back a byte offset within the segment; applier
    // bookkeeping is in chars, so convert before anchoring.
    if let Some((gstart, _gend)) = edit.start.zip(edit.end) {
        if let Some((part, segment_index, byte_offset)) = projection.locate(gstart) {
            if let Some((_, _, _, segments)) =
                parts.iter().find(|(p, _, _, _)| p.as_str() == part)
            {
                if let Some(segment) = segments.get(segment_index) {
                    if let Some(prefix) = segment.text.get(..byte_offset) {
                        let start = segment.proj_start + prefix.chars().count();
                        let end = start + edit.error.chars().count();
                        let part_text: String =
                            segments.iter().map(|s| s.text.as_str()).collect();
                        let slice: String = part_text
                            .chars()
                            .skip(start)
                            .take(end - start)
                            .collect();
                        if slice.eq_ignore_ascii_case(&edit.error) {
                            return Some((part.to_string(), start, end));
                        }
                        // Mismatched offsets: fall through to context search
                    }
                }
            }
        }
    }

    // Context-scored occurrence search, case-sensitive first.
    let error_len = edit.error.chars().count();
    let mut best: Option<(i32, String, usize)> = None;
    for (path, _, _, segments) in parts {
        let part_text: String = segments.iter().map(|s| s.text.as_str()).collect();
        let occurrences = find_occurrences(&part_text, &edit.error);
        for (char_at, exact_case) in occurrences {
            let mut score = 0i32;
            if exact_case {
                score += 3;
            }
            if let Some(before) = &edit.context_before {
                let trimmed = before.trim_start();
                if !trimmed.is_empty() {
                    let prefix: String = part_text.chars().take(char_at).collect();
                    if prefix.trim_end().ends_with(trimmed.trim_end()) {
                        score += 5;
                    }
                }
            }
            if let Some(after) = &edit.context_after {
                let trimmed = after.trim_end();
                if !trimmed.is_empty() {
                    let suffix: String =
                        part_text.chars().skip(char_at + error_len).collect();
                    if suffix.trim_start().starts_with(trimmed.trim_start()) {
                        score += 5;
                    }
                }
            }
            if wordish_at(&part_text, char_at, error_len) {
                score += 1;
            }
            if best.as_ref().map(|(s, _, _)| score > *s).unwrap_or(true) {
                best = Some((score, path.clone(), char_at));
            }
        }
    }
    let (score, part, at) = best?;
    let has_context = edit
        .context_before
        .as_deref()
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false)
        || edit
            .context_after
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);
    if has_context && score <= 0 {
        return None;
    }
    Some((part, at, at + error_len))
}

/// All occurrences of `needle` in `haystack` as (char offset, exact case).
/// Case-insensitive matches are only consulted when no exact match exists.
fn find_occurrences(haystack: &str, needle: &str) -> Vec<(usize, bool)> {
    let mut exact: Vec<(usize, bool)> = Vec::new();
    for (byte_at, _) in haystack.match_indices(needle) {
        let char_at = haystack[..byte_at].chars().count();
        exact.push((char_at, true));
    }
    if !exact.is_empty() {
        return exact;
    }
    let lower_hay = haystack.to_lowercase();
    let lower_needle = needle.to_lowercase();
    let mut folded = Vec::new();
    for (byte_at, _) in lower_hay.match_indices(&lower_needle) {
        let char_at = lower_hay[..byte_at].chars().count();
        folded.push((char_at, false));
    }
    folded
}

fn wordish_at(text: &str, char_at: usize, len: usize) -> bool {
    let before = text.chars().nth(char_at.wrapping_sub(1));
    let after = text.chars().nth(char_at + len);
    let before_ok = char_at == 0 || before.map(|c| !c.is_alphanumeric()).unwrap_or(true);
    let after_ok = after.map(|c| !c.is_alphanumeric()).unwrap_or(true);
    before_ok && after_ok
}

struct ChangeResult {
    nodes_changed: usize,
    example: EditExample,
}

/// Rewrites one part's XML as edits land, keeping segment bookkeeping in
/// char-projection space.
struct PartWriter {
    xml: String,
    segments: Vec<RawSegment>,
}

impl PartWriter {
    fn new(xml: String, segments: Vec<RawSegment>) -> Self {
        Self { xml, segments }
    }

    /// Replace the projection char range `[start, end)` with `replacement`.
    fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
    ) -> Result<ChangeResult> {
        let first = self
            .segments
            .iter()
            .position(|s| s.proj_end() > start && s.proj_start <= start)
            .ok_or_else(|| Error::Internal(format!("edit start {} outside segments", start)))?;
        let mut last = first;
        while self.segments[last].proj_end() < end {
            last += 1;
            if last >= self.segments.len() {
                return Err(Error::Internal(format!("edit end {} outside segments", end)));
            }
        }

        let before_sample: String = self.segments[first..=last]
            .iter()
            .flat_map(|s| s.text.chars())
            .collect();

        if first == last {
            let segment = &self.segments[first];
            let local_start = start - segment.proj_start;
            let local_end = end - segment.proj_start;
            let old_text = segment.text.clone();
            let new_text = splice_chars(&old_text, local_start, local_end, replacement);
            self.rewrite_segment(first, &new_text)?;
            Ok(ChangeResult {
                nodes_changed: 1,
                example: make_example(&before_sample, &splice_chars(
                    &before_sample,
                    local_start,
                    local_end,
                    replacement,
                )),
            })
        } else {
            // Concatenate, replace, then redistribute across the original
            // segment lengths; the last segment absorbs the difference.
            let concat: String = self.segments[first..=last]
                .iter()
                .flat_map(|s| s.text.chars())
                .collect();
            let base = self.segments[first].proj_start;
            let new_concat = splice_chars(&concat, start - base, end - base, replacement);
            let lengths: Vec<usize> = self.segments[first..=last]
                .iter()
                .map(|s| s.text.chars().count())
                .collect();
            let mut remaining: Vec<char> = new_concat.chars().collect();
            let mut nodes_changed = 0usize;
            for (i, original_len) in lengths.iter().enumerate() {
                let seg_index = first + i;
                let take = if i + 1 == lengths.len() {
                    remaining.len()
                } else {
                    (*original_len).min(remaining.len())
                };
                let new_text: String = remaining.drain(..take).collect();
                if new_text != self.segments[seg_index].text {
                    nodes_changed += 1;
                }
                self.rewrite_segment(seg_index, &new_text)?;
            }
            Ok(ChangeResult {
                nodes_changed,
                example: make_example(&before_sample, &new_concat),
            })
        }
    }

    /// Write new decoded text into segment `index`, adjusting downstream
    /// XML offsets and projection offsets by the deltas.
    fn rewrite_segment(&mut self, index: usize, new_text: &str) -> Result<()> {
        let old_chars = self.segments[index].text.chars().count();
        let new_chars = new_text.chars().count();
        let escaped = escape(new_text).into_owned();

        let (xml_delta, new_inner_start, new_inner_end, new_xml_end) = {
            let segment = &self.segments[index];
            if segment.self_closing {
                // <w:t .../> becomes <w:t ...>text</w:t>; the element count
                // is unchanged.
                let open = &self.xml[segment.xml_start..segment.xml_end];
                let tag_name: String = open[1..]
                    .chars()
                    .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
                    .collect();
                let without_slash = open
                    .strip_suffix("/>")
                    .map(|head| format!("{}>", head))
                    .unwrap_or_else(|| open.to_string());
                let rebuilt = format!("{}{}</{}>", without_slash, escaped, tag_name);
                let delta = rebuilt.len() as isize - open.len() as isize;
                let inner_start = segment.xml_start + without_slash.len();
                let inner_end = inner_start + escaped.len();
                let xml_end = segment.xml_start + rebuilt.len();
                self.xml.replace_range(segment.xml_start..segment.xml_end, &rebuilt);
                (delta, inner_start, inner_end, xml_end)
            } else {
                let old_inner_len = segment.inner_end - segment.inner_start;
                let delta = escaped.len() as isize - old_inner_len as isize;
                self.xml
                    .replace_range(segment.inner_start..segment.inner_end, &escaped);
                (
                    delta,
                    segment.inner_start,
                    segment.inner_start + escaped.len(),
                    (segment.xml_end as isize + delta) as usize,
                )
            }
        };

        let segment = &mut self.segments[index];
        segment.text = new_text.to_string();
        segment.self_closing = false;
        segment.inner_start = new_inner_start;
        segment.inner_end = new_inner_end;
        segment.xml_end = new_xml_end;

        let proj_delta = new_chars as isize - old_chars as isize;
        for later in &mut self.segments[index + 1..] {
            later.xml_start = (later.xml_start as isize + xml_delta) as usize;
            later.inner_start = (later.inner_start as isize + xml_delta) as usize;
            later.inner_end = (later.inner_end as isize + xml_delta) as usize;
            later.xml_end = (later.xml_end as isize + xml_delta) as usize;
            later.proj_start = (later.proj_start as isize + proj_delta) as usize;
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.xml
    }
}

/// Replace a char range inside a string.
fn splice_chars(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out: String = text.chars().take(start).collect();
    out.push_str(replacement);
    out.extend(text.chars().skip(end));
    out
}

fn make_example(before: &str, after: &str) -> EditExample {
    EditExample {
        before: truncate_chars(before, EXAMPLE_CHARS),
        after: truncate_chars(after, EXAMPLE_CHARS),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DocumentFormat;
    use crate::extract;

    fn open_docx(body: &str) -> Document {
        let bytes = crate::test_support::build_docx(body);
        Document::open(&bytes, DocumentFormat::Docx, "test.docx").unwrap()
    }

    fn edit(error: &str, correction: &str) -> EditOp {
        EditOp {
            error: error.to_string(),
            correction: correction.to_string(),
            context_before: None,
            context_after: None,
            start: None,
            end: None,
        }
    }

    #[test]
    fn test_enumerate_segments_counts_and_offsets() {
        let xml = "<w:p><w:r><w:t>so</w:t></w:r><w:r><w:t xml:space=\"preserve\">c</w:t></w:r><w:r><w:t/></w:r></w:p>";
        let segments = enumerate_segments(xml, "w:t");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "so");
        assert_eq!(segments[1].text, "c");
        assert_eq!(segments[1].proj_start, 2);
        assert!(segments[2].self_closing);
    }

    #[test]
    fn test_single_segment_edit_preserves_tags() {
        let mut doc = open_docx("<w:p><w:r><w:t>the socal team</w:t></w:r></w:p>");
        let projection = extract::extract(&doc);
        let stats = apply(&mut doc, &projection, &[edit("socal", "social")]).unwrap();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.nodes_changed, 1);

        let xml = doc.ooxml().unwrap().read_part_str("word/document.xml").unwrap();
        assert!(xml.contains("<w:t>the social team</w:t>"));
        assert_eq!(
            xml.matches("<w:t").count(),
            1,
            "tag count must not change"
        );
    }

    #[test]
    fn test_multi_segment_edit_redistributes() {
        let mut doc = open_docx(
            "<w:p><w:r><w:t>soc</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\"> ial</w:t></w:r><w:r><w:t xml:space=\"preserve\"> media</w:t></w:r></w:p>",
        );
        let projection = extract::extract(&doc);
        assert_eq!(projection.text, "soc ial media\n");
        let stats = apply(&mut doc, &projection, &[edit("soc ial", "social")]).unwrap();
        assert_eq!(stats.applied, 1);

        let rebuilt = extract::extract(&doc);
        assert_eq!(rebuilt.text, "social media\n");
        let xml = doc.ooxml().unwrap().read_part_str("word/document.xml").unwrap();
        assert_eq!(xml.matches("<w:t").count(), 3);
        assert!(xml.contains("xml:space=\"preserve\""));
        assert!(xml.contains("<w:b/>"));
    }

    #[test]
    fn test_context_scoring_picks_right_occurrence() {
        let mut doc = open_docx(
            "<w:p><w:r><w:t>alpha socal beta socal gamma</w:t></w:r></w:p>",
        );
        let projection = extract::extract(&doc);
        let mut op = edit("socal", "social");
        op.context_before = Some("beta ".to_string());
        op.context_after = Some(" gamma".to_string());
        let stats = apply(&mut doc, &projection, &[op]).unwrap();
        assert_eq!(stats.applied, 1);
        let rebuilt = extract::extract(&doc);
        assert_eq!(rebuilt.text, "alpha socal beta social gamma\n");
    }

    #[test]
    fn test_declared_context_with_no_match_rejects() {
        let mut doc = open_docx("<w:p><w:r><w:t>alpha socal beta</w:t></w:r></w:p>");
        let projection = extract::extract(&doc);
        let mut op = edit("socal", "social");
        op.context_before = Some("NOTPRESENT".to_string());
        op.context_after = Some("NOTHERE".to_string());
        let stats = apply(&mut doc, &projection, &[op]).unwrap();
        assert_eq!(stats.applied, 0);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_overlapping_edits_skip_later() {
        let mut doc = open_docx("<w:p><w:r><w:t>abcdef</w:t></w:r></w:p>");
        let projection = extract::extract(&doc);
        let edits = vec![edit("abcd", "x"), edit("cdef", "y")];
        let stats = apply(&mut doc, &projection, &edits).unwrap();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.skipped, 1);
        let rebuilt = extract::extract(&doc);
        assert_eq!(rebuilt.text, "xef\n");
    }

    #[test]
    fn test_explicit_offsets_mismatch_falls_back() {
        let mut doc = open_docx("<w:p><w:r><w:t>one socal two</w:t></w:r></w:p>");
        let projection = extract::extract(&doc);
        let mut op = edit("socal", "social");
        // Wrong offsets, pointing at "one s"
        op.start = Some(0);
        op.end = Some(5);
        let stats = apply(&mut doc, &projection, &[op]).unwrap();
        assert_eq!(stats.applied, 1);
        let rebuilt = extract::extract(&doc);
        assert_eq!(rebuilt.text, "one social two\n");
    }

    #[test]
    fn test_edit_into_self_closing_segment() {
        let mut doc = open_docx(
            "<w:p><w:r><w:t>ab</w:t></w:r><w:r><w:t/></w:r><w:r><w:t>cd</w:t></w:r></w:p>",
        );
        let projection = extract::extract(&doc);
        let stats = apply(&mut doc, &projection, &[edit("abcd", "abxcd")]).unwrap();
        assert_eq!(stats.applied, 1);
        let rebuilt = extract::extract(&doc);
        assert_eq!(rebuilt.text, "abxcd\n");
        let xml = doc.ooxml().unwrap().read_part_str("word/document.xml").unwrap();
        assert_eq!(xml.matches("<w:t").count(), 3);
    }

    #[test]
    fn test_escaped_entities_roundtrip() {
        let mut doc = open_docx("<w:p><w:r><w:t>R&amp;D socal</w:t></w:r></w:p>");
        let projection = extract::extract(&doc);
        assert_eq!(projection.text, "R&D socal\n");
        let stats = apply(&mut doc, &projection, &[edit("socal", "social")]).unwrap();
        assert_eq!(stats.applied, 1);
        let xml = doc.ooxml().unwrap().read_part_str("word/document.xml").unwrap();
        assert!(xml.contains("R&amp;D social"));
    }

    #[test]
    fn test_stats_examples_bounded() {
        let body: String = (0..15)
            .map(|i| format!("<w:p><w:r><w:t>wrda{} here</w:t></w:r></w:p>", i))
            .collect();
        let mut doc = open_docx(&body);
        let projection = extract::extract(&doc);
        let edits: Vec<EditOp> = (0..15)
            .map(|i| edit(&format!("wrda{}", i), "word"))
            .collect();
        let stats = apply(&mut doc, &projection, &edits).unwrap();
        assert_eq!(stats.applied, 15);
        assert!(stats.examples.len() <= 10);
    }
}
