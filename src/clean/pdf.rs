//! PDF cleaner.
//!
//! Metadata, annotations, and attachments only. Content streams pass
//! through unchanged; downstream consumers must not assume PDF text is
//! sanitized by this crate.

use super::CleanStats;
use crate::config::CleanOptions;
use crate::container::pdf::encode_pdf_text;
use crate::container::Document;
use crate::error::{Error, Result};

/// Info dictionary keys cleared on metadata removal.
const INFO_KEYS: [&str; 7] = [
    "Title",
    "Author",
    "Subject",
    "Keywords",
    "Creator",
    "Producer",
    "CreationDate",
];

pub(crate) fn clean(doc: &mut Document, options: &CleanOptions) -> Result<CleanStats> {
    let mut stats = CleanStats::default();
    let pdf = doc
        .pdf_mut()
        .ok_or_else(|| Error::Internal("pdf cleaner on non-PDF document".to_string()))?;

    if options.remove_metadata {
        let mod_date = format!("D:{}Z", chrono::Utc::now().format("%Y%m%d%H%M%S"));
        let mut cleared = 0usize;
        pdf.update_info(|info| {
            for key in INFO_KEYS {
                if info.shift_remove(key).is_some() {
                    cleared += 1;
                }
            }
            info.insert("ModDate".to_string(), encode_pdf_text(&mod_date));
        });
        stats.metadata_removed = cleared;
    }

    if options.remove_comments {
        stats.annotations_cleared = pdf.clear_annotations();
    }

    if options.remove_embedded_objects {
        stats.attachments_removed = pdf.clear_embedded_files();
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DocumentFormat;

    fn sample_pdf() -> Vec<u8> {
        concat!(
            "%PDF-1.4\n",
            "1 0 obj\n<< /Type /Catalog /Pages 2 0 R /Names << /EmbeddedFiles 7 0 R >> >>\nendobj\n",
            "2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n",
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /Annots [5 0 R] >>\nendobj\n",
            "4 0 obj\n<< /Title (Plan) /Author (Alice) /CreationDate (D:20240101000000Z) >>\nendobj\n",
            "5 0 obj\n<< /Type /Annot /Subtype /Text /Contents (note) >>\nendobj\n",
            "6 0 obj\n<< /Type /Filespec /F (data.xlsx) >>\nendobj\n",
            "7 0 obj\n<< /Names [(data.xlsx) 6 0 R] >>\nendobj\n",
            "trailer\n<< /Size 8 /Root 1 0 R /Info 4 0 R >>\nstartxref\n0\n%%EOF\n"
        )
        .as_bytes()
        .to_vec()
    }

    #[test]
    fn test_full_pdf_clean() {
        let mut doc = Document::open(&sample_pdf(), DocumentFormat::Pdf, "t.pdf").unwrap();
        let stats = super::super::clean(&mut doc, &CleanOptions::all(), &[]).unwrap();
        assert_eq!(stats.metadata_removed, 3);
        assert_eq!(stats.annotations_cleared, 1);
        assert_eq!(stats.attachments_removed, 1);

        let saved = doc.save().unwrap();
        let reopened = Document::open(&saved, DocumentFormat::Pdf, "t.pdf").unwrap();
        let pdf = reopened.pdf().unwrap();
        let entries = pdf.info_entries();
        assert!(entries.iter().all(|(k, _)| k == "ModDate"));
        assert!(pdf.page_annotations().iter().all(|a| a.is_empty()));
        assert!(pdf.embedded_file_names().is_empty());
    }

    #[test]
    fn test_clean_without_flags_is_noop() {
        let mut doc = Document::open(&sample_pdf(), DocumentFormat::Pdf, "t.pdf").unwrap();
        let stats = super::super::clean(&mut doc, &CleanOptions::none(), &[]).unwrap();
        assert_eq!(stats.metadata_removed, 0);
        assert_eq!(stats.annotations_cleared, 0);
        let pdf = doc.pdf().unwrap();
        assert!(pdf.info_entries().iter().any(|(k, _)| k == "Author"));
    }
}
