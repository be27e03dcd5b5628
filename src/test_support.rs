//! In-memory builders for synthetic test documents.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

fn write_zip(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (path, content) in parts {
        writer.start_file(path.as_str(), options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A DOCX containing the given `<w:body>` XML.
pub fn build_docx(body: &str) -> Vec<u8> {
    build_docx_with(body, &[])
}

/// A DOCX with the given body plus extra parts.
pub fn build_docx_with(body: &str, extra: &[(&str, &str)]) -> Vec<u8> {
    let mut parts = vec![
        (
            "[Content_Types].xml".to_string(),
            format!(
                "<?xml version=\"1.0\"?><Types xmlns=\"{}\">\
                 <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
                 <Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
                 </Types>",
                CT_NS
            )
            .into_bytes(),
        ),
        (
            "_rels/.rels".to_string(),
            b"<?xml version=\"1.0\"?><Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
              <Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
              </Relationships>".to_vec(),
        ),
        (
            "word/document.xml".to_string(),
            format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"{}\"><w:body>{}</w:body></w:document>",
                W_NS, body
            )
            .into_bytes(),
        ),
    ];
    for (path, content) in extra {
        parts.push((path.to_string(), content.as_bytes().to_vec()));
    }
    write_zip(&parts)
}

/// A PPTX whose slides hold the given `<p:spTree>` children.
pub fn build_pptx(slides: &[&str]) -> Vec<u8> {
    build_pptx_with(slides, &[])
}

/// A PPTX with slides plus extra parts.
pub fn build_pptx_with(slides: &[&str], extra: &[(&str, &str)]) -> Vec<u8> {
    let mut parts = vec![(
        "[Content_Types].xml".to_string(),
        format!(
            "<?xml version=\"1.0\"?><Types xmlns=\"{}\">\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             </Types>",
            CT_NS
        )
        .into_bytes(),
    )];
    for (i, body) in slides.iter().enumerate() {
        parts.push((
            format!("ppt/slides/slide{}.xml", i + 1),
            format!(
                "<?xml version=\"1.0\"?>\
                 <p:sld xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" \
                 xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">\
                 <p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>",
                body
            )
            .into_bytes(),
        ));
    }
    for (path, content) in extra {
        parts.push((path.to_string(), content.as_bytes().to_vec()));
    }
    write_zip(&parts)
}

/// Builder for synthetic XLSX workbooks.
#[derive(Default)]
pub struct XlsxBuilder {
    shared: Option<Vec<String>>,
    sheets: Vec<(String, String, Option<&'static str>)>,
    extra: Vec<(String, Vec<u8>)>,
}

impl XlsxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a visible sheet with the given `<sheetData>` children.
    pub fn sheet(mut self, name: &str, sheet_data: &str) -> Self {
        self.sheets.push((name.to_string(), sheet_data.to_string(), None));
        self
    }

    /// Add a hidden (or very-hidden) sheet.
    pub fn hidden_sheet(mut self, name: &str, sheet_data: &str, very: bool) -> Self {
        let state = if very { "veryHidden" } else { "hidden" };
        self.sheets
            .push((name.to_string(), sheet_data.to_string(), Some(state)));
        self
    }

    /// Populate `xl/sharedStrings.xml`.
    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared = Some(strings.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Add an arbitrary extra part.
    pub fn part(mut self, path: &str, content: &[u8]) -> Self {
        self.extra.push((path.to_string(), content.to_vec()));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if self.sheets.is_empty() {
            self.sheets.push(("Sheet1".to_string(), String::new(), None));
        }
        let mut parts = vec![(
            "[Content_Types].xml".to_string(),
            format!(
                "<?xml version=\"1.0\"?><Types xmlns=\"{}\">\
                 <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
                 </Types>",
                CT_NS
            )
            .into_bytes(),
        )];

        let mut sheet_entries = String::new();
        let mut rel_entries = String::new();
        for (i, (name, data, state)) in self.sheets.iter().enumerate() {
            let idx = i + 1;
            let state_attr = state
                .map(|s| format!(" state=\"{}\"", s))
                .unwrap_or_default();
            sheet_entries.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"{}/>",
                name, idx, idx, state_attr
            ));
            rel_entries.push_str(&format!(
                "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
                idx, idx
            ));
            parts.push((
                format!("xl/worksheets/sheet{}.xml", idx),
                format!(
                    "<?xml version=\"1.0\"?>\
                     <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
                     <sheetData>{}</sheetData></worksheet>",
                    data
                )
                .into_bytes(),
            ));
        }
        parts.push((
            "xl/workbook.xml".to_string(),
            format!(
                "<?xml version=\"1.0\"?>\
                 <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
                 xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
                 <sheets>{}</sheets></workbook>",
                sheet_entries
            )
            .into_bytes(),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                "<?xml version=\"1.0\"?><Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}</Relationships>",
                rel_entries
            )
            .into_bytes(),
        ));
        if let Some(strings) = &self.shared {
            let items: String = strings
                .iter()
                .map(|s| format!("<si><t>{}</t></si>", s))
                .collect();
            parts.push((
                "xl/sharedStrings.xml".to_string(),
                format!(
                    "<?xml version=\"1.0\"?><sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{}\" uniqueCount=\"{}\">{}</sst>",
                    strings.len(),
                    strings.len(),
                    items
                )
                .into_bytes(),
            ));
        }
        parts.extend(self.extra);
        write_zip(&parts)
    }
}
