//! Integration tests for the analyze flow.

mod common;

use common::XlsxBuilder;
use docshield::{
    BusinessLevel, CancelToken, DocumentFormat, FindingCategory, Sanitizer, Severity,
};

fn sanitizer() -> Sanitizer {
    Sanitizer::with_proofreader(docshield::proofread::Proofreader::deterministic())
}

#[test]
fn author_leak_scenario() {
    let bytes = common::build_docx_with(
        "<w:p><w:r><w:t>quarterly plan</w:t></w:r></w:p>",
        &[
            (
                "docProps/core.xml",
                "<cp:coreProperties xmlns:cp=\"c\" xmlns:dc=\"d\"><dc:creator>Alice Smith</dc:creator></cp:coreProperties>",
            ),
            (
                "word/comments.xml",
                "<w:comments xmlns:w=\"w\"><w:comment w:id=\"1\" w:author=\"Bob\"><w:p><w:r><w:t>check numbers</w:t></w:r></w:p></w:comment></w:comments>",
            ),
        ],
    );
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Docx, "plan.docx", &CancelToken::new())
        .unwrap();

    let author = outcome
        .findings
        .iter()
        .find(|f| f.category == FindingCategory::Metadata && f.kind == "author")
        .expect("author finding");
    assert_eq!(author.severity, Severity::High);
    assert_eq!(author.value.as_deref(), Some("Alice Smith"));

    assert!(outcome
        .findings
        .iter()
        .any(|f| f.category == FindingCategory::Comments));
}

#[test]
fn hidden_sheet_with_external_formula() {
    let bytes = XlsxBuilder::new()
        .sheet("Visible", "<row r=\"1\"><c r=\"A1\"><v>1</v></c></row>")
        .hidden_sheet(
            "HiddenPrices",
            "<row r=\"1\"><c r=\"A1\"><f>[pricebook.xlsx]Sheet1!A1</f><v>99</v></c></row>",
            false,
        )
        .build();
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Xlsx, "book.xlsx", &CancelToken::new())
        .unwrap();

    let hidden = outcome
        .findings
        .iter()
        .find(|f| f.category == FindingCategory::HiddenSheets)
        .expect("hidden sheet finding");
    assert_eq!(hidden.value.as_deref(), Some("HiddenPrices"));

    let formula = outcome
        .findings
        .iter()
        .find(|f| f.category == FindingCategory::SensitiveFormulas)
        .expect("formula finding");
    assert_eq!(formula.severity, Severity::High);
    assert_eq!(formula.evidence.as_deref(), Some("External file reference"));

    // Hidden pricing sheet drives the margin category to high
    assert_eq!(
        outcome.business.category_levels["margin"],
        BusinessLevel::High
    );
    assert!(!outcome.business.client_ready);
}

#[test]
fn iban_and_credit_card_on_slide() {
    let bytes = common::build_pptx(&[
        "<p:sp><p:txBody><a:p><a:r><a:t>Please pay to DE89370400440532013000 via card 4111 1111 1111 1111.</a:t></a:r></a:p></p:txBody></p:sp>",
    ]);
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Pptx, "deck.pptx", &CancelToken::new())
        .unwrap();

    let iban = outcome
        .findings
        .iter()
        .find(|f| f.kind == "iban")
        .expect("iban finding");
    assert_eq!(iban.severity, Severity::Critical);
    assert_eq!(iban.value.as_deref(), Some("DE89 **** **** 3000"));

    let card = outcome
        .findings
        .iter()
        .find(|f| f.kind == "credit_card")
        .expect("card finding");
    assert_eq!(card.value.as_deref(), Some("**** **** **** 1111"));

    assert_eq!(
        outcome.business.category_levels["compliance"],
        BusinessLevel::Critical
    );
    assert!(!outcome.business.client_ready);
}

#[test]
fn delivery_over_commitment_scoring() {
    let bytes = common::build_docx(
        "<w:p><w:r><w:t>We will deliver by Friday, fixed price, all-inclusive.</w:t></w:r></w:p>",
    );
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Docx, "offer.docx", &CancelToken::new())
        .unwrap();
    assert_eq!(
        outcome.business.category_levels["delivery"],
        BusinessLevel::High
    );
    assert_eq!(outcome.business.business_risk_score, 81);
    assert!(!outcome.business.client_ready);
}

#[test]
fn macro_gate() {
    let bytes = XlsxBuilder::new()
        .sheet("Sheet1", "")
        .part("xl/vbaProject.bin", b"\xd0\xcf\x11\xe0 vba payload")
        .build();
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Xlsx, "book.xlsm.xlsx", &CancelToken::new())
        .unwrap();

    let macros: Vec<_> = outcome
        .findings
        .iter()
        .filter(|f| f.category == FindingCategory::Macros)
        .collect();
    assert_eq!(macros.len(), 1);
    assert_eq!(macros[0].severity, Severity::Critical);
    assert!(outcome.summary.risk_score <= 70);
}

#[test]
fn findings_ordered_and_summed() {
    let bytes = common::build_docx_with(
        "<w:p><w:r><w:t>text with alice@acme.com inside</w:t></w:r></w:p>",
        &[(
            "docProps/core.xml",
            "<cp:coreProperties xmlns:cp=\"c\" xmlns:dc=\"d\"><dc:creator>A</dc:creator><dc:title>T</dc:title></cp:coreProperties>",
        )],
    );
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Docx, "t.docx", &CancelToken::new())
        .unwrap();

    for window in outcome.findings.windows(2) {
        assert!(window[0].severity >= window[1].severity);
    }
    let s = &outcome.summary;
    assert_eq!(s.critical + s.high + s.medium + s.low, s.total_issues);
}

#[test]
fn pdf_analysis_metadata_and_attachments() {
    let bytes = common::build_pdf();
    let outcome = sanitizer()
        .analyze(&bytes, DocumentFormat::Pdf, "report.pdf", &CancelToken::new())
        .unwrap();

    assert!(outcome
        .findings
        .iter()
        .any(|f| f.category == FindingCategory::Metadata
            && f.kind == "author"
            && f.value.as_deref() == Some("Alice Smith")));
    assert!(outcome
        .findings
        .iter()
        .any(|f| f.category == FindingCategory::EmbeddedObjects
            && f.value.as_deref() == Some("budget.xlsx")));
    // Empty projection is tolerated
    assert!(outcome.projection.is_empty());
}

#[test]
fn analysis_is_deterministic() {
    let bytes = common::build_docx_with(
        "<w:p><w:r><w:t>pay DE89370400440532013000 today</w:t></w:r></w:p>",
        &[(
            "docProps/core.xml",
            "<cp:coreProperties xmlns:cp=\"c\" xmlns:dc=\"d\"><dc:creator>A</dc:creator></cp:coreProperties>",
        )],
    );
    let first = sanitizer()
        .analyze(&bytes, DocumentFormat::Docx, "t.docx", &CancelToken::new())
        .unwrap();
    let second = sanitizer()
        .analyze(&bytes, DocumentFormat::Docx, "t.docx", &CancelToken::new())
        .unwrap();
    let ids1: Vec<&str> = first.findings.iter().map(|f| f.id.as_str()).collect();
    let ids2: Vec<&str> = second.findings.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids1, ids2);
    assert_eq!(first.summary.risk_score, second.summary.risk_score);
}

#[test]
fn invalid_container_is_rejected() {
    let err = sanitizer()
        .analyze(b"not a zip at all", DocumentFormat::Docx, "x.docx", &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, docshield::Error::InvalidContainer(_)));
}
