//! Self-contained HTML report.
//!
//! No external assets: styling is inlined, everything renders offline.

use super::Report;
use crate::findings::Severity;

/// Escape text for HTML element content.
fn esc(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "#c0392b",
        Severity::High => "#e67e22",
        Severity::Medium => "#f1c40f",
        Severity::Low => "#7f8c8d",
    }
}

/// Render a report as a standalone HTML page.
pub fn render(report: &Report) -> String {
    let mut out = String::with_capacity(16 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>Sanitization report — {}</title>\n",
        esc(&report.meta.original_name)
    ));
    out.push_str(
        "<style>\n\
         body { font-family: -apple-system, 'Segoe UI', sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }\n\
         h1 { font-size: 1.5rem; } h2 { font-size: 1.2rem; margin-top: 2rem; }\n\
         table { border-collapse: collapse; width: 100%; }\n\
         th, td { text-align: left; padding: 0.35rem 0.6rem; border-bottom: 1px solid #ddd; font-size: 0.9rem; }\n\
         .score { font-size: 2.5rem; font-weight: 700; }\n\
         .badge { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 0.5rem; color: #fff; font-size: 0.8rem; }\n\
         .muted { color: #888; font-size: 0.85rem; }\n\
         .verdict-no { color: #c0392b; font-weight: 700; }\n\
         .verdict-yes { color: #27ae60; font-weight: 700; }\n\
         </style>\n</head>\n<body>\n",
    );

    out.push_str(&format!(
        "<h1>Sanitization report — {}</h1>\n<p class=\"muted\">{} · generated {} · {} ms</p>\n",
        esc(&report.meta.original_name),
        esc(&report.meta.format),
        esc(&report.meta.generated_at),
        report.meta.processing_time_ms
    ));

    // Scores
    out.push_str("<h2>Technical risk</h2>\n");
    match report.score_after {
        Some(after) => out.push_str(&format!(
            "<p><span class=\"score\">{}</span> <span class=\"muted\">after cleaning (was {})</span></p>\n",
            after, report.score_before
        )),
        None => out.push_str(&format!(
            "<p><span class=\"score\">{}</span> <span class=\"muted\">/ 100 ({:?})</span></p>\n",
            report.score_before, report.summary.risk_level
        )),
    }

    // Checklist
    out.push_str("<h2>Checklist</h2>\n<table>\n<tr><th>Area</th><th>Status</th><th>Findings</th><th>Worst severity</th></tr>\n");
    for item in &report.qualion_clean_v1.part1.checklist {
        let severity = item
            .severity
            .map(|s| {
                format!(
                    "<span class=\"badge\" style=\"background:{}\">{}</span>",
                    severity_color(s),
                    s
                )
            })
            .unwrap_or_else(|| "—".to_string());
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&item.area),
            esc(&item.status),
            item.count,
            severity
        ));
    }
    out.push_str("</table>\n");

    // Findings detail (non-empty categories only)
    out.push_str("<h2>Findings</h2>\n<table>\n<tr><th>Category</th><th>Type</th><th>Severity</th><th>Location</th><th>Value</th></tr>\n");
    let mut any = false;
    for (category, findings) in &report.detections {
        for finding in findings {
            any = true;
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td><span class=\"badge\" style=\"background:{}\">{}</span></td><td>{}</td><td>{}</td></tr>\n",
                esc(category),
                esc(&finding.kind),
                severity_color(finding.severity),
                finding.severity,
                esc(&finding.location),
                esc(finding.value.as_deref().unwrap_or("")),
            ));
        }
    }
    if !any {
        out.push_str("<tr><td colspan=\"5\" class=\"muted\">No findings.</td></tr>\n");
    }
    out.push_str("</table>\n");

    // Business risk
    let business = &report.qualion_clean_v1.part2;
    let verdict_class = if business.risk.client_ready {
        "verdict-yes"
    } else {
        "verdict-no"
    };
    out.push_str(&format!(
        "<h2>Business risk</h2>\n<p>Score {} / 100 — client ready: <span class=\"{}\">{}</span></p>\n",
        business.risk.business_risk_score,
        verdict_class,
        esc(&business.client_ready_verdict)
    ));
    if !business.risk.flags.is_empty() {
        out.push_str("<table>\n<tr><th>Category</th><th>Level</th><th>Reason</th><th>Evidence</th></tr>\n");
        for flag in &business.risk.flags {
            out.push_str(&format!(
                "<tr><td>{:?}</td><td>{:?}</td><td>{}</td><td class=\"muted\">{}</td></tr>\n",
                flag.category,
                flag.level,
                esc(&flag.reason),
                esc(&flag.evidence)
            ));
        }
        out.push_str("</table>\n");
    }

    // Cleaning / correction stats
    if let Some(cleaning) = &report.cleaning_stats {
        out.push_str("<h2>Cleaning</h2>\n<table>\n");
        for (label, value) in [
            ("Metadata removed", cleaning.metadata_removed),
            ("Comments removed", cleaning.comments_removed),
            ("Tracked changes accepted", cleaning.track_changes_accepted),
            ("Hidden items removed", cleaning.hidden_removed),
            ("Embedded objects removed", cleaning.embedded_removed),
            ("Macros removed", cleaning.macros_removed),
            ("Drawings removed", cleaning.drawings_removed),
            ("Formulas flattened", cleaning.formulas_flattened),
            ("Values redacted", cleaning.redactions_applied),
            ("Annotations cleared", cleaning.annotations_cleared),
            ("Attachments removed", cleaning.attachments_removed),
        ] {
            if value > 0 {
                out.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", label, value));
            }
        }
        out.push_str("</table>\n");
    }
    if let Some(corrections) = &report.correction_stats {
        out.push_str(&format!(
            "<h2>Corrections</h2>\n<p class=\"muted\">{} applied, {} skipped, {} text nodes changed</p>\n",
            corrections.applied, corrections.skipped, corrections.nodes_changed
        ));
        if !corrections.examples.is_empty() {
            out.push_str("<table>\n<tr><th>Before</th><th>After</th></tr>\n");
            for example in &corrections.examples {
                out.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    esc(&example.before),
                    esc(&example.after)
                ));
            }
            out.push_str("</table>\n");
        }
    }

    out.push_str(&format!(
        "<p class=\"muted\">{}</p>\n",
        esc(&report.qualion_clean_v1.file_type_context)
    ));
    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::DocumentFormat;
    use crate::extract::TextProjection;
    use crate::findings::{Finding, FindingCategory};
    use crate::report::{assemble, DocumentStats, ReportInputs};
    use crate::risk;
    use crate::risk::scorer;

    #[test]
    fn test_render_is_self_contained() {
        let findings = vec![Finding::new(
            FindingCategory::Metadata,
            "author",
            Severity::High,
            "docProps/core.xml",
        )
        .with_value("Alice <Smith>")];
        let summary = scorer::score(&findings);
        let business = risk::evaluate(&findings, &TextProjection::default());
        let report = assemble(ReportInputs {
            document_id: "d",
            original_name: "plan & notes.docx",
            format: DocumentFormat::Docx,
            findings: &findings,
            summary: &summary,
            spelling: &[],
            business: &business,
            stats: DocumentStats::default(),
            stats_after: None,
            summary_after: None,
            cleaning: None,
            corrections: None,
            processing_time_ms: 3,
            proofread_degraded: false,
        });
        let html = render(&report);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("plan &amp; notes.docx"));
        assert!(html.contains("Alice &lt;Smith&gt;"));
        // No external assets
        assert!(!html.contains("http://"));
        assert!(!html.contains("https://"));
        assert!(!html.contains("src="));
    }
}
