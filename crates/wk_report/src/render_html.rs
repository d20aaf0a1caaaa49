//! Deterministic, offline HTML renderer.
//!
//! One standalone page: cover line, escaped breakdown table, a CSS bar chart
//! of per-person amounts, and the summary sentence. No external assets.

use std::fmt::Write as _;

use crate::ReportModel;

// ------------------------- formatting helpers -------------------------

/// Escape text for HTML (minimal, deterministic).
fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Group digits with a narrow no-break space (U+202F), e.g. `10 100`.
fn fmt_int(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() * 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{202F}');
        }
        out.push(ch);
    }
    out
}

// ------------------------- HTML builder -------------------------

struct HtmlBuilder {
    buf: String,
}

impl HtmlBuilder {
    fn new() -> Self {
        Self { buf: String::with_capacity(8 * 1024) }
    }

    fn start(&mut self, title: &str) {
        let _ = write!(
            self.buf,
            "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
             <title>{}</title>\
             <style>\
             body{{font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,Arial,sans-serif;margin:24px;}}\
             h1,h2,h3{{margin:0.2em 0;}}\
             .muted{{opacity:0.8}}\
             .warn{{color:#a33;font-weight:bold}}\
             table{{border-collapse:collapse}}\
             td,th{{padding:4px 8px;border-bottom:1px solid #ddd;text-align:right}}\
             td:first-child,th:first-child{{text-align:left}}\
             .chart{{margin-top:16px;max-width:480px}}\
             .bar-row{{display:flex;align-items:center;gap:8px;margin:4px 0}}\
             .bar-label{{width:4em}}\
             .bar{{background:#4a7;height:14px}}\
             </style></head><body>",
            esc(title)
        );
    }

    fn finish(mut self) -> String {
        self.buf.push_str("</body></html>");
        self.buf
    }

    fn section_cover(&mut self, m: &ReportModel) {
        let _ = write!(
            self.buf,
            "<h1>{}</h1><p class=\"muted\">Total {} · rounding unit {} · preset {}</p>",
            esc(&m.cover.title),
            fmt_int(m.cover.total_amount),
            m.cover.rounding_unit,
            esc(&m.cover.preset)
        );
    }

    fn section_table(&mut self, m: &ReportModel) {
        self.buf.push_str(
            "<h3>Breakdown</h3><table><thead><tr>\
             <th>Rank</th><th>Weight</th><th>Count</th><th>Per person</th><th>Subtotal</th><th>Share</th>\
             </tr></thead><tbody>",
        );
        for r in &m.breakdown.rows {
            let _ = write!(
                self.buf,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                esc(&r.rank),
                r.weight,
                r.count,
                fmt_int(r.amount_per_person),
                fmt_int(r.subtotal),
                esc(&r.share_pct_1dp)
            );
        }
        self.buf.push_str("</tbody></table>");
    }

    fn section_chart(&mut self, m: &ReportModel) {
        self.buf.push_str("<div class=\"chart\">");
        for r in &m.breakdown.rows {
            let _ = write!(
                self.buf,
                "<div class=\"bar-row\"><span class=\"bar-label\">{}</span>\
                 <div class=\"bar\" style=\"width:{}%\"></div><span>{}</span></div>",
                esc(&r.rank),
                r.bar_pct,
                fmt_int(r.amount_per_person)
            );
        }
        self.buf.push_str("</div>");
    }

    fn section_summary(&mut self, m: &ReportModel) {
        if m.breakdown.rows.is_empty() {
            let _ = write!(self.buf, "<p class=\"warn\">{}</p>", esc(&m.summary.message));
        } else {
            let _ = write!(
                self.buf,
                "<h3>Summary</h3><p>Collected: {}</p><p>{}</p>",
                fmt_int(m.summary.total_collected),
                esc(&m.summary.message)
            );
        }
        if !m.notices.is_empty() {
            self.buf.push_str("<ul class=\"muted\">");
            for n in &m.notices {
                let _ = write!(self.buf, "<li>{}</li>", esc(n));
            }
            self.buf.push_str("</ul>");
        }
    }

    fn section_integrity(&mut self, m: &ReportModel) {
        if let Some(i) = &m.integrity {
            let _ = write!(
                self.buf,
                "<h3>Integrity</h3><p class=\"muted\">Result: {}<br>Run: {}<br>Engine: {}<br>Timestamp: {}</p>",
                esc(&i.result_id),
                esc(&i.run_id),
                esc(&i.engine),
                esc(&i.timestamp_utc)
            );
        }
    }
}

/// Render the whole report as a standalone HTML page.
pub fn render_html(m: &ReportModel) -> String {
    let mut b = HtmlBuilder::new();
    b.start(&m.cover.title);
    b.section_cover(m);
    if !m.breakdown.rows.is_empty() {
        b.section_table(m);
        b.section_chart(m);
    }
    b.section_summary(m);
    b.section_integrity(m);
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_model;
    use crate::testutil::{run, DINNER};

    #[test]
    fn escapes_and_groups_digits() {
        assert_eq!(esc("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#x27;");
        assert_eq!(fmt_int(0), "0");
        assert_eq!(fmt_int(999), "999");
        assert_eq!(fmt_int(10100), "10\u{202F}100");
        assert_eq!(fmt_int(1234567), "1\u{202F}234\u{202F}567");
    }

    #[test]
    fn page_has_table_and_bars() {
        let out = run(DINNER);
        let m = build_model(&out.result).unwrap().with_run(&out.run_record);
        let html = render_html(&m);
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.ends_with("</body></html>"));
        assert!(html.contains("<td>GM</td><td>20</td><td>1</td><td>5\u{202F}800</td>"));
        assert!(html.contains("style=\"width:100%\""));
        assert!(html.contains("style=\"width:74%\""));
        assert!(html.contains("organizer surplus (rounding excess): 100"));
        assert!(html.contains(&out.run_record.id));
    }

    #[test]
    fn rank_names_are_escaped() {
        let mut m = build_model(&run(DINNER).result).unwrap();
        m.breakdown.rows[0].rank = "<GM>".into();
        let html = render_html(&m);
        assert!(html.contains("&lt;GM&gt;"));
        assert!(!html.contains("<GM>"));
    }

    #[test]
    fn zero_weight_page_shows_warning() {
        let m = build_model(&run(r#"{"total_amount":100,"counts":{}}"#).result).unwrap();
        let html = render_html(&m);
        assert!(html.contains("<p class=\"warn\">total weight is 0; set participant counts</p>"));
        assert!(!html.contains("<table>"));
    }
}
