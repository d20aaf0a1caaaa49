//! Plain-text renderer for terminals: header line, aligned breakdown table,
//! then the surplus sentence (or the warning when nothing was billed).

use std::fmt::Write as _;

use crate::ReportModel;

const HEADERS: [&str; 6] = ["rank", "weight", "count", "per person", "subtotal", "share"];

pub fn render_text(m: &ReportModel) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: total {}, rounding unit {}, preset {}",
        m.cover.title, m.cover.total_amount, m.cover.rounding_unit, m.cover.preset
    );

    if m.breakdown.rows.is_empty() {
        let _ = writeln!(out, "warning: {}", m.summary.message);
        push_notices(&mut out, m);
        return out;
    }

    let cells: Vec<[String; 6]> = m
        .breakdown
        .rows
        .iter()
        .map(|r| {
            [
                r.rank.clone(),
                r.weight.to_string(),
                r.count.to_string(),
                r.amount_per_person.to_string(),
                r.subtotal.to_string(),
                r.share_pct_1dp.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(c.len());
        }
    }

    out.push('\n');
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out.push('\n');

    let _ = writeln!(out, "collected: {}", m.summary.total_collected);
    let _ = writeln!(out, "{}", m.summary.message);
    push_notices(&mut out, m);
    out
}

/// First column left-aligned, the rest right-aligned, two spaces apart.
fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let mut line = String::new();
    for (i, (c, w)) in cells.iter().zip(widths.iter()).enumerate() {
        if i == 0 {
            let _ = write!(line, "{c:<w$}");
        } else {
            let _ = write!(line, "  {c:>w$}");
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn push_notices(out: &mut String, m: &ReportModel) {
    for n in &m.notices {
        let _ = writeln!(out, "note: {n}");
    }
}
