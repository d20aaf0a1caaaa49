//! Report JSON renderer (cover → breakdown → summary → notices → integrity).
//!
//! Object key order is the insertion order below; this crate enables
//! `serde_json`'s `preserve_order` feature for that.

use serde_json::{Map as JsonMap, Value};

use crate::{BreakdownRow, ReportError, ReportModel, SectionCover, SectionIntegrity, SectionSummary};

/// Build the top-level report object in fixed section order.
pub fn render_report_json(m: &ReportModel) -> Value {
    let mut root = obj();
    root.insert("cover".into(), cover_json(&m.cover));
    root.insert(
        "breakdown".into(),
        Value::Array(m.breakdown.rows.iter().map(row_json).collect()),
    );
    root.insert("headcount".into(), Value::from(m.breakdown.headcount));
    root.insert("summary".into(), summary_json(&m.summary));
    root.insert(
        "notices".into(),
        Value::Array(m.notices.iter().cloned().map(Value::String).collect()),
    );
    if let Some(i) = &m.integrity {
        root.insert("integrity".into(), integrity_json(i));
    }
    Value::Object(root)
}

/// Pretty-printed report text with a trailing newline.
pub fn render_json(m: &ReportModel) -> Result<String, ReportError> {
    let mut s = serde_json::to_string_pretty(&render_report_json(m))
        .map_err(|_| ReportError::Render("json_serialize"))?;
    s.push('\n');
    Ok(s)
}

/* ----------------------------- sections ----------------------------- */

fn cover_json(c: &SectionCover) -> Value {
    let mut o = obj();
    o.insert("title".into(), Value::String(c.title.clone()));
    o.insert("total_amount".into(), Value::from(c.total_amount));
    o.insert("rounding_unit".into(), Value::from(c.rounding_unit));
    o.insert("preset".into(), Value::String(c.preset.clone()));
    o.insert("status".into(), Value::String(c.status.clone()));
    Value::Object(o)
}

fn row_json(r: &BreakdownRow) -> Value {
    let mut o = obj();
    o.insert("rank".into(), Value::String(r.rank.clone()));
    o.insert("weight".into(), Value::from(r.weight));
    o.insert("count".into(), Value::from(r.count));
    o.insert("amount_per_person".into(), Value::from(r.amount_per_person));
    o.insert("subtotal".into(), Value::from(r.subtotal));
    o.insert("share".into(), Value::String(r.share_pct_1dp.clone()));
    Value::Object(o)
}

fn summary_json(s: &SectionSummary) -> Value {
    let mut o = obj();
    o.insert("total_weight".into(), Value::from(s.total_weight));
    o.insert("total_collected".into(), Value::from(s.total_collected));
    o.insert("organizer_surplus".into(), Value::from(s.organizer_surplus));
    o.insert("message".into(), Value::String(s.message.clone()));
    Value::Object(o)
}

fn integrity_json(i: &SectionIntegrity) -> Value {
    let mut o = obj();
    o.insert("result_id".into(), Value::String(i.result_id.clone()));
    o.insert("run_id".into(), Value::String(i.run_id.clone()));
    o.insert("timestamp_utc".into(), Value::String(i.timestamp_utc.clone()));
    o.insert("engine".into(), Value::String(i.engine.clone()));
    Value::Object(o)
}

#[inline]
fn obj() -> JsonMap<String, Value> {
    JsonMap::new()
}
