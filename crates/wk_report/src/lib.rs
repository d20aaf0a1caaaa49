//! wk_report — pure offline report model + renderers (text/JSON/HTML).
//!
//! Determinism rules:
//! - No I/O here. Callers hand in the finished `ResultDoc` (and optionally the
//!   run record).
//! - Percent strings use one-decimal formatting without float arithmetic.
//! - Stable section order and field names.

#![deny(unsafe_code)]

use wk_core::rounding::{format_tenths_pct, percent_one_decimal_tenths};
use wk_pipeline::{ResultDoc, ResultStatus, RunRecordDoc};

#[cfg(feature = "render_html")]
pub mod render_html;
#[cfg(feature = "render_json")]
pub mod render_json;
pub mod render_text;

pub const REPORT_TITLE: &str = "Warikan split";

// ===== Errors =====
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The result's totals do not add up.
    Inconsistent(String),
    Render(&'static str),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Inconsistent(m) => write!(f, "inconsistent result: {m}"),
            ReportError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportModel {
    pub cover: SectionCover,
    pub breakdown: SectionBreakdown,
    pub summary: SectionSummary,
    pub notices: Vec<String>,
    pub integrity: Option<SectionIntegrity>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionCover {
    pub title: String,
    pub total_amount: u64,
    pub rounding_unit: u64,
    pub preset: String,
    pub status: String,               // "allocated" | "zero_weight"
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BreakdownRow {
    pub rank: String,
    pub weight: u32,
    pub count: u32,
    pub amount_per_person: u64,
    pub subtotal: u64,
    /// Share of the collected total, e.g. "57.4%".
    pub share_pct_1dp: String,
    /// Bar length in whole percent of the largest per-person amount.
    pub bar_pct: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionBreakdown {
    pub rows: Vec<BreakdownRow>,
    pub headcount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSummary {
    pub total_weight: u64,
    pub total_collected: u64,
    pub organizer_surplus: u64,
    /// Surplus sentence, or the warning when nothing was billed.
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionIntegrity {
    pub result_id: String,
    pub run_id: String,
    pub timestamp_utc: String,
    pub engine: String,
}

impl ReportModel {
    /// Attach run provenance (ids, engine, timestamp).
    pub fn with_run(mut self, run: &RunRecordDoc) -> Self {
        self.integrity = Some(SectionIntegrity {
            result_id: run.outputs.result_id.clone(),
            run_id: run.id.clone(),
            timestamp_utc: run.timestamp_utc.clone(),
            engine: format!(
                "{}/{} v{} ({})",
                run.engine.vendor, run.engine.name, run.engine.version, run.engine.build
            ),
        });
        self
    }
}

/// Summary line shown under the table.
pub fn surplus_message(surplus: u64) -> String {
    format!("organizer surplus (rounding excess): {surplus}")
}

// ===== API =====

/// Build the report model from a result (pure, offline).
///
/// Totals are cross-checked against the rows; a result that does not add up
/// is rejected rather than rendered.
pub fn build_model(result: &ResultDoc) -> Result<ReportModel, ReportError> {
    let status = match result.status {
        ResultStatus::Allocated => "allocated",
        ResultStatus::ZeroWeight => "zero_weight",
    };

    let cover = SectionCover {
        title: REPORT_TITLE.to_string(),
        total_amount: result.total_amount,
        rounding_unit: result.rounding_unit,
        preset: result.preset.clone(),
        status: status.to_string(),
    };

    check_totals(result)?;

    let max_amount = result.rows.iter().map(|r| r.amount_per_person).max().unwrap_or(0);
    let rows = result
        .rows
        .iter()
        .map(|r| BreakdownRow {
            rank: r.rank.clone(),
            weight: r.weight,
            count: r.count,
            amount_per_person: r.amount_per_person,
            subtotal: r.subtotal,
            share_pct_1dp: format_tenths_pct(percent_one_decimal_tenths(
                r.subtotal as u128,
                result.total_collected as u128,
            )),
            bar_pct: bar_pct(r.amount_per_person, max_amount),
        })
        .collect::<Vec<_>>();
    let headcount = result.rows.iter().map(|r| r.count as u64).sum();

    let message = match (&result.status, &result.warning) {
        (ResultStatus::ZeroWeight, Some(w)) => w.clone(),
        (ResultStatus::ZeroWeight, None) => {
            return Err(ReportError::Inconsistent("zero_weight result without warning".into()))
        }
        (ResultStatus::Allocated, _) => surplus_message(result.organizer_surplus),
    };

    let mut notices = result.notes.clone();
    if let Some(w) = &result.warning {
        if result.status == ResultStatus::Allocated {
            notices.push(w.clone());
        }
    }

    Ok(ReportModel {
        cover,
        breakdown: SectionBreakdown { rows, headcount },
        summary: SectionSummary {
            total_weight: result.total_weight,
            total_collected: result.total_collected,
            organizer_surplus: result.organizer_surplus,
            message,
        },
        notices,
        integrity: None,
    })
}

// ===== Helpers (pure; no floats) =====

fn check_totals(result: &ResultDoc) -> Result<(), ReportError> {
    let mut collected: u64 = 0;
    for row in &result.rows {
        let expect = row.amount_per_person.checked_mul(row.count as u64);
        if expect != Some(row.subtotal) {
            return Err(ReportError::Inconsistent(format!("subtotal for {}", row.rank)));
        }
        collected = collected
            .checked_add(row.subtotal)
            .ok_or_else(|| ReportError::Inconsistent("collected overflows".into()))?;
    }
    if collected != result.total_collected {
        return Err(ReportError::Inconsistent(format!(
            "rows sum to {collected}, total_collected is {}",
            result.total_collected
        )));
    }
    if result.status == ResultStatus::Allocated
        && result.total_collected.checked_sub(result.total_amount) != Some(result.organizer_surplus)
    {
        return Err(ReportError::Inconsistent("surplus != collected - total".into()));
    }
    Ok(())
}

fn bar_pct(amount: u64, max: u64) -> u32 {
    if max == 0 {
        return 0;
    }
    // amount <= max, so the quotient is at most 100
    ((amount as u128 * 100) / max as u128) as u32
}

#[cfg(test)]
pub(crate) mod testutil {
    use wk_core::variables::Params;
    use wk_io::loader::parse_request;
    use wk_pipeline::{engine_identifiers, run_request, PipelineCtx, PipelineOutputs};

    pub fn run(json: &str) -> PipelineOutputs {
        let ctx = PipelineCtx {
            params: Params::default(),
            engine_meta: engine_identifiers(),
            timestamp_utc: "2026-10-18T19:00:00Z".to_string(),
        };
        run_request(&ctx, &parse_request(json).unwrap()).unwrap()
    }

    pub const DINNER: &str = r#"{"total_amount":10000,"counts":{"GM":1,"M":1}}"#;
}
