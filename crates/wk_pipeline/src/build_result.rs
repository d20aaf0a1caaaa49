//! build_result.rs
//! Assemble the idless result payload → canonical bytes → sha256,
//! form "RES:<sha256>", self-verify, and return the `ResultDoc`.

use serde::{Deserialize, Serialize};

use wk_core::WeightTable;
use wk_io::{canonical_json::to_canonical_bytes, hasher::res_id_from_canonical};

use crate::allocate::Outcome;
use crate::load::ResolvedInputs;
use crate::validate::ValidationReport;
use crate::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Allocated,
    ZeroWeight,
}

/// One billed rank, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub rank: String,
    pub weight: u32,
    pub amount_per_person: u64,
    pub count: u32,
    pub subtotal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDoc {
    pub id: String,                 // "RES:<hex64>"
    pub status: ResultStatus,
    pub total_amount: u64,
    pub rounding_unit: u64,
    pub preset: String,
    pub weights: WeightTable,       // effective weights (preset + overrides)
    pub total_weight: u64,
    pub rows: Vec<ResultRow>,
    pub total_collected: u64,
    pub organizer_surplus: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,         // validation warnings echoed for display
}

#[derive(Serialize)]
struct ResultNoId<'a> {
    status: ResultStatus,
    total_amount: u64,
    rounding_unit: u64,
    preset: &'a str,
    weights: &'a WeightTable,
    total_weight: u64,
    rows: &'a [ResultRow],
    total_collected: u64,
    organizer_surplus: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    notes: &'a [String],
}

/// Build the canonical result document.
pub fn build_result(
    inp: &ResolvedInputs,
    outcome: &Outcome,
    validation: &ValidationReport,
) -> Result<ResultDoc, PipelineError> {
    let (status, rows, total_weight, total_collected, organizer_surplus, warning) = match outcome {
        Outcome::Allocated(a) => {
            let rows = a
                .shares
                .iter()
                .map(|s| ResultRow {
                    rank: s.rank.to_string(),
                    weight: inp.weights.get(&s.rank).unwrap_or(0),
                    amount_per_person: s.amount_per_person,
                    count: s.count,
                    subtotal: s.subtotal(),
                })
                .collect::<Vec<_>>();
            let tw = u64::try_from(a.total_weight)
                .map_err(|_| PipelineError::Build("total weight exceeds u64".into()))?;
            (ResultStatus::Allocated, rows, tw, a.total_collected, a.organizer_surplus, None)
        }
        Outcome::Warning(msg) => (ResultStatus::ZeroWeight, Vec::new(), 0, 0, 0, Some(msg.clone())),
    };

    let notes: Vec<String> = validation.warnings().map(|i| i.message.clone()).collect();

    let noid = ResultNoId {
        status,
        total_amount: inp.total_amount,
        rounding_unit: inp.rounding_unit.get(),
        preset: &inp.preset,
        weights: &inp.weights,
        total_weight,
        rows: &rows,
        total_collected,
        organizer_surplus,
        warning: warning.as_deref(),
        notes: &notes,
    };

    let id = res_id_from_canonical(&noid).map_err(|e| PipelineError::Build(format!("result id: {e}")))?;

    let doc = ResultDoc {
        id,
        status,
        total_amount: inp.total_amount,
        rounding_unit: inp.rounding_unit.get(),
        preset: inp.preset.clone(),
        weights: inp.weights.clone(),
        total_weight,
        rows,
        total_collected,
        organizer_surplus,
        warning,
        notes,
    };

    // Self-verify: the id must hash the same fields as the finished doc.
    let mut check = serde_json::to_value(&doc).map_err(|e| PipelineError::Build(e.to_string()))?;
    if let Some(obj) = check.as_object_mut() {
        obj.remove("id");
    }
    let recomputed = res_id_from_canonical(&check).map_err(|e| PipelineError::Build(format!("result id: {e}")))?;
    if recomputed != doc.id {
        return Err(PipelineError::Build("result id does not match canonical bytes".into()));
    }

    Ok(doc)
}

/// Canonical bytes of a finalized result (for writing/tests).
pub fn result_canonical_bytes(doc: &ResultDoc) -> Result<Vec<u8>, PipelineError> {
    to_canonical_bytes(doc).map_err(|e| PipelineError::Build(format!("canonicalize result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{allocate::allocate, load::resolve, validate::validate};
    use wk_core::variables::Params;
    use wk_io::loader::parse_request;

    fn build(json: &str) -> ResultDoc {
        let params = Params::default();
        let inp = resolve(&params, &parse_request(json).unwrap()).unwrap();
        let rep = validate(&params, &inp);
        let out = allocate(&inp).unwrap();
        build_result(&inp, &out, &rep).unwrap()
    }

    #[test]
    fn allocated_result_has_rows_and_id() {
        let doc = build(r#"{"total_amount":10000,"counts":{"GM":1,"M":1}}"#);
        assert_eq!(doc.status, ResultStatus::Allocated);
        assert!(doc.id.starts_with("RES:") && doc.id.len() == 68);
        assert_eq!(doc.total_weight, 35);
        assert_eq!(doc.rows[0], ResultRow { rank: "GM".into(), weight: 20, amount_per_person: 5800, count: 1, subtotal: 5800 });
        assert_eq!(doc.rows[1].amount_per_person, 4300);
        assert_eq!(doc.organizer_surplus, 100);
        assert_eq!(doc.warning, None);
    }

    #[test]
    fn id_is_deterministic_and_input_sensitive() {
        let a = build(r#"{"total_amount":10000,"counts":{"GM":1,"M":1}}"#);
        let b = build(r#"{"counts":{"M":1,"GM":1},"total_amount":10000}"#);
        let c = build(r#"{"total_amount":10100,"counts":{"GM":1,"M":1}}"#);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn id_hashes_the_document_without_its_id() {
        let doc = build(r#"{"total_amount":7300,"counts":{"PM":2,"T":3}}"#);
        let mut v = serde_json::to_value(&doc).unwrap();
        v.as_object_mut().unwrap().remove("id");
        assert_eq!(res_id_from_canonical(&v).unwrap(), doc.id);
    }

    #[test]
    fn zero_weight_result_carries_warning() {
        let doc = build(r#"{"total_amount":10000,"counts":{}}"#);
        assert_eq!(doc.status, ResultStatus::ZeroWeight);
        assert!(doc.rows.is_empty());
        assert_eq!(doc.organizer_surplus, 0);
        assert_eq!(doc.warning.as_deref(), Some("total weight is 0; set participant counts"));
    }

    #[test]
    fn validation_warnings_become_notes() {
        let doc = build(r#"{"total_amount":1050,"counts":{"T":1}}"#);
        assert_eq!(doc.notes, vec!["total amount 1050 is not a multiple of 100".to_string()]);
    }

    #[test]
    fn canonical_bytes_sort_keys() {
        let doc = build(r#"{"total_amount":0,"counts":{"T":1}}"#);
        let s = String::from_utf8(result_canonical_bytes(&doc).unwrap()).unwrap();
        assert!(s.starts_with(r#"{"id":"RES:"#));
    }
}
