//! LOAD stage: resolve a wire request against the parameter set.
//!
//! - weights = preset (request `preset`, else `default_preset`) overlaid with
//!   the request's per-rank overrides
//! - rounding unit = request value, else the parameter-set default
//! - counts are re-ordered to roster order; ranks outside the roster follow
//!   in request order

use wk_core::{
    variables::Params,
    ParticipantCounts, RoundingUnit, WeightTable,
};
use wk_io::loader::BillRequest;

use crate::PipelineError;

/// Request after preset/default resolution; input to VALIDATE and ALLOCATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub total_amount: u64,
    pub counts: ParticipantCounts,
    pub weights: WeightTable,
    /// Ranks whose weight came from the request rather than the preset.
    pub overridden: WeightTable,
    pub preset: String,
    pub rounding_unit: RoundingUnit,
}

pub fn resolve(params: &Params, req: &BillRequest) -> Result<ResolvedInputs, PipelineError> {
    let preset = req.preset.clone().unwrap_or_else(|| params.default_preset.clone());
    let base = params
        .preset(&preset)
        .map_err(|e| PipelineError::Validate(e.to_string()))?;

    let mut counts = ParticipantCounts::new();
    for rank in &params.roster {
        if let Some(c) = req.counts.get(rank) {
            counts.set(rank.clone(), c);
        }
    }
    for (rank, c) in req.counts.iter() {
        if !params.roster.contains(rank) {
            counts.set(rank.clone(), c);
        }
    }

    Ok(ResolvedInputs {
        total_amount: req.total_amount,
        counts,
        weights: base.overlay(&req.weights),
        overridden: req.weights.clone(),
        preset,
        rounding_unit: req.rounding_unit.unwrap_or(params.rounding_unit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wk_core::RankId;
    use wk_io::loader::parse_request;

    fn r(s: &str) -> RankId { s.parse().unwrap() }

    #[test]
    fn default_preset_and_unit_apply() {
        let req = parse_request(r#"{"total_amount":10000,"counts":{"M":1,"GM":1}}"#).unwrap();
        let res = resolve(&Params::default(), &req).unwrap();
        assert_eq!(res.preset, "standard");
        assert_eq!(res.rounding_unit, RoundingUnit::HUNDRED);
        assert_eq!(res.weights.get(&r("GM")), Some(20));
        let order: Vec<&str> = res.counts.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, vec!["GM", "M"], "roster order wins over request order");
    }

    #[test]
    fn overrides_and_preset_choice_apply() {
        let req = parse_request(
            r#"{"total_amount":1000,"counts":{"X":2,"T":1},"preset":"classic","weights":{"T":9,"X":4},"rounding_unit":10}"#,
        )
        .unwrap();
        let res = resolve(&Params::default(), &req).unwrap();
        assert_eq!(res.preset, "classic");
        assert_eq!(res.weights.get(&r("GM")), Some(15));
        assert_eq!(res.weights.get(&r("T")), Some(9));
        assert_eq!(res.weights.get(&r("X")), Some(4));
        assert_eq!(res.rounding_unit, RoundingUnit::TEN);
        let order: Vec<&str> = res.counts.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, vec!["T", "X"]);
    }

    #[test]
    fn unknown_preset_is_a_validation_error() {
        let req = parse_request(r#"{"total_amount":1,"counts":{},"preset":"vip"}"#).unwrap();
        assert_eq!(
            resolve(&Params::default(), &req),
            Err(PipelineError::Validate("unknown weight preset: vip".into()))
        );
    }
}
