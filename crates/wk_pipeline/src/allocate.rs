//! ALLOCATE stage: run the calculator on resolved inputs.
//!
//! Zero total weight is a user-correctable condition, so it comes back as
//! `Outcome::Warning` rather than an error. Anything else the calculator
//! rejects is an `Allocate` error.

use tracing::{debug, warn};

use wk_algo::{compute, AllocError, Allocation};

use crate::load::ResolvedInputs;
use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Allocated(Allocation),
    /// User-facing warning text; nothing was billed.
    Warning(String),
}

impl Outcome {
    /// Surplus for the summary line (0 when nothing was billed).
    pub fn organizer_surplus(&self) -> u64 {
        match self {
            Outcome::Allocated(a) => a.organizer_surplus,
            Outcome::Warning(_) => 0,
        }
    }
}

pub fn allocate(inp: &ResolvedInputs) -> Result<Outcome, PipelineError> {
    match compute(inp.total_amount, &inp.counts, &inp.weights, inp.rounding_unit) {
        Ok(a) => {
            debug!(
                total_weight = %a.total_weight,
                total_collected = a.total_collected,
                organizer_surplus = a.organizer_surplus,
                "allocated"
            );
            Ok(Outcome::Allocated(a))
        }
        Err(AllocError::ZeroWeight) => {
            warn!("{}", AllocError::ZeroWeight);
            Ok(Outcome::Warning(AllocError::ZeroWeight.to_string()))
        }
        Err(e) => Err(PipelineError::Allocate(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::resolve;
    use wk_core::variables::Params;
    use wk_io::loader::parse_request;

    fn run(json: &str) -> Result<Outcome, PipelineError> {
        let params = Params::default();
        allocate(&resolve(&params, &parse_request(json).unwrap()).unwrap())
    }

    #[test]
    fn documented_scenario_allocates() {
        let out = run(r#"{"total_amount":10000,"counts":{"GM":1,"M":1,"PM":0,"PAM":0,"T":0}}"#).unwrap();
        match &out {
            Outcome::Allocated(a) => {
                assert_eq!(a.shares.len(), 2);
                assert_eq!(a.total_collected, 10_100);
            }
            other => panic!("expected allocation, got {other:?}"),
        }
        assert_eq!(out.organizer_surplus(), 100);
    }

    #[test]
    fn zero_weight_becomes_warning() {
        let out = run(r#"{"total_amount":10000,"counts":{"GM":0,"M":0}}"#).unwrap();
        assert_eq!(out, Outcome::Warning("total weight is 0; set participant counts".into()));
        assert_eq!(out.organizer_surplus(), 0);
    }

    #[test]
    fn missing_weight_is_an_allocate_error() {
        let out = run(r#"{"total_amount":100,"counts":{"X":1}}"#);
        assert_eq!(out, Err(PipelineError::Allocate("no weight configured for rank X".into())));
    }
}
