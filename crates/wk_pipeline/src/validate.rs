//! crates/wk_pipeline/src/validate.rs
//! Input-surface bounds checked before any computation.
//! Deterministic outputs; pure integer reasoning.
//!
//! The calculator accepts any non-negative input; these are the limits the
//! input surface promises (counts, weights, amount grid, rounding choices).

use std::cmp::Ordering;

use wk_core::{variables::Params, RankId};

use crate::load::ResolvedInputs;

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntityRef {
    Rank(RankId),
    Param(&'static str),
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub where_: EntityRef,
}

/// Deterministic report: pass = (no Error); ordering of issues is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// `"; "`-joined messages of the Error-level issues.
    pub fn error_summary(&self) -> String {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// Top-level entry point.
pub fn validate(params: &Params, inp: &ResolvedInputs) -> ValidationReport {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    issues.extend(check_amount_grid(params, inp));
    issues.extend(check_rounding_unit(params, inp));
    issues.extend(check_counts(params, inp));
    issues.extend(check_weights(params, inp));

    sort_issues_stably(&mut issues);

    ValidationReport {
        pass: !issues.iter().any(|i| i.severity == Severity::Error),
        issues,
    }
}

// ------------------------------------------------------------------------------------------------
// Checks
// ------------------------------------------------------------------------------------------------

fn check_amount_grid(params: &Params, inp: &ResolvedInputs) -> Vec<ValidationIssue> {
    let step = params.bounds.amount_step;
    if step > 0 && inp.total_amount % step != 0 {
        return vec![ValidationIssue {
            severity: Severity::Warning,
            code: "amount.step",
            message: format!("total amount {} is not a multiple of {step}", inp.total_amount),
            where_: EntityRef::Param("total_amount"),
        }];
    }
    Vec::new()
}

fn check_rounding_unit(params: &Params, inp: &ResolvedInputs) -> Vec<ValidationIssue> {
    if params.is_rounding_allowed(inp.rounding_unit) {
        return Vec::new();
    }
    let allowed = params
        .allowed_rounding_units
        .iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    vec![ValidationIssue {
        severity: Severity::Error,
        code: "rounding.not_allowed",
        message: format!("rounding unit {} is not one of [{allowed}]", inp.rounding_unit),
        where_: EntityRef::Param("rounding_unit"),
    }]
}

fn check_counts(params: &Params, inp: &ResolvedInputs) -> Vec<ValidationIssue> {
    let max = params.bounds.max_count;
    let mut out = Vec::new();
    for (rank, count) in inp.counts.iter() {
        if count > max {
            out.push(ValidationIssue {
                severity: Severity::Error,
                code: "count.range",
                message: format!("count for {rank} is {count}; allowed 0..={max}"),
                where_: EntityRef::Rank(rank.clone()),
            });
        }
        if !params.roster.contains(rank) {
            out.push(ValidationIssue {
                severity: Severity::Warning,
                code: "rank.unknown",
                message: format!("rank {rank} is not in the roster"),
                where_: EntityRef::Rank(rank.clone()),
            });
        }
    }
    out
}

fn check_weights(params: &Params, inp: &ResolvedInputs) -> Vec<ValidationIssue> {
    let (lo, hi) = (params.bounds.min_weight, params.bounds.max_weight);
    let mut out = Vec::new();

    for (rank, w) in inp.overridden.iter() {
        if !(lo..=hi).contains(&w) {
            out.push(ValidationIssue {
                severity: Severity::Error,
                code: "weight.range",
                message: format!("weight for {rank} is {w}; allowed {lo}..={hi}"),
                where_: EntityRef::Rank(rank.clone()),
            });
        }
    }

    for (rank, count) in inp.counts.iter() {
        if count > 0 && inp.weights.get(rank).is_none() {
            out.push(ValidationIssue {
                severity: Severity::Error,
                code: "weight.missing",
                message: format!("rank {rank} has participants but no weight"),
                where_: EntityRef::Rank(rank.clone()),
            });
        }
    }
    out
}

/// Sort by severity (errors first), then code, then location, then message.
fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| match a.severity.cmp(&b.severity) {
        Ordering::Equal => a
            .code
            .cmp(b.code)
            .then_with(|| a.where_.cmp(&b.where_))
            .then_with(|| a.message.cmp(&b.message)),
        o => o,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::resolve;
    use wk_io::loader::parse_request;

    fn report(json: &str) -> ValidationReport {
        let params = Params::default();
        let req = parse_request(json).unwrap();
        validate(&params, &resolve(&params, &req).unwrap())
    }

    #[test]
    fn in_bounds_request_passes_clean() {
        let rep = report(r#"{"total_amount":10000,"counts":{"GM":1,"M":10}}"#);
        assert!(rep.pass);
        assert!(rep.issues.is_empty());
    }

    #[test]
    fn off_grid_amount_only_warns() {
        let rep = report(r#"{"total_amount":10050,"counts":{"GM":1}}"#);
        assert!(rep.pass);
        assert_eq!(rep.issues.len(), 1);
        assert_eq!(rep.issues[0].code, "amount.step");
        assert_eq!(rep.issues[0].severity, Severity::Warning);
    }

    #[test]
    fn out_of_range_inputs_fail() {
        let rep = report(
            r#"{"total_amount":100,"counts":{"GM":11},"weights":{"M":0,"T":101},"rounding_unit":50}"#,
        );
        assert!(!rep.pass);
        let codes: Vec<&str> = rep.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["count.range", "rounding.not_allowed", "weight.range", "weight.range"]);
        assert!(rep.error_summary().contains("count for GM is 11"));
    }

    #[test]
    fn unknown_rank_without_weight_is_an_error() {
        let rep = report(r#"{"total_amount":100,"counts":{"X":1}}"#);
        assert!(!rep.pass);
        let codes: Vec<&str> = rep.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["weight.missing", "rank.unknown"]);
    }

    #[test]
    fn unknown_rank_with_weight_only_warns() {
        let rep = report(r#"{"total_amount":100,"counts":{"X":1},"weights":{"X":3}}"#);
        assert!(rep.pass);
        assert_eq!(rep.warnings().count(), 1);
    }
}
