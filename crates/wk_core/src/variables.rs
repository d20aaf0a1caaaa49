//! variables.rs — Parameter set (roster, weight presets, rounding, input bounds)
//! with safe defaults and domain validation.
//!
//! The parameter set is plain configuration passed into every call; nothing
//! here is process-wide state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::WeightTable;
use crate::errors::CoreError;
use crate::tokens::RankId;

/// ------------ Constants ------------

pub const PRESET_STANDARD: &str = "standard";
pub const PRESET_CLASSIC: &str = "classic";

/// Built-in roster in display order.
pub const DEFAULT_ROSTER: [&str; 5] = ["GM", "M", "PM", "PAM", "T"];

const STANDARD_WEIGHTS: [u32; 5] = [20, 15, 10, 7, 5];
const CLASSIC_WEIGHTS: [u32; 5] = [15, 10, 7, 5, 3];

/// ------------ Newtypes with invariants (validated on de/ser) ------------

/// Positive denomination each individual payment is rounded up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoundingUnit(u64);

impl RoundingUnit {
    pub const TEN: RoundingUnit = RoundingUnit(10);
    pub const HUNDRED: RoundingUnit = RoundingUnit(100);
    pub const THOUSAND: RoundingUnit = RoundingUnit(1000);

    pub fn new(v: u64) -> Result<Self, CoreError> {
        if v > 0 { Ok(Self(v)) } else { Err(CoreError::InvalidRoundingUnit(v)) }
    }
    pub fn get(self) -> u64 { self.0 }
}

impl Default for RoundingUnit {
    fn default() -> Self { RoundingUnit::HUNDRED }
}

impl fmt::Display for RoundingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl<'de> Deserialize<'de> for RoundingUnit {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = u64::deserialize(d)?;
        if v > 0 { Ok(RoundingUnit(v)) }
        else { Err(D::Error::invalid_value(Unexpected::Unsigned(v), &"positive integer")) }
    }
}

/// ------------ Complex shapes ------------

/// Bounds the input surface enforces before the calculator runs.
/// The calculator itself accepts any non-negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputBounds {
    pub max_count: u32,
    pub min_weight: u32,
    pub max_weight: u32,
    pub amount_step: u64,
}

impl Default for InputBounds {
    fn default() -> Self {
        Self { max_count: 10, min_weight: 1, max_weight: 100, amount_step: 100 }
    }
}

/// ------------ Params ------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Ranks in display order.
    pub roster: Vec<RankId>,
    /// Named weight presets.
    pub presets: BTreeMap<String, WeightTable>,
    /// Preset used when a request does not name one.
    pub default_preset: String,
    /// Rounding unit used when a request does not set one.
    pub rounding_unit: RoundingUnit,
    /// Denominations a request may choose from.
    pub allowed_rounding_units: Vec<RoundingUnit>,
    pub bounds: InputBounds,
}

impl Default for Params {
    fn default() -> Self {
        let roster: Vec<RankId> = DEFAULT_ROSTER
            .iter()
            .map(|s| s.parse().expect("built-in rank tokens are valid"))
            .collect();
        let table = |ws: &[u32; 5]| -> WeightTable {
            roster.iter().cloned().zip(ws.iter().copied()).collect()
        };
        let mut presets = BTreeMap::new();
        presets.insert(PRESET_STANDARD.to_string(), table(&STANDARD_WEIGHTS));
        presets.insert(PRESET_CLASSIC.to_string(), table(&CLASSIC_WEIGHTS));

        Self {
            roster,
            presets,
            default_preset: PRESET_STANDARD.to_string(),
            rounding_unit: RoundingUnit::HUNDRED,
            allowed_rounding_units: vec![RoundingUnit::TEN, RoundingUnit::HUNDRED, RoundingUnit::THOUSAND],
            bounds: InputBounds::default(),
        }
    }
}

impl Params {
    /// Look up a preset by name.
    pub fn preset(&self, name: &str) -> Result<&WeightTable, CoreError> {
        self.presets.get(name).ok_or_else(|| CoreError::UnknownPreset(name.to_string()))
    }

    /// Weights of the configured default preset.
    pub fn default_weights(&self) -> Result<&WeightTable, CoreError> {
        self.preset(&self.default_preset)
    }

    pub fn is_rounding_allowed(&self, unit: RoundingUnit) -> bool {
        self.allowed_rounding_units.contains(&unit)
    }
}

/// ------------ Validation ------------

/// Check the parameter set for internal consistency.
pub fn validate_domains(p: &Params) -> Result<(), CoreError> {
    if p.roster.is_empty() {
        return Err(CoreError::EmptyRoster);
    }
    let mut seen = BTreeSet::new();
    for r in &p.roster {
        if !seen.insert(r) {
            return Err(CoreError::DuplicateRank(r.to_string()));
        }
    }

    let b = &p.bounds;
    if b.min_weight > b.max_weight {
        return Err(CoreError::DomainOutOfRange("bounds.min_weight <= bounds.max_weight"));
    }
    if b.amount_step == 0 {
        return Err(CoreError::DomainOutOfRange("bounds.amount_step > 0"));
    }

    if p.presets.is_empty() {
        return Err(CoreError::DomainOutOfRange("presets must not be empty"));
    }
    p.default_weights()?;
    for table in p.presets.values() {
        for r in &p.roster {
            match table.get(r) {
                Some(w) if (b.min_weight..=b.max_weight).contains(&w) => {}
                Some(_) => return Err(CoreError::DomainOutOfRange("preset weight within bounds")),
                None => return Err(CoreError::DomainOutOfRange("preset covers every roster rank")),
            }
        }
    }

    if p.allowed_rounding_units.is_empty() {
        return Err(CoreError::DomainOutOfRange("allowed_rounding_units must not be empty"));
    }
    if !p.is_rounding_allowed(p.rounding_unit) {
        return Err(CoreError::InvalidRoundingUnit(p.rounding_unit.get()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> RankId { s.parse().unwrap() }

    #[test]
    fn defaults_are_valid() {
        let p = Params::default();
        assert_eq!(validate_domains(&p), Ok(()));
        assert_eq!(p.rounding_unit, RoundingUnit::HUNDRED);
        let std_w = p.default_weights().unwrap();
        assert_eq!(std_w.get(&r("GM")), Some(20));
        assert_eq!(std_w.get(&r("T")), Some(5));
        let classic = p.preset(PRESET_CLASSIC).unwrap();
        assert_eq!(classic.get(&r("GM")), Some(15));
        assert_eq!(classic.get(&r("T")), Some(3));
    }

    #[test]
    fn unknown_default_preset_rejected() {
        let p = Params { default_preset: "nope".into(), ..Params::default() };
        assert_eq!(validate_domains(&p), Err(CoreError::UnknownPreset("nope".into())));
    }

    #[test]
    fn duplicate_roster_rejected() {
        let mut p = Params::default();
        p.roster.push(r("GM"));
        assert_eq!(validate_domains(&p), Err(CoreError::DuplicateRank("GM".into())));
    }

    #[test]
    fn rounding_must_be_in_allowed_set() {
        let p = Params { rounding_unit: RoundingUnit::new(50).unwrap(), ..Params::default() };
        assert_eq!(validate_domains(&p), Err(CoreError::InvalidRoundingUnit(50)));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: Params = serde_json::from_str(r#"{"default_preset":"classic","rounding_unit":1000}"#).unwrap();
        assert_eq!(p.default_preset, PRESET_CLASSIC);
        assert_eq!(p.rounding_unit, RoundingUnit::THOUSAND);
        assert_eq!(p.roster.len(), 5);
        assert_eq!(validate_domains(&p), Ok(()));
    }

    #[test]
    fn zero_rounding_unit_rejected_on_deserialize() {
        assert!(serde_json::from_str::<RoundingUnit>("0").is_err());
        assert!(RoundingUnit::new(0).is_err());
    }
}
