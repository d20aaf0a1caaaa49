//! Weighted ceiling allocation of a single bill across ranks.
//!
//! Contract:
//! - total_weight = Σ weight[r] × count[r] over ranks present in `counts`.
//!   A rank with count 0 contributes nothing, even without a weight entry.
//! - total_weight == 0 → `AllocError::ZeroWeight` (nothing to bill).
//! - per_weight = total_amount / total_weight, kept as an exact rational.
//! - For each rank with count > 0, in input order:
//!     raw     = weight[r] × per_weight
//!     rounded = max(100, ceil(raw / unit) × unit)
//! - organizer_surplus = Σ rounded × count − total_amount (≥ 0 since every
//!   share is rounded up).
//!
//! Determinism:
//! - Integer arithmetic only (u128 intermediates); no floats, no RNG.

use core::fmt;

use wk_core::rounding::{ceil_to_multiple, with_floor};
use wk_core::{ParticipantCounts, RankId, RoundingUnit, WeightTable};

use crate::{Allocation, RankShare};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// No rank has both a positive weight and a positive count.
    ZeroWeight,
    /// A rank with participants has no weight entry.
    MissingWeight(RankId),
    /// Intermediate amounts do not fit the output integer width.
    Overflow,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::ZeroWeight => write!(f, "total weight is 0; set participant counts"),
            AllocError::MissingWeight(r) => write!(f, "no weight configured for rank {r}"),
            AllocError::Overflow => write!(f, "amount overflow"),
        }
    }
}

impl std::error::Error for AllocError {}

/// Split `total_amount` across `counts` by `weights`, rounding every
/// per-person amount up to `unit` (and never below 100).
pub fn compute(
    total_amount: u64,
    counts: &ParticipantCounts,
    weights: &WeightTable,
    unit: RoundingUnit,
) -> Result<Allocation, AllocError> {
    let total_weight = total_weight(counts, weights)?;
    if total_weight == 0 {
        return Err(AllocError::ZeroWeight);
    }

    let mut shares = Vec::new();
    let mut collected: u128 = 0;

    for (rank, count) in counts.iter() {
        if count == 0 {
            continue;
        }
        // Present by construction: total_weight() rejected missing entries.
        let weight = weights.get(rank).ok_or_else(|| AllocError::MissingWeight(rank.clone()))?;

        // raw = weight * total_amount / total_weight
        let num = (weight as u128)
            .checked_mul(total_amount as u128)
            .ok_or(AllocError::Overflow)?;
        let rounded = ceil_to_multiple(num, total_weight, unit.get()).ok_or(AllocError::Overflow)?;
        let rounded = with_floor(rounded);

        let subtotal = rounded.checked_mul(count as u128).ok_or(AllocError::Overflow)?;
        collected = collected.checked_add(subtotal).ok_or(AllocError::Overflow)?;

        shares.push(RankShare {
            rank: rank.clone(),
            amount_per_person: u64::try_from(rounded).map_err(|_| AllocError::Overflow)?,
            count,
        });
    }

    let total_collected = u64::try_from(collected).map_err(|_| AllocError::Overflow)?;
    debug_assert!(total_collected >= total_amount, "shares are rounded up");
    let organizer_surplus = total_collected
        .checked_sub(total_amount)
        .ok_or(AllocError::Overflow)?;

    Ok(Allocation { shares, total_weight, total_collected, organizer_surplus })
}

/// Σ weight × count; ranks with participants must carry a weight.
fn total_weight(counts: &ParticipantCounts, weights: &WeightTable) -> Result<u128, AllocError> {
    let mut sum: u128 = 0;
    for (rank, count) in counts.iter() {
        if count == 0 {
            continue;
        }
        let w = weights.get(rank).ok_or_else(|| AllocError::MissingWeight(rank.clone()))?;
        sum = sum
            .checked_add(w as u128 * count as u128)
            .ok_or(AllocError::Overflow)?;
    }
    Ok(sum)
}
