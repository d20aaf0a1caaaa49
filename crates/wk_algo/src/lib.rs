// crates/wk_algo/src/lib.rs
#![forbid(unsafe_code)]

pub use wk_core::{ParticipantCounts, RankId, RoundingUnit, WeightTable};

// ----------------------------- Allocation output -----------------------------------

/// One billed rank: every participant of the rank pays `amount_per_person`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankShare {
    pub rank: RankId,
    pub amount_per_person: u64,
    pub count: u32,
}

impl RankShare {
    /// `amount_per_person × count`.
    pub fn subtotal(&self) -> u64 {
        self.amount_per_person.saturating_mul(self.count as u64)
    }
}

/// Allocation bundle for a single bill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Billed ranks in input order; ranks with count 0 are absent.
    pub shares: Vec<RankShare>,
    /// Σ weight × count over the input.
    pub total_weight: u128,
    /// Σ amount_per_person × count.
    pub total_collected: u64,
    /// `total_collected − total_amount`; never negative.
    pub organizer_surplus: u64,
}

impl Allocation {
    pub fn share(&self, rank: &RankId) -> Option<&RankShare> {
        self.shares.iter().find(|s| &s.rank == rank)
    }
}

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    pub mod weighted_ceiling;

    pub use weighted_ceiling::{compute, AllocError};
}

pub use allocation::{compute, AllocError};
