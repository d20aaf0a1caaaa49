//! Integer-first rounding helpers.
//!
//! Amounts are exact rationals `num / den` until the final ceiling, so a raw
//! share that lands exactly on a multiple of the unit is never bumped up by
//! floating-point noise.

/// Per-person floor applied after rounding, independent of the rounding unit.
pub const MIN_PER_PERSON: u64 = 100;

/// `ceil(num / den)` for `den > 0`. Returns `None` on `den == 0`.
#[inline]
pub fn ceil_div_u128(num: u128, den: u128) -> Option<u128> {
    if den == 0 { return None; }
    let q = num / den;
    if num % den == 0 { Some(q) } else { q.checked_add(1) }
}

/// `ceil((num / den) / unit) * unit`, i.e. the rational `num / den` rounded up
/// to the next multiple of `unit`. `None` on zero divisors or overflow.
pub fn ceil_to_multiple(num: u128, den: u128, unit: u64) -> Option<u128> {
    let unit = unit as u128;
    let scaled_den = den.checked_mul(unit)?;
    ceil_div_u128(num, scaled_den)?.checked_mul(unit)
}

/// Apply the per-person floor.
#[inline]
pub fn with_floor(amount: u128) -> u128 {
    amount.max(MIN_PER_PERSON as u128)
}

/// Percent of `num / den` in tenths, rounded half-up (e.g. 553 → "55.3%").
/// Returns 0 for `den == 0`.
pub fn percent_one_decimal_tenths(num: u128, den: u128) -> u128 {
    if den == 0 { return 0; }
    // round(num * 1000 / den) with half-up
    (num.saturating_mul(2000) / den).div_ceil(2)
}

/// Format tenths of a percent as `"12.3%"`.
pub fn format_tenths_pct(tenths: u128) -> String {
    format!("{}.{}%", tenths / 10, tenths % 10)
}
