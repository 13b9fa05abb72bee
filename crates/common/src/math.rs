//! Fixed-point helpers.
//!
//! Rates and fractions (commission rate, quorum threshold) are stored as
//! integers scaled by [`DIVIDER`] (10^18). All helpers truncate toward zero
//! and return `None` instead of wrapping.

use crate::types::Amount;

/// Fixed-point denominator: 1.0 == 10^18.
pub const DIVIDER: u128 = 1_000_000_000_000_000_000;

/// One whole token in the smallest unit.
pub const ONE_TOKEN: Amount = 1_000_000_000_000_000_000;

/// Compute `a * b / d`, truncating.
///
/// The product is formed in 256 bits, so only the final quotient has to
/// fit in `u128`. Returns `None` on division by zero or when the quotient
/// overflows.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    if let Some(p) = a.checked_mul(b) {
        return Some(p / d);
    }
    let (hi, lo) = widening_mul(a, b);
    if hi >= d {
        return None;
    }
    // binary long division of (hi, lo) by d; rem < d holds on entry
    let mut rem = hi;
    let mut q: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        q <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            q |= 1;
        }
    }
    Some(q)
}

/// Full 256-bit product as `(high, low)` halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = u64::MAX as u128;
    let (a1, a0) = (a >> 64, a & MASK);
    let (b1, b0) = (b >> 64, b & MASK);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let mid = (p00 >> 64) + (p01 & MASK) + (p10 & MASK);
    let lo = (p00 & MASK) | (mid << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (hi, lo)
}

/// Apply a 10^18-scaled rate to an amount.
#[inline]
pub fn apply_rate(amount: Amount, rate: u128) -> Option<Amount> {
    mul_div(amount, rate, DIVIDER)
}

/// `numerator / denominator` expressed as a 10^18-scaled fraction.
#[inline]
pub fn ratio(numerator: u128, denominator: u128) -> Option<u128> {
    mul_div(numerator, DIVIDER, denominator)
}
