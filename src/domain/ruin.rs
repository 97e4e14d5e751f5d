//! Balance depletion guard.
//!
//! Ruin is permanent: from the first non-positive balance onward every value
//! is exactly zero.

/// Index of the first value that is zero, negative or `NaN`.
pub fn first_ruin_index(balances: &[f64]) -> Option<usize> {
    balances.iter().position(|&b| b.is_nan() || b <= 0.0)
}

/// Zeroes `balances` from the first ruined value onward.
///
/// Returns `true` when the balance never reached zero.
pub fn apply_ruin(balances: &mut [f64]) -> bool {
    match first_ruin_index(balances) {
        Some(i) => {
            balances[i..].fill(0.0);
            false
        }
        None => true,
    }
}
