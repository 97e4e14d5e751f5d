//! Balance simulation over a single rebalancing period.
//!
//! The starting balance is split across assets by the period's target
//! weights, and each position then compounds its own log-returns without
//! further trading. Positions drift, so the ending weights generally differ
//! from the targets.

use super::costs::round_to;
use super::error::RebalanceError;
use super::returns::ReturnMatrix;
use super::ruin::apply_ruin;
use super::trajectory::BalanceTrajectory;
use super::weights::WeightVector;

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodOutcome {
    pub trajectory: BalanceTrajectory,
    /// Last position values over the final balance; all zero after ruin.
    pub ending_weights: WeightVector,
    pub never_ruined: bool,
}

impl PeriodOutcome {
    pub fn final_balance(&self) -> f64 {
        self.trajectory.last().map(|p| p.balance).unwrap_or(0.0)
    }
}

/// Simulates one period.
///
/// Weights with no defined entry hold the starting balance flat over every
/// return date. Otherwise position values are
/// `round2(w * starting_balance * exp(Σ ln(1 + r)))` and the trajectory is
/// their daily sum, clamped to zero from the first non-positive total.
/// A positive `leverage_daily_cost` is charged against every daily change
/// of a trajectory that never hit zero.
pub fn simulate_period(
    weights: &WeightVector,
    starting_balance: f64,
    returns: &ReturnMatrix,
    leverage_daily_cost: f64,
) -> Result<PeriodOutcome, RebalanceError> {
    if !starting_balance.is_finite() || starting_balance < 0.0 {
        return Err(RebalanceError::invalid_input(format!(
            "starting balance must be a non-negative number, got {starting_balance}"
        )));
    }
    if returns.is_empty() {
        return Err(RebalanceError::invalid_input("no return data for period"));
    }

    let defined: Vec<(&str, f64)> = weights.iter().filter(|(_, w)| w.is_finite()).collect();
    if defined.is_empty() {
        return Ok(hold(weights, starting_balance, returns));
    }

    let missing: Vec<&str> = defined
        .iter()
        .filter(|(a, _)| returns.column_of(a).is_none())
        .map(|(a, _)| *a)
        .collect();
    if !missing.is_empty() {
        return Err(RebalanceError::invalid_input(format!(
            "no returns for weighted asset(s) {}",
            missing.join(", ")
        )));
    }
    let positions: Vec<(&str, usize, f64)> = defined
        .iter()
        .filter_map(|&(a, w)| returns.column_of(a).map(|c| (a, c, w * starting_balance)))
        .collect();

    let mut cumulative_log = vec![0.0_f64; positions.len()];
    let mut last_nav = vec![0.0_f64; positions.len()];
    let mut balances = Vec::with_capacity(returns.len());

    for (date, row) in returns.dates().iter().zip(returns.rows()) {
        let mut total = 0.0;
        for (k, &(asset, col, allocation)) in positions.iter().enumerate() {
            let r = row[col];
            if !r.is_finite() || r < -1.0 {
                return Err(RebalanceError::invalid_input(format!(
                    "return {r} for {asset} on {date} is not a valid fractional return"
                )));
            }
            cumulative_log[k] += r.ln_1p();
            let nav = round_to(allocation * cumulative_log[k].exp(), 2);
            if !nav.is_finite() {
                return Err(RebalanceError::invalid_input(format!(
                    "position value for {asset} overflowed on {date}"
                )));
            }
            last_nav[k] = nav;
            total += nav;
        }
        balances.push(round_to(total, 2));
    }

    let mut never_ruined = apply_ruin(&mut balances);
    if leverage_daily_cost > 0.0 && never_ruined {
        balances = apply_leverage_drag(&balances, starting_balance, leverage_daily_cost);
        never_ruined = apply_ruin(&mut balances);
    }

    let final_balance = balances.last().copied().unwrap_or(0.0);
    let ending_weights: WeightVector = if final_balance > 0.0 {
        positions
            .iter()
            .zip(&last_nav)
            .map(|(&(asset, _, _), &nav)| (asset, nav / final_balance))
            .collect()
    } else {
        WeightVector::zeros(positions.iter().map(|&(asset, _, _)| asset))
    };

    Ok(PeriodOutcome {
        trajectory: BalanceTrajectory::from_parts(returns.dates(), &balances),
        ending_weights,
        never_ruined,
    })
}

fn hold(weights: &WeightVector, starting_balance: f64, returns: &ReturnMatrix) -> PeriodOutcome {
    let mut balances = vec![round_to(starting_balance, 2); returns.len()];
    let never_ruined = apply_ruin(&mut balances);
    PeriodOutcome {
        trajectory: BalanceTrajectory::from_parts(returns.dates(), &balances),
        ending_weights: WeightVector::zeros(weights.assets()),
        never_ruined,
    }
}

/// Re-compounds `balances` from `starting_balance` with `daily_cost` taken off
/// every daily percent change. The first change is measured against the
/// starting balance.
///
/// A day whose net growth factor is not positive yields zero or `NaN` from
/// that day on, which the ruin guard then clamps.
fn apply_leverage_drag(balances: &[f64], starting_balance: f64, daily_cost: f64) -> Vec<f64> {
    let mut previous = starting_balance;
    let mut log_sum = 0.0_f64;
    balances
        .iter()
        .map(|&balance| {
            let net_change = balance / previous - 1.0 - daily_cost;
            previous = balance;
            log_sum += net_change.ln_1p();
            round_to(starting_balance * log_sum.exp(), 2)
        })
        .collect()
}
