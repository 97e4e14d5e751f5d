//! Transaction and leverage cost model.
//!
//! Rebalancing is charged on weight turnover; borrowed (negative) exposure
//! accrues a flat daily carrying cost that the period simulator compounds
//! like a return drag.

use super::error::RebalanceError;
use super::weights::WeightVector;

/// Day count used to turn an annual cost of debt into a daily rate.
pub const DEFAULT_DAYS_IN_YEAR: f64 = 360.0;

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Fraction of balance lost to rebalancing from `previous` to `current`.
///
/// `cost_rate * Σ|Δw|` over the union of both vectors' assets, rounded to
/// six decimals. Nothing is aligned when `cost_rate <= 0`.
pub fn rebalance_cost(
    current: &WeightVector,
    previous: &WeightVector,
    cost_rate: f64,
) -> Result<f64, RebalanceError> {
    if cost_rate <= 0.0 {
        return Ok(0.0);
    }
    let turnover = current.turnover(previous)?;
    Ok(round_to(turnover * cost_rate, 6))
}

/// Daily cost of carrying the short exposure in `weights`.
pub fn leverage_cost(annual_rate: f64, weights: &WeightVector, days_in_year: f64) -> f64 {
    if annual_rate <= 0.0 {
        return 0.0;
    }
    let exposure: f64 = weights
        .iter()
        .map(|(_, w)| w)
        .filter(|w| *w < 0.0)
        .sum::<f64>()
        .abs();
    if exposure == 0.0 {
        return 0.0;
    }
    (annual_rate / days_in_year) * exposure
}

/// Balance left after paying `cost_fraction` of it. A ruined balance stays at zero.
pub fn net_of_cost(balance: f64, cost_fraction: f64) -> f64 {
    if balance > 0.0 {
        round_to(balance * (1.0 - cost_fraction), 2)
    } else {
        0.0
    }
}

/// Cost parameters shared by every period of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub transaction_cost: f64,
    pub annual_cost_of_debt: f64,
    pub days_in_year: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            transaction_cost: 0.0,
            annual_cost_of_debt: 0.0,
            days_in_year: DEFAULT_DAYS_IN_YEAR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodCosts {
    /// One-off fraction of balance charged at the rebalance.
    pub rebalance: f64,
    /// Daily drag applied over the period.
    pub leverage: f64,
}

impl CostModel {
    pub fn period_costs(
        &self,
        target: &WeightVector,
        previous: &WeightVector,
    ) -> Result<PeriodCosts, RebalanceError> {
        Ok(PeriodCosts {
            rebalance: rebalance_cost(target, previous, self.transaction_cost)?,
            leverage: leverage_cost(self.annual_cost_of_debt, target, self.days_in_year),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wv(entries: &[(&str, f64)]) -> WeightVector {
        entries.iter().map(|&(a, w)| (a, w)).collect()
    }

    #[test]
    fn round_to_places() {
        assert_relative_eq!(round_to(539.004, 2), 539.0);
        assert_relative_eq!(round_to(1.234_567_89, 6), 1.234_568);
        assert_relative_eq!(round_to(-2.36, 1), -2.4);
    }

    #[test]
    fn round_to_ties_go_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-2.5, 0), -2.0);
    }

    #[test]
    fn net_of_cost_tie_rounds_to_even() {
        assert_eq!(net_of_cost(100.25, 0.5), 50.12);
    }

    #[test]
    fn rebalance_cost_zero_rate_skips_alignment() {
        // A blank identifier would fail alignment; a zero rate never aligns.
        let current = wv(&[("", 1.0)]);
        assert_eq!(rebalance_cost(&current, &WeightVector::new(), 0.0).unwrap(), 0.0);
        assert_eq!(rebalance_cost(&current, &WeightVector::new(), -0.1).unwrap(), 0.0);
    }

    #[test]
    fn rebalance_cost_full_switch() {
        let previous = wv(&[("AAA", 1.0)]);
        let current = wv(&[("BBB", 1.0)]);
        assert_relative_eq!(rebalance_cost(&current, &previous, 0.01).unwrap(), 0.02);
    }

    #[test]
    fn rebalance_cost_rounds_to_six_places() {
        let previous = wv(&[("AAA", 0.333_333_3)]);
        let current = wv(&[("AAA", 0.0)]);
        let cost = rebalance_cost(&current, &previous, 0.001).unwrap();
        assert_relative_eq!(cost, 0.000_333, epsilon = 1e-12);
    }

    #[test]
    fn rebalance_cost_reports_alignment_failure() {
        let previous = wv(&[("AAA", f64::NAN)]);
        let current = wv(&[("AAA", 1.0)]);
        let err = rebalance_cost(&current, &previous, 0.01).unwrap_err();
        assert!(matches!(err, RebalanceError::InvalidInput { .. }));
    }

    #[test]
    fn leverage_cost_zero_rate() {
        let w = wv(&[("AAA", 1.5), ("BBB", -0.5)]);
        assert_eq!(leverage_cost(0.0, &w, DEFAULT_DAYS_IN_YEAR), 0.0);
    }

    #[test]
    fn leverage_cost_long_only() {
        let w = wv(&[("AAA", 0.6), ("BBB", 0.4)]);
        assert_eq!(leverage_cost(0.05, &w, DEFAULT_DAYS_IN_YEAR), 0.0);
    }

    #[test]
    fn leverage_cost_sums_short_exposure() {
        let w = wv(&[("AAA", 1.8), ("BBB", -0.5), ("CCC", -0.3)]);
        let cost = leverage_cost(0.072, &w, DEFAULT_DAYS_IN_YEAR);
        // 0.072 / 360 * 0.8
        assert_relative_eq!(cost, 0.000_16, epsilon = 1e-15);
    }

    #[test]
    fn leverage_cost_custom_day_count() {
        let w = wv(&[("AAA", -1.0)]);
        assert_relative_eq!(leverage_cost(0.365, &w, 365.0), 0.001, epsilon = 1e-15);
    }

    #[test]
    fn net_of_cost_positive_balance() {
        assert_relative_eq!(net_of_cost(550.0, 0.02), 539.0);
        assert_relative_eq!(net_of_cost(1000.004, 0.0), 1000.0);
    }

    #[test]
    fn net_of_cost_ruined_balance_stays_zero() {
        assert_eq!(net_of_cost(0.0, 0.01), 0.0);
        assert_eq!(net_of_cost(-25.0, 0.0), 0.0);
    }

    #[test]
    fn period_costs_bundle() {
        let model = CostModel {
            transaction_cost: 0.01,
            annual_cost_of_debt: 0.036,
            days_in_year: DEFAULT_DAYS_IN_YEAR,
        };
        let previous = wv(&[("AAA", 1.0)]);
        let target = wv(&[("AAA", 1.5), ("BBB", -0.5)]);
        let costs = model.period_costs(&target, &previous).unwrap();
        assert_relative_eq!(costs.rebalance, 0.01);
        assert_relative_eq!(costs.leverage, 0.000_05, epsilon = 1e-15);
    }
}
