//! Rebalancing orchestrator.
//!
//! Chains rebalancing periods: each period pays its rebalance cost out of
//! the previous period's ending balance, then drifts from the new target
//! weights until the next rebalance date. The loop is a fold over
//! [`PeriodState`], so every period only sees the state its predecessor
//! handed over.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::costs::{CostModel, DEFAULT_DAYS_IN_YEAR, net_of_cost};
use super::error::RebalanceError;
use super::period::simulate_period;
use super::returns::PriceMatrix;
use super::schedule::RebalanceSchedule;
use super::trajectory::{BalancePoint, BalanceTrajectory};
use super::weights::WeightVector;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub starting_balance: f64,
    pub end_date: NaiveDate,
    /// Fraction of balance per unit of weight turned over.
    pub transaction_cost: f64,
    pub annual_cost_of_debt: f64,
    pub days_in_year: f64,
}

impl SimulationConfig {
    pub fn new(starting_balance: f64, end_date: NaiveDate) -> Self {
        SimulationConfig {
            starting_balance,
            end_date,
            transaction_cost: 0.0,
            annual_cost_of_debt: 0.0,
            days_in_year: DEFAULT_DAYS_IN_YEAR,
        }
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel {
            transaction_cost: self.transaction_cost,
            annual_cost_of_debt: self.annual_cost_of_debt,
            days_in_year: self.days_in_year,
        }
    }
}

/// One rebalancing period over `[start, end]` of the price index.
#[derive(Debug, Clone, PartialEq)]
pub struct Period<'a> {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weights: &'a WeightVector,
}

/// State handed from one period to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodState {
    pub balance: f64,
    pub weights: WeightVector,
    pub start: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodResult {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rebalance_cost: f64,
    pub leverage_cost: f64,
    /// Balance after the rebalance cost, the period's starting capital.
    pub net_balance: f64,
    pub trajectory: BalanceTrajectory,
    pub ending_weights: WeightVector,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationResult {
    pub periods: Vec<PeriodResult>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn trajectory(&self, index: usize) -> Option<&BalanceTrajectory> {
        self.periods
            .iter()
            .find(|p| p.index == index)
            .map(|p| &p.trajectory)
    }

    /// Last balance of the last period.
    pub fn final_balance(&self) -> Option<f64> {
        self.periods
            .last()
            .and_then(|p| p.trajectory.last())
            .map(|p| p.balance)
    }

    pub fn total_return(&self, starting_balance: f64) -> Option<f64> {
        if starting_balance <= 0.0 {
            return None;
        }
        self.final_balance()
            .map(|b| (b - starting_balance) / starting_balance)
    }

    pub fn is_ruined(&self) -> bool {
        self.final_balance().is_some_and(|b| b <= 0.0)
    }

    /// Every period's points in order, as one trajectory.
    pub fn combined(&self) -> BalanceTrajectory {
        let points: Vec<BalancePoint> = self
            .periods
            .iter()
            .flat_map(|p| p.trajectory.points().iter().copied())
            .collect();
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        let balances: Vec<f64> = points.iter().map(|p| p.balance).collect();
        BalanceTrajectory::from_parts(&dates, &balances)
    }
}

/// Splits the schedule into periods ending at the next rebalance date, or at
/// `end_date` for the last one. A last period that would start and end on the
/// same date is left out.
pub fn build_periods(schedule: &RebalanceSchedule, end_date: NaiveDate) -> Vec<Period<'_>> {
    let entries = schedule.entries();
    let count = entries.len();
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let end = entries.get(index + 1).map(|e| e.date).unwrap_or(end_date);
            if index + 1 == count && entry.date == end {
                return None;
            }
            Some(Period {
                index,
                start: entry.date,
                end,
                weights: &entry.weights,
            })
        })
        .collect()
}

/// Simulates the balance of an investor following `schedule` over `prices`.
///
/// Any failure aborts the run and names the period it happened in; no
/// partial result is returned.
pub fn simulate_balance(
    schedule: &RebalanceSchedule,
    prices: &PriceMatrix,
    config: &SimulationConfig,
) -> Result<SimulationResult, RebalanceError> {
    validate_inputs(schedule, prices, config)?;

    let periods = build_periods(schedule, config.end_date);
    let Some(first) = periods.first() else {
        info!("schedule ends on its only rebalance date, nothing to simulate");
        return Ok(SimulationResult::default());
    };

    info!(
        periods = periods.len(),
        start = %first.start,
        end = %config.end_date,
        starting_balance = config.starting_balance,
        "simulating rebalanced balance"
    );

    let model = config.cost_model();
    let initial = PeriodState {
        balance: config.starting_balance,
        weights: WeightVector::zeros(prices.assets().iter().map(String::as_str)),
        start: first.start,
    };

    let (last_state, results) = periods.iter().try_fold(
        (initial, Vec::with_capacity(periods.len())),
        |(state, mut results), period| {
            let (result, next) = run_period(period, &state, prices, &model)
                .map_err(|e| e.in_period(period.index))?;
            results.push(result);
            Ok::<_, RebalanceError>((next, results))
        },
    )?;

    info!(final_balance = last_state.balance, "simulation complete");
    Ok(SimulationResult { periods: results })
}

fn run_period(
    period: &Period<'_>,
    state: &PeriodState,
    prices: &PriceMatrix,
    model: &CostModel,
) -> Result<(PeriodResult, PeriodState), RebalanceError> {
    let target = period.weights.held();
    let assets: Vec<String> = target.assets().map(str::to_string).collect();
    let returns = prices.slice_returns(&assets, state.start, period.end)?;

    let costs = model.period_costs(&target, &state.weights)?;
    let net_balance = net_of_cost(state.balance, costs.rebalance);
    let outcome = simulate_period(&target, net_balance, &returns, costs.leverage)?;

    let corrupt = outcome.ending_weights.non_finite();
    if !corrupt.is_empty() {
        return Err(RebalanceError::CorruptState {
            period: period.index,
            assets: corrupt,
        });
    }

    let final_balance = outcome.final_balance();
    debug!(
        period = period.index,
        from = %state.start,
        to = %period.end,
        assets = target.len(),
        rebalance_cost = costs.rebalance,
        leverage_cost = costs.leverage,
        net_balance,
        final_balance,
        "period simulated"
    );
    if !outcome.never_ruined && state.balance > 0.0 {
        warn!(period = period.index, to = %period.end, "balance depleted, account ruined");
    }

    let next = PeriodState {
        balance: final_balance,
        weights: outcome.ending_weights.clone(),
        start: period.end,
    };
    let result = PeriodResult {
        index: period.index,
        start: state.start,
        end: period.end,
        rebalance_cost: costs.rebalance,
        leverage_cost: costs.leverage,
        net_balance,
        trajectory: outcome.trajectory,
        ending_weights: outcome.ending_weights,
    };
    Ok((result, next))
}

/// Checks the configuration and that the price index covers the schedule:
/// every held asset priced, every rebalance date and the end date present.
pub fn validate_inputs(
    schedule: &RebalanceSchedule,
    prices: &PriceMatrix,
    config: &SimulationConfig,
) -> Result<(), RebalanceError> {
    if !(config.starting_balance.is_finite() && config.starting_balance > 0.0) {
        return Err(RebalanceError::invalid_input(format!(
            "starting balance must be positive, got {}",
            config.starting_balance
        )));
    }
    for (name, value) in [
        ("transaction cost", config.transaction_cost),
        ("annual cost of debt", config.annual_cost_of_debt),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(RebalanceError::invalid_input(format!(
                "{name} must be non-negative, got {value}"
            )));
        }
    }
    if !(config.days_in_year.is_finite() && config.days_in_year > 0.0) {
        return Err(RebalanceError::invalid_input(format!(
            "days in year must be positive, got {}",
            config.days_in_year
        )));
    }

    let (Some(first), Some(last)) = (schedule.first_date(), schedule.last_date()) else {
        return Err(RebalanceError::invalid_input("rebalance schedule is empty"));
    };
    if config.end_date < last {
        return Err(RebalanceError::DateRange {
            period: Some(schedule.len() - 1),
            from: last,
            to: config.end_date,
            reason: "end date precedes the last rebalance date".into(),
        });
    }

    for (index, entry) in schedule.entries().iter().enumerate() {
        let unknown: Vec<String> = entry
            .weights
            .held()
            .assets()
            .filter(|a| !prices.has_asset(a))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(RebalanceError::InvalidInput {
                period: Some(index),
                reason: format!("no price data for {}", unknown.join(", ")),
            });
        }
        if !prices.has_date(entry.date) {
            let to = schedule
                .entries()
                .get(index + 1)
                .map(|e| e.date)
                .unwrap_or(config.end_date);
            return Err(RebalanceError::DateRange {
                period: Some(index),
                from: entry.date,
                to,
                reason: "rebalance date not in price index".into(),
            });
        }
    }
    if !prices.has_date(config.end_date) {
        return Err(RebalanceError::DateRange {
            period: Some(schedule.len() - 1),
            from: last,
            to: config.end_date,
            reason: "end date not in price index".into(),
        });
    }

    debug!(%first, %last, rebalances = schedule.len(), "inputs validated");
    Ok(())
}
