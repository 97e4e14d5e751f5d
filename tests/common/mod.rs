#![allow(dead_code)]

use chrono::NaiveDate;
use rebalsim::domain::error::RebalanceError;
use rebalsim::domain::returns::PriceMatrix;
use rebalsim::domain::schedule::{RebalanceSchedule, ScheduledPortfolio};
use rebalsim::domain::simulation::SimulationConfig;
use rebalsim::domain::weights::WeightVector;
use rebalsim::ports::data_port::DataPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn dates_from(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start.iter_days().take(count).collect()
}

pub fn weights(entries: &[(&str, f64)]) -> WeightVector {
    entries.iter().map(|&(a, w)| (a, w)).collect()
}

/// Price matrix over consecutive days from 2024-01-01, one column per asset.
pub fn prices(assets: &[&str], rows: Vec<Vec<f64>>) -> PriceMatrix {
    PriceMatrix::new(
        dates_from(date(2024, 1, 1), rows.len()),
        assets.iter().map(|a| a.to_string()).collect(),
        rows,
    )
    .unwrap()
}

pub fn schedule(entries: Vec<(NaiveDate, WeightVector)>) -> RebalanceSchedule {
    RebalanceSchedule::new(
        entries
            .into_iter()
            .map(|(date, weights)| ScheduledPortfolio { date, weights })
            .collect(),
    )
    .unwrap()
}

pub fn config(starting_balance: f64, end_date: NaiveDate) -> SimulationConfig {
    SimulationConfig::new(starting_balance, end_date)
}

pub fn assert_balances(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        approx::assert_relative_eq!(*a, *e, epsilon = 1e-9);
    }
}

pub struct MockDataPort {
    pub prices: Option<PriceMatrix>,
    pub schedule: Option<RebalanceSchedule>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: None,
            schedule: None,
            error: None,
        }
    }

    pub fn with_prices(mut self, prices: PriceMatrix) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_schedule(mut self, schedule: RebalanceSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), RebalanceError> {
        match &self.error {
            Some(reason) => Err(RebalanceError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceMatrix, RebalanceError> {
        self.check()?;
        let Some(prices) = &self.prices else {
            return PriceMatrix::new(Vec::new(), Vec::new(), Vec::new());
        };
        let (dates, rows): (Vec<NaiveDate>, Vec<Vec<f64>>) = prices
            .dates()
            .iter()
            .filter(|d| **d >= start_date && **d <= end_date)
            .map(|&d| {
                let row = prices
                    .assets()
                    .iter()
                    .map(|a| prices.price(d, a).unwrap_or(f64::NAN))
                    .collect();
                (d, row)
            })
            .unzip();
        PriceMatrix::new(dates, prices.assets().to_vec(), rows)
    }

    fn fetch_schedule(&self) -> Result<RebalanceSchedule, RebalanceError> {
        self.check()?;
        match &self.schedule {
            Some(s) => Ok(s.clone()),
            None => RebalanceSchedule::new(Vec::new()),
        }
    }

    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalanceError> {
        self.check()?;
        Ok(self.prices.as_ref().and_then(|p| p.date_range()))
    }
}
