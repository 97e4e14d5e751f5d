//! Rebalance schedule: one target weight vector per rebalance date.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::error::RebalanceError;
use super::weights::WeightVector;

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledPortfolio {
    pub date: NaiveDate,
    pub weights: WeightVector,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalanceSchedule {
    entries: Vec<ScheduledPortfolio>,
}

impl RebalanceSchedule {
    /// Rebalance dates must strictly increase.
    pub fn new(entries: Vec<ScheduledPortfolio>) -> Result<Self, RebalanceError> {
        if let Some(w) = entries.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(RebalanceError::invalid_input(format!(
                "rebalance dates must be strictly increasing: {} followed by {}",
                w[0].date, w[1].date
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ScheduledPortfolio] {
        &self.entries
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.entries.iter().map(|e| e.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    /// Every asset with a held weight anywhere in the schedule.
    pub fn held_assets(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.weights.held().assets().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
