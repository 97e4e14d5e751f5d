//! Balance trajectories.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
}

/// Portfolio value per date, in chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceTrajectory {
    points: Vec<BalancePoint>,
}

impl BalanceTrajectory {
    /// Pairs `dates` with `balances`; extra entries on either side are ignored.
    pub fn from_parts(dates: &[NaiveDate], balances: &[f64]) -> Self {
        BalanceTrajectory {
            points: dates
                .iter()
                .zip(balances)
                .map(|(&date, &balance)| BalancePoint { date, balance })
                .collect(),
        }
    }

    pub fn points(&self) -> &[BalancePoint] {
        &self.points
    }

    pub fn balances(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.balance).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn last(&self) -> Option<&BalancePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
