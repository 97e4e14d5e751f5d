//! Price and return tables indexed by date and asset.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use super::error::RebalanceError;

/// Date-indexed price levels, one column per asset. Missing prices are `NaN`.
#[derive(Debug, Clone)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    rows: Vec<Vec<f64>>,
    date_index: HashMap<NaiveDate, usize>,
    asset_index: HashMap<String, usize>,
}

impl PriceMatrix {
    /// Builds the matrix, checking that dates strictly increase, asset ids are
    /// unique and every row has one value per asset.
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, RebalanceError> {
        check_shape(&dates, &assets, &rows)?;
        let date_index = dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        let asset_index = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();
        Ok(Self {
            dates,
            assets,
            rows,
            date_index,
            asset_index,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn has_asset(&self, asset: &str) -> bool {
        self.asset_index.contains_key(asset)
    }

    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.date_index.contains_key(&date)
    }

    pub fn price(&self, date: NaiveDate, asset: &str) -> Option<f64> {
        let row = *self.date_index.get(&date)?;
        let col = *self.asset_index.get(asset)?;
        Some(self.rows[row][col])
    }

    /// First date, last date and row count.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate, usize)> {
        match (self.dates.first(), self.dates.last()) {
            (Some(&first), Some(&last)) => Some((first, last, self.dates.len())),
            _ => None,
        }
    }

    /// Percent-change returns of `assets` over the inclusive range `[from, to]`.
    ///
    /// The first row of the range only anchors the first change and is not
    /// part of the result. A zero previous price is an error; otherwise rows
    /// where any selected asset has no return (missing price on either side)
    /// are dropped.
    pub fn slice_returns(
        &self,
        assets: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ReturnMatrix, RebalanceError> {
        if from > to {
            return Err(date_range_error(from, to, "start date is after end date"));
        }
        let start = *self
            .date_index
            .get(&from)
            .ok_or_else(|| date_range_error(from, to, "start date not in price index"))?;
        let end = *self
            .date_index
            .get(&to)
            .ok_or_else(|| date_range_error(from, to, "end date not in price index"))?;

        let unknown: Vec<&str> = assets
            .iter()
            .filter(|a| !self.asset_index.contains_key(a.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(RebalanceError::invalid_input(format!(
                "no price data for {}",
                unknown.join(", ")
            )));
        }
        let cols: Vec<usize> = assets.iter().map(|a| self.asset_index[a.as_str()]).collect();

        let mut dates = Vec::with_capacity(end - start);
        let mut rows = Vec::with_capacity(end - start);
        for i in (start + 1)..=end {
            let prev = &self.rows[i - 1];
            let curr = &self.rows[i];
            let row: Vec<f64> = cols.iter().map(|&c| curr[c] / prev[c] - 1.0).collect();

            if let Some(pos) = row.iter().position(|r| r.is_infinite()) {
                return Err(RebalanceError::invalid_input(format!(
                    "zero price for {} on {}",
                    assets[pos],
                    self.dates[i - 1]
                )));
            }
            if row.iter().any(|r| r.is_nan()) {
                continue;
            }
            dates.push(self.dates[i]);
            rows.push(row);
        }

        ReturnMatrix::new(dates, assets.to_vec(), rows)
    }
}

/// Date-indexed fractional returns, one column per asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, RebalanceError> {
        check_shape(&dates, &assets, &rows)?;
        Ok(Self {
            dates,
            assets,
            rows,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn column_of(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn date_range_error(from: NaiveDate, to: NaiveDate, reason: &str) -> RebalanceError {
    RebalanceError::DateRange {
        period: None,
        from,
        to,
        reason: reason.to_string(),
    }
}

fn check_shape(
    dates: &[NaiveDate],
    assets: &[String],
    rows: &[Vec<f64>],
) -> Result<(), RebalanceError> {
    if dates.len() != rows.len() {
        return Err(RebalanceError::invalid_input(format!(
            "{} dates but {} rows",
            dates.len(),
            rows.len()
        )));
    }
    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(RebalanceError::invalid_input(format!(
            "dates must be strictly increasing: {} followed by {}",
            w[0], w[1]
        )));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = assets.iter().find(|a| !seen.insert(a.as_str())) {
        return Err(RebalanceError::invalid_input(format!(
            "duplicate asset identifier {dup}"
        )));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != assets.len()) {
        return Err(RebalanceError::invalid_input(format!(
            "row for {} has {} values, expected {}",
            dates[i],
            row.len(),
            assets.len()
        )));
    }
    Ok(())
}
