//! CSV file data adapter.
//!
//! Prices are a wide table, `date,<asset>,...`, one row per date.
//! Portfolios are the transposed layout, `asset,<rebalance date>,...`, one
//! row per asset and one column per rebalance. Empty cells are missing
//! prices or undefined weights.

use crate::domain::error::RebalanceError;
use crate::domain::returns::PriceMatrix;
use crate::domain::schedule::{RebalanceSchedule, ScheduledPortfolio};
use crate::domain::weights::WeightVector;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    prices_path: PathBuf,
    portfolios_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(prices_path: PathBuf, portfolios_path: PathBuf) -> Self {
        Self {
            prices_path,
            portfolios_path,
        }
    }
}

fn read_records(path: &Path) -> Result<(Vec<String>, Vec<csv::StringRecord>), RebalanceError> {
    let content = fs::read_to_string(path).map_err(|e| RebalanceError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| RebalanceError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RebalanceError::Data {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;
    Ok((headers, records))
}

fn parse_date(value: &str) -> Result<NaiveDate, RebalanceError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| RebalanceError::Data {
        reason: format!("invalid date {:?}: {}", value, e),
    })
}

/// Empty cells are `None`.
fn parse_cell(value: &str, what: &str) -> Result<Option<f64>, RebalanceError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| RebalanceError::Data {
            reason: format!("invalid {} value {:?}: {}", what, value, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceMatrix, RebalanceError> {
        let (headers, records) = read_records(&self.prices_path)?;
        if headers.first().map(|h| h.to_lowercase()) != Some("date".to_string()) {
            return Err(RebalanceError::Data {
                reason: format!(
                    "{}: first column must be date",
                    self.prices_path.display()
                ),
            });
        }
        let assets: Vec<String> = headers[1..].to_vec();

        let mut rows: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
        for record in &records {
            let date = parse_date(record.get(0).unwrap_or_default())?;
            if date < start_date || date > end_date {
                continue;
            }
            if record.len() != headers.len() {
                return Err(RebalanceError::Data {
                    reason: format!(
                        "row for {} has {} columns, expected {}",
                        date,
                        record.len(),
                        headers.len()
                    ),
                });
            }
            let prices = record
                .iter()
                .skip(1)
                .map(|cell| parse_cell(cell, "price").map(|p| p.unwrap_or(f64::NAN)))
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push((date, prices));
        }

        rows.sort_by_key(|(date, _)| *date);
        let (dates, values): (Vec<NaiveDate>, Vec<Vec<f64>>) = rows.into_iter().unzip();
        PriceMatrix::new(dates, assets, values)
    }

    fn fetch_schedule(&self) -> Result<RebalanceSchedule, RebalanceError> {
        let (headers, records) = read_records(&self.portfolios_path)?;
        if headers.len() < 2 {
            return Err(RebalanceError::Data {
                reason: format!(
                    "{}: expected an asset column followed by rebalance dates",
                    self.portfolios_path.display()
                ),
            });
        }

        let mut entries = headers[1..]
            .iter()
            .map(|h| {
                parse_date(h).map(|date| ScheduledPortfolio {
                    date,
                    weights: WeightVector::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for record in &records {
            let asset = record.get(0).unwrap_or_default();
            if asset.is_empty() {
                return Err(RebalanceError::Data {
                    reason: format!(
                        "{}: blank asset identifier",
                        self.portfolios_path.display()
                    ),
                });
            }
            for (entry, cell) in entries.iter_mut().zip(record.iter().skip(1)) {
                if let Some(weight) = parse_cell(cell, "weight")? {
                    entry.weights.insert(asset, weight);
                }
            }
        }

        entries.sort_by_key(|e| e.date);
        RebalanceSchedule::new(entries)
    }

    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalanceError> {
        Ok(self
            .fetch_prices(NaiveDate::MIN, NaiveDate::MAX)?
            .date_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(prices: &str, portfolios: &str) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let prices_path = dir.path().join("prices.csv");
        let portfolios_path = dir.path().join("portfolios.csv");
        fs::write(&prices_path, prices).unwrap();
        fs::write(&portfolios_path, portfolios).unwrap();
        (dir, CsvAdapter::new(prices_path, portfolios_path))
    }

    const PRICES: &str = "date,AAA,BBB\n\
        2024-01-03,55.0,21.0\n\
        2024-01-01,100.0,20.0\n\
        2024-01-02,110.0,\n";

    const PORTFOLIOS: &str = "asset,2024-01-01,2024-01-02\n\
        AAA,1.0,0.5\n\
        BBB,,-0.5\n";

    #[test]
    fn fetch_prices_sorts_and_keeps_missing() {
        let (_dir, adapter) = setup(PRICES, PORTFOLIOS);
        let prices = adapter.fetch_prices(date(2024, 1, 1), date(2024, 1, 3)).unwrap();

        assert_eq!(prices.dates(), &[date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        assert_eq!(prices.assets(), &["AAA".to_string(), "BBB".to_string()]);
        assert_eq!(prices.price(date(2024, 1, 1), "AAA"), Some(100.0));
        assert!(prices.price(date(2024, 1, 2), "BBB").unwrap().is_nan());
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let (_dir, adapter) = setup(PRICES, PORTFOLIOS);
        let prices = adapter.fetch_prices(date(2024, 1, 2), date(2024, 1, 2)).unwrap();
        assert_eq!(prices.dates(), &[date(2024, 1, 2)]);
    }

    #[test]
    fn fetch_prices_rejects_bad_number() {
        let (_dir, adapter) = setup("date,AAA\n2024-01-01,abc\n", PORTFOLIOS);
        let err = adapter.fetch_prices(NaiveDate::MIN, NaiveDate::MAX).unwrap_err();
        assert!(err.to_string().contains("invalid price value"));
    }

    #[test]
    fn fetch_prices_requires_date_column() {
        let (_dir, adapter) = setup("day,AAA\n2024-01-01,1\n", PORTFOLIOS);
        assert!(adapter.fetch_prices(NaiveDate::MIN, NaiveDate::MAX).is_err());
    }

    #[test]
    fn fetch_prices_missing_file() {
        let adapter = CsvAdapter::new(
            PathBuf::from("/nonexistent/prices.csv"),
            PathBuf::from("/nonexistent/portfolios.csv"),
        );
        let err = adapter.fetch_prices(NaiveDate::MIN, NaiveDate::MAX).unwrap_err();
        assert!(matches!(err, RebalanceError::Data { .. }));
    }

    #[test]
    fn fetch_schedule_reads_columns() {
        let (_dir, adapter) = setup(PRICES, PORTFOLIOS);
        let schedule = adapter.fetch_schedule().unwrap();

        assert_eq!(schedule.dates(), vec![date(2024, 1, 1), date(2024, 1, 2)]);
        let first = &schedule.entries()[0].weights;
        assert_eq!(first.get("AAA"), Some(1.0));
        assert_eq!(first.get("BBB"), None);
        let second = &schedule.entries()[1].weights;
        assert_eq!(second.get("BBB"), Some(-0.5));
    }

    #[test]
    fn fetch_schedule_rejects_bad_date_header() {
        let (_dir, adapter) = setup(PRICES, "asset,January\nAAA,1.0\n");
        let err = adapter.fetch_schedule().unwrap_err();
        assert!(err.to_string().contains("invalid date"));
    }

    #[test]
    fn fetch_schedule_rejects_duplicate_dates() {
        let (_dir, adapter) = setup(PRICES, "asset,2024-01-01,2024-01-01\nAAA,1.0,1.0\n");
        assert!(adapter.fetch_schedule().is_err());
    }

    #[test]
    fn data_range_covers_file() {
        let (_dir, adapter) = setup(PRICES, PORTFOLIOS);
        assert_eq!(
            adapter.get_data_range().unwrap(),
            Some((date(2024, 1, 1), date(2024, 1, 3), 3))
        );
    }
}
