//! Data access port trait.

use crate::domain::error::RebalanceError;
use crate::domain::returns::PriceMatrix;
use crate::domain::schedule::RebalanceSchedule;
use chrono::NaiveDate;

pub trait DataPort {
    /// Price levels for every asset between `start_date` and `end_date`, inclusive.
    fn fetch_prices(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceMatrix, RebalanceError>;

    fn fetch_schedule(&self) -> Result<RebalanceSchedule, RebalanceError>;

    /// First date, last date and number of price rows available.
    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalanceError>;
}
