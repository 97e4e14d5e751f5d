//! CSV balance report: one `period,date,balance` row per trajectory point.

use crate::domain::error::RebalanceError;
use crate::domain::simulation::SimulationResult;
use crate::ports::report_port::ReportPort;
use std::io::Write;

pub struct CsvReportAdapter;

fn report_error(e: csv::Error) -> RebalanceError {
    RebalanceError::Data {
        reason: format!("failed to write report: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &SimulationResult, out: &mut dyn Write) -> Result<(), RebalanceError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["period", "date", "balance"])
            .map_err(report_error)?;

        for period in &result.periods {
            for point in period.trajectory.points() {
                wtr.write_record([
                    period.index.to_string(),
                    point.date.format("%Y-%m-%d").to_string(),
                    format!("{:.2}", point.balance),
                ])
                .map_err(report_error)?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}
