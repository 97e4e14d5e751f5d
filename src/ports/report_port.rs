//! Report output port trait.

use crate::domain::error::RebalanceError;
use crate::domain::simulation::SimulationResult;
use std::io::Write;

/// Port for writing simulation results.
pub trait ReportPort {
    fn write(&self, result: &SimulationResult, out: &mut dyn Write) -> Result<(), RebalanceError>;
}
