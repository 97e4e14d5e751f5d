//! Configuration validation.
//!
//! Validates all config fields before a simulation runs.

use crate::domain::error::RebalanceError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    validate_starting_balance(config)?;
    validate_non_negative(config, "transaction_cost")?;
    validate_non_negative(config, "annual_cost_of_debt")?;
    validate_days_in_year(config)?;
    parse_date(config.get_string("simulation", "end_date").as_deref(), "end_date")?;
    Ok(())
}

fn validate_starting_balance(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    let value = parse_double(config, "simulation", "starting_balance", 0.0)?;
    if !(value.is_finite() && value > 0.0) {
        return Err(RebalanceError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "starting_balance".to_string(),
            reason: "starting_balance must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, key: &str) -> Result<(), RebalanceError> {
    let value = parse_double(config, "simulation", key, 0.0)?;
    if !(value.is_finite() && value >= 0.0) {
        return Err(RebalanceError::ConfigInvalid {
            section: "simulation".to_string(),
            key: key.to_string(),
            reason: format!("{} must be non-negative", key),
        });
    }
    Ok(())
}

fn validate_days_in_year(config: &dyn ConfigPort) -> Result<(), RebalanceError> {
    let value = parse_double(config, "simulation", "days_in_year", 360.0)?;
    if !(value.is_finite() && value > 0.0) {
        return Err(RebalanceError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "days_in_year".to_string(),
            reason: "days_in_year must be positive".to_string(),
        });
    }
    Ok(())
}

/// Numeric config value; `default` only when the key is absent.
pub fn parse_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, RebalanceError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s.trim().parse::<f64>().map_err(|_| RebalanceError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a number, got {:?}", key, s),
        }),
    }
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, RebalanceError> {
    match value {
        None => Err(RebalanceError::ConfigMissing {
            section: "simulation".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            RebalanceError::ConfigInvalid {
                section: "simulation".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}
