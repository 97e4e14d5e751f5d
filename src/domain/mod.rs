//! Core domain types and logic.

pub mod weights;
pub mod returns;
pub mod schedule;
pub mod trajectory;
pub mod costs;
pub mod ruin;
pub mod period;
pub mod simulation;
pub mod config_validation;
pub mod error;
