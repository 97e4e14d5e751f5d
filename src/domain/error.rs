//! Domain error types.

use chrono::NaiveDate;

fn period_label(period: &Option<usize>) -> String {
    match period {
        Some(i) => format!("period {i}: "),
        None => String::new(),
    }
}

/// Top-level error type for rebalsim.
#[derive(Debug, thiserror::Error)]
pub enum RebalanceError {
    #[error("{}invalid input: {reason}", period_label(.period))]
    InvalidInput {
        period: Option<usize>,
        reason: String,
    },

    #[error("{}invalid date range {from} to {to}: {reason}", period_label(.period))]
    DateRange {
        period: Option<usize>,
        from: NaiveDate,
        to: NaiveDate,
        reason: String,
    },

    #[error("period {period}: non-finite ending weights for {}", .assets.join(", "))]
    CorruptState { period: usize, assets: Vec<String> },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RebalanceError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        RebalanceError::InvalidInput {
            period: None,
            reason: reason.into(),
        }
    }

    /// Attach a period index to an input or date-range error that has none yet.
    pub fn in_period(self, index: usize) -> Self {
        match self {
            RebalanceError::InvalidInput {
                period: None,
                reason,
            } => RebalanceError::InvalidInput {
                period: Some(index),
                reason,
            },
            RebalanceError::DateRange {
                period: None,
                from,
                to,
                reason,
            } => RebalanceError::DateRange {
                period: Some(index),
                from,
                to,
                reason,
            },
            other => other,
        }
    }

    /// Period index the error is attributed to, if any.
    pub fn period(&self) -> Option<usize> {
        match self {
            RebalanceError::InvalidInput { period, .. }
            | RebalanceError::DateRange { period, .. } => *period,
            RebalanceError::CorruptState { period, .. } => Some(*period),
            _ => None,
        }
    }
}

impl From<&RebalanceError> for std::process::ExitCode {
    fn from(err: &RebalanceError) -> Self {
        let code: u8 = match err {
            RebalanceError::Io(_) => 1,
            RebalanceError::ConfigParse { .. }
            | RebalanceError::ConfigMissing { .. }
            | RebalanceError::ConfigInvalid { .. } => 2,
            RebalanceError::Data { .. } => 3,
            RebalanceError::InvalidInput { .. } | RebalanceError::DateRange { .. } => 4,
            RebalanceError::CorruptState { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn in_period_tags_untagged_errors() {
        let err = RebalanceError::invalid_input("bad weights").in_period(3);
        assert_eq!(err.period(), Some(3));
        assert_eq!(err.to_string(), "period 3: invalid input: bad weights");
    }

    #[test]
    fn in_period_keeps_existing_tag() {
        let err = RebalanceError::InvalidInput {
            period: Some(1),
            reason: "x".into(),
        }
        .in_period(7);
        assert_eq!(err.period(), Some(1));
    }

    #[test]
    fn date_range_display() {
        let err = RebalanceError::DateRange {
            period: None,
            from: date(2024, 1, 1),
            to: date(2024, 2, 1),
            reason: "end date not in price index".into(),
        }
        .in_period(0);
        assert_eq!(
            err.to_string(),
            "period 0: invalid date range 2024-01-01 to 2024-02-01: end date not in price index"
        );
    }

    #[test]
    fn corrupt_state_lists_assets() {
        let err = RebalanceError::CorruptState {
            period: 2,
            assets: vec!["AAA".into(), "BBB".into()],
        };
        assert_eq!(
            err.to_string(),
            "period 2: non-finite ending weights for AAA, BBB"
        );
    }

    #[test]
    fn exit_codes() {
        use std::process::ExitCode;
        let code = |e: &RebalanceError| format!("{:?}", ExitCode::from(e));
        let config = RebalanceError::ConfigMissing {
            section: "simulation".into(),
            key: "end_date".into(),
        };
        assert_eq!(code(&config), format!("{:?}", ExitCode::from(2)));
        let data = RebalanceError::Data {
            reason: "missing".into(),
        };
        assert_eq!(code(&data), format!("{:?}", ExitCode::from(3)));
        let input = RebalanceError::invalid_input("x");
        assert_eq!(code(&input), format!("{:?}", ExitCode::from(4)));
    }
}
