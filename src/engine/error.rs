use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("header row not found: no row starts with a cell containing {marker:?}")]
    HeaderNotFound { marker: String },

    #[error("invalid format config: {0}")]
    InvalidConfig(String),

    #[error("failed to compile extraction pattern: {0}")]
    Regex(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MalformedDateRange { row: usize, text: String },
    UnrecognizedPeriodNumber { row: usize, value: String },
}

impl Diagnostic {
    pub fn row(&self) -> usize {
        match self {
            Diagnostic::MalformedDateRange { row, .. }
            | Diagnostic::UnrecognizedPeriodNumber { row, .. } => *row,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedDateRange { row, text } => {
                write!(f, "row {row}: banner has no valid date range: {text:?}")
            }
            Diagnostic::UnrecognizedPeriodNumber { row, value } => {
                write!(f, "row {row}: unrecognized period number {value:?}")
            }
        }
    }
}
