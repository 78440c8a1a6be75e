use crate::types::Cohort;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Invalid configuration: {field} {reason}")]
    Config { field: String, reason: String },

    #[error("Cohort '{cohort}' missing from results")]
    MissingCohort { cohort: Cohort },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExperimentError {
    pub(crate) fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config { field: field.into(), reason: reason.into() }
    }
}

pub type ExperimentResult<T> = Result<T, ExperimentError>;
