use thiserror::Error;

use crate::domain::{EditError, LedgerError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Row not found: {0}")]
    RowNotFound(usize),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Calculation(#[from] LedgerError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
