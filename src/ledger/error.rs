use thiserror::Error;

use crate::models::RecordId;

#[derive(Error, Debug)]
pub(crate) enum LedgerError {
    #[error("Budget category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Index {index} is out of range ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No record with id {0}")]
    UnknownRecord(RecordId),

    #[error("Failed to save changes: {0:#}")]
    Persistence(#[source] anyhow::Error),
}
