//! Error taxonomy.
//!
//! Client-input faults are [`ValidationError`]s and are reported back to
//! the caller verbatim. Storage and export faults are server faults.

use thiserror::Error;

/// Rejection of a survey name or an assessment submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("scores array must contain 8 elements")]
    Shape,

    #[error("scores must be between 1 and 5")]
    Range,

    #[error("missing required fields")]
    MissingField,

    #[error("survey name must not be empty")]
    EmptyName,

    #[error("survey name must not exceed 100 characters")]
    NameTooLong,
}

/// Failure inside a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("stored value is invalid: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("storage task failed: {0}")]
    Task(String),
}

/// Failure of a registry operation: either the caller's input or the store.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure while rendering the export workbook.
#[derive(Debug, Error)]
#[error("export failed: {0}")]
pub struct ExportError(#[from] pub rust_xlsxwriter::XlsxError);
