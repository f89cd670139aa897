// =====================================================
// ERROR TYPES
// Every variant is fatal for the run
// =====================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("id column not found: {0}")]
    MissingIdentifierColumn(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Aborted: {0}")]
    Aborted(String),
}

impl From<sqlx::Error> for CopyError {
    fn from(e: sqlx::Error) -> Self {
        CopyError::Query(e.to_string())
    }
}

impl From<std::io::Error> for CopyError {
    fn from(e: std::io::Error) -> Self {
        CopyError::Output(e.to_string())
    }
}

pub type Result<T, E = CopyError> = std::result::Result<T, E>;
