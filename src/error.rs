//! Error types for option validation and attempt import.
//!
//! Too little data is not an error: the engine reports it as `None` results
//! and an insufficient-data tip.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Analysis options out of range.
    #[error("invalid analysis options: {0}")]
    InvalidOptions(String),

    /// An attempt row that cannot describe a real session.
    #[error("invalid attempt record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
