//! Error types for the profile reshaping layer

use thiserror::Error;

/// Errors raised while preparing cluster profile data
#[derive(Error, Debug)]
pub enum ProfileError {
    /// A per-row input does not have one entry per table row
    #[error("{what} has {actual} entries but the table has {expected} rows")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A requested column is not present in the table
    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("no metric columns given")]
    EmptyMetrics,

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
