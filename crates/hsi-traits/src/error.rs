//! Error types for the HSI workspace.
//!
//! Three errors are fatal to a run and always carry the name of the offending
//! column or feature: [`HsiError::Schema`], [`HsiError::MissingFeature`] and
//! [`HsiError::Alignment`]. Numeric degeneracies (zero volatility, all-missing
//! columns) are not errors; they surface as NaN values.

use thiserror::Error;

/// The main error type for HSI operations.
#[derive(Debug, Error)]
pub enum HsiError {
    /// A required column (or ticker) is absent from a raw source.
    #[error("Schema error: column '{column}' missing from {source_name}")]
    Schema {
        /// Name of the source (file path or cache key).
        source_name: String,
        /// The missing column or ticker.
        column: String,
    },

    /// A feature required by the index builder is absent from the panel.
    #[error("Missing feature: expected feature '{0}' not found in feature panel")]
    MissingFeature(String),

    /// Signal and returns share no usable dates.
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a date cannot be parsed or is out of range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error fetching data from an external source.
    #[error("Data fetch error: {0}")]
    DataFetch(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl HsiError {
    /// Builds a [`HsiError::Schema`] for `column` missing from `source_name`.
    pub fn schema(source_name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            column: column.into(),
        }
    }
}

/// A specialized Result type for HSI operations.
pub type Result<T> = std::result::Result<T, HsiError>;
