#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hsi/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types, errors and statistics for the healthcare stress index.
//!
//! This crate provides the foundational pieces shared by the loader, the
//! panel and index builders, and the backtest engine: dated series and
//! tables, the error taxonomy, NaN-aware statistics, and the cache capability
//! used for fetched market data.

/// The version of the hsi-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod cache;
pub mod error;
pub mod stats;
pub mod types;

// Re-exports
pub use cache::{MemoryCache, PriceCache};
pub use error::{HsiError, Result};
pub use types::{DATE_COLUMN, Date, DatedSeries, DatedTable, Frequency, month_end};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
