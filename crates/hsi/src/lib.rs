#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # hsi
//!
//! Healthcare stress index: a composite of utilization, insurer margin and
//! employment indicators, evaluated as a long/flat timing signal on a
//! healthcare sector fund.
//!
//! hsi is an umbrella crate that re-exports the hsi sub-crates and provides
//! the end-to-end [`Pipeline`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use hsi::{FileCache, HsiConfig, Pipeline, YahooClient};
//!
//! # async fn example() -> hsi::Result<()> {
//! let config = HsiConfig::from_env()?;
//! let mut cache = FileCache::new(&config.raw_dir);
//! let client = YahooClient::new()?;
//!
//! let report = Pipeline::new(config).run(&mut cache, &client).await?;
//! println!("strategy sharpe: {:.2}", report.summary.sharpe_strat);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types, errors, statistics and the price cache interface
//! - [`data`] - CSV sources, price resampling and the Yahoo chart client
//! - [`combine`] - Feature panel and composite index construction
//! - [`eval`] - Long/flat backtest and performance statistics
//!
//! ## Architecture
//!
//! 1. **Sources** are loaded as canonical month-end tables
//! 2. **The panel** outer-joins them under `util_`, `mlr_` and `emp_` prefixes
//! 3. **The index** averages signed z-scores of the stress components
//! 4. **The backtest** goes long when the index exceeds a quantile threshold
//!
//! ## Look-ahead
//!
//! The default full-sample z-scores and threshold use the whole sample. Set
//! [`Normalization::Expanding`] and [`ThresholdMode::Expanding`] for a causal
//! variant.

mod config;
mod pipeline;

/// Version information for the hsi crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::{
    ENV_ASSET, ENV_END, ENV_PROCESSED_DIR, ENV_QUANTILE, ENV_RAW_DIR, ENV_START, ENV_TICKERS,
    HsiConfig,
};
pub use pipeline::{PANEL_FILE, Pipeline, RunReport, align_forward_returns, select_asset, write_panel};

// ============================================================================
// Sub-crates
// ============================================================================

/// Core types, errors and statistics.
pub mod traits {
    pub use hsi_traits::*;
}

/// Raw sources and market data.
pub mod data {
    pub use hsi_data::*;
}

/// Panel assembly and index construction.
pub mod combine {
    pub use hsi_combine::*;
}

/// Backtesting and performance statistics.
pub mod eval {
    pub use hsi_eval::*;
}

// Re-export common types at top level
pub use hsi_combine::{Normalization, Panel, StressComponents};
pub use hsi_data::{FileCache, PriceSource, YahooClient};
pub use hsi_eval::{BacktestResult, PerformanceSummary, ThresholdMode};
pub use hsi_traits::{Date, DatedSeries, DatedTable, HsiError, MemoryCache, PriceCache, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
    }

    #[test]
    fn test_error_types() {
        let _result: Result<()> = Ok(());
        let error = HsiError::MissingFeature("mlr_mlr".to_string());
        assert!(error.to_string().contains("mlr_mlr"));
    }
}
