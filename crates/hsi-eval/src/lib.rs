//! Backtesting and performance evaluation for the health stress index.
//!
//! This crate provides:
//! - Long/flat position translation against a signal quantile
//! - Annualized return, volatility and Sharpe statistics
//! - Cumulative growth curves with CSV export
//!
//! # Example
//!
//! ```rust,ignore
//! use hsi_eval::{BacktestConfig, PerformanceSummary, backtest_long_flat, shift_forward};
//!
//! // HSI at t predicts the return at t + 1
//! let forward = shift_forward(&returns, 1)?;
//! let result = backtest_long_flat(&hsi, &forward, &BacktestConfig::default())?;
//! let summary = PerformanceSummary::from_result(&result, 12);
//! ```

pub mod backtest;
pub mod curve;
pub mod metrics;

// Re-export main types
pub use backtest::{
    BacktestConfig, BacktestResult, BacktestRow, ThresholdMode, backtest_long_flat, shift_forward,
};
pub use curve::{GrowthCurve, cumulative_growth, max_drawdown};
pub use metrics::{
    MONTHLY_PERIODS, PerformanceSummary, annualized_return, annualized_volatility, sharpe_ratio,
};
