//! Performance statistics for backtest returns.
//!
//! Annualization compounds the mean periodic return and scales the sample
//! standard deviation by the square root of the number of periods per year.
//! No risk-free rate is subtracted.

use hsi_traits::stats::{nan_mean, nan_std};
use log::info;
use serde::{Deserialize, Serialize};

use crate::backtest::BacktestResult;

/// Periods per year for monthly data.
pub const MONTHLY_PERIODS: usize = 12;

/// Annualized return: `(1 + mean(r))^ppy - 1`.
pub fn annualized_return(returns: &[f64], periods_per_year: usize) -> f64 {
    (1.0 + nan_mean(returns)).powf(periods_per_year as f64) - 1.0
}

/// Annualized volatility: sample standard deviation times `sqrt(ppy)`.
pub fn annualized_volatility(returns: &[f64], periods_per_year: usize) -> f64 {
    nan_std(returns, 1) * (periods_per_year as f64).sqrt()
}

/// Annualized return over annualized volatility.
///
/// NaN when the volatility is exactly zero.
pub fn sharpe_ratio(ann_return: f64, ann_vol: f64) -> f64 {
    if ann_vol == 0.0 {
        f64::NAN
    } else {
        ann_return / ann_vol
    }
}

/// Headline statistics of a long/flat backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Annualized strategy return.
    pub ann_return_strat: f64,
    /// Annualized buy-and-hold return.
    pub ann_return_asset: f64,
    /// Annualized strategy volatility.
    pub ann_vol_strat: f64,
    /// Annualized buy-and-hold volatility.
    pub ann_vol_asset: f64,
    /// Strategy Sharpe ratio.
    pub sharpe_strat: f64,
    /// Buy-and-hold Sharpe ratio.
    pub sharpe_asset: f64,
    /// Number of backtest rows.
    pub n_periods: usize,
}

impl PerformanceSummary {
    /// Summarize a backtest.
    ///
    /// Degenerate inputs yield NaN statistics rather than errors.
    pub fn from_result(result: &BacktestResult, periods_per_year: usize) -> Self {
        let ann_return_strat = annualized_return(&result.strat_ret, periods_per_year);
        let ann_return_asset = annualized_return(&result.asset_ret, periods_per_year);
        let ann_vol_strat = annualized_volatility(&result.strat_ret, periods_per_year);
        let ann_vol_asset = annualized_volatility(&result.asset_ret, periods_per_year);

        let summary = Self {
            ann_return_strat,
            ann_return_asset,
            ann_vol_strat,
            ann_vol_asset,
            sharpe_strat: sharpe_ratio(ann_return_strat, ann_vol_strat),
            sharpe_asset: sharpe_ratio(ann_return_asset, ann_vol_asset),
            n_periods: result.len(),
        };
        info!(
            "performance over {} periods: strategy sharpe {:.3}, asset sharpe {:.3}",
            summary.n_periods, summary.sharpe_strat, summary.sharpe_asset
        );
        summary
    }

    /// Fixed-order `(key, value)` pairs for display.
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("ann_return_strat", self.ann_return_strat),
            ("ann_return_asset", self.ann_return_asset),
            ("ann_vol_strat", self.ann_vol_strat),
            ("ann_vol_asset", self.ann_vol_asset),
            ("sharpe_strat", self.sharpe_strat),
            ("sharpe_asset", self.sharpe_asset),
            ("n_periods", self.n_periods as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hsi_traits::month_end;

    fn result(position: Vec<u8>, asset_ret: Vec<f64>) -> BacktestResult {
        let n = asset_ret.len();
        let dates = (0..n)
            .map(|i| month_end(2021, i as u32 + 1).unwrap())
            .collect();
        let strat_ret = position
            .iter()
            .zip(&asset_ret)
            .map(|(&p, &r)| f64::from(p) * r)
            .collect();
        BacktestResult {
            dates,
            signal: vec![0.0; n],
            position,
            asset_ret,
            strat_ret,
            threshold: Some(0.0),
        }
    }

    #[test]
    fn test_annualized_return() {
        assert_abs_diff_eq!(
            annualized_return(&[0.01, 0.01, 0.01], 12),
            1.01_f64.powi(12) - 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_annualized_volatility_uses_sample_std() {
        // sample std of [0.0, 0.02] is sqrt(2) * 0.01
        let vol = annualized_volatility(&[0.0, 0.02], 12);
        assert_abs_diff_eq!(vol, 0.01 * 2.0_f64.sqrt() * 12.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_is_exact_ratio() {
        let summary =
            PerformanceSummary::from_result(&result(vec![1, 0, 1, 1], vec![0.02, -0.01, 0.03, 0.01]), 12);
        assert_eq!(
            summary.sharpe_strat,
            summary.ann_return_strat / summary.ann_vol_strat
        );
        assert_eq!(
            summary.sharpe_asset,
            summary.ann_return_asset / summary.ann_vol_asset
        );
        assert_eq!(summary.n_periods, 4);
    }

    #[test]
    fn test_always_flat_strategy() {
        let summary =
            PerformanceSummary::from_result(&result(vec![0, 0, 0], vec![0.02, -0.01, 0.03]), 12);
        assert_eq!(summary.ann_return_strat, 0.0);
        assert_eq!(summary.ann_vol_strat, 0.0);
        assert!(summary.sharpe_strat.is_nan());
        assert!(summary.sharpe_asset.is_finite());
    }

    #[test]
    fn test_single_row_has_nan_volatility() {
        let summary = PerformanceSummary::from_result(&result(vec![1], vec![0.02]), 12);
        assert!(summary.ann_vol_strat.is_nan());
        assert!(summary.sharpe_strat.is_nan());
        assert_eq!(summary.n_periods, 1);
    }

    #[test]
    fn test_summary_serializes_fixed_keys() {
        let summary =
            PerformanceSummary::from_result(&result(vec![1, 0], vec![0.02, -0.01]), MONTHLY_PERIODS);
        let json = serde_json::to_value(summary).unwrap();
        for (key, _) in summary.entries() {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
