//! Cumulative growth curves for a backtest.

use std::path::Path;

use hsi_traits::{Date, Result};
use log::info;
use serde::Serialize;

use crate::backtest::BacktestResult;

/// Growth of one unit invested in the strategy and in the asset.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthCurve {
    /// Curve dates.
    pub dates: Vec<Date>,
    /// Cumulative product of `1 + strat_ret`.
    pub strategy: Vec<f64>,
    /// Cumulative product of `1 + asset_ret`.
    pub asset: Vec<f64>,
}

#[derive(Serialize)]
struct CurveRow {
    date: Date,
    strategy: f64,
    buy_and_hold: f64,
}

fn cumprod(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |wealth, r| {
            *wealth *= 1.0 + r;
            Some(*wealth)
        })
        .collect()
}

/// Largest peak-to-trough decline of a growth curve, as a positive fraction.
pub fn max_drawdown(growth: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in growth {
        peak = peak.max(value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst
}

/// Cumulative growth of the strategy and buy-and-hold returns.
pub fn cumulative_growth(result: &BacktestResult) -> GrowthCurve {
    GrowthCurve {
        dates: result.dates.clone(),
        strategy: cumprod(&result.strat_ret),
        asset: cumprod(&result.asset_ret),
    }
}

impl GrowthCurve {
    /// Number of points.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the curve has no points.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Final strategy wealth, 1.0 for an empty curve.
    pub fn final_strategy(&self) -> f64 {
        self.strategy.last().copied().unwrap_or(1.0)
    }

    /// Final buy-and-hold wealth, 1.0 for an empty curve.
    pub fn final_asset(&self) -> f64 {
        self.asset.last().copied().unwrap_or(1.0)
    }

    /// Write `date,strategy,buy_and_hold` rows to CSV.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        for i in 0..self.len() {
            writer.serialize(CurveRow {
                date: self.dates[i],
                strategy: self.strategy[i],
                buy_and_hold: self.asset[i],
            })?;
        }
        writer.flush()?;
        info!("wrote {} growth curve rows to {}", self.len(), path.display());
        Ok(())
    }
}
