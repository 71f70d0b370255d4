//! Long/flat signal backtest.
//!
//! A continuous signal is binarized against a quantile threshold: the strategy
//! holds the asset (position 1) when the signal strictly exceeds the
//! threshold and is in cash (position 0) otherwise.
//!
//! # Look-ahead
//!
//! With [`ThresholdMode::FullSample`] (the default) the threshold is computed
//! over the whole joined sample, so positions depend on later signal values.
//! [`ThresholdMode::Expanding`] uses only signal values up to each date.
//!
//! No shifting happens here. If the signal at `t` is meant to predict the
//! return at `t + 1`, pass returns already shifted with [`shift_forward`].

use hsi_traits::stats::quantile;
use hsi_traits::{Date, DatedSeries, HsiError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// How the position threshold is derived from the signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ThresholdMode {
    /// One threshold from the full joined sample.
    #[default]
    FullSample,
    /// Threshold at each date from signal values up to and including it.
    /// Flat until `min_periods` values have been seen.
    Expanding {
        /// Signal values required before a position can be taken.
        min_periods: usize,
    },
}

/// Backtesting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Quantile of the signal used as the long threshold.
    pub quantile: f64,
    /// Threshold derivation.
    pub threshold: ThresholdMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            quantile: 0.7,
            threshold: ThresholdMode::FullSample,
        }
    }
}

/// Backtest output: one row per date where both signal and return exist.
///
/// Invariant: `strat_ret[t] == position[t] * asset_ret[t]` for every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Row dates.
    pub dates: Vec<Date>,
    /// Signal value.
    pub signal: Vec<f64>,
    /// Position, 0 (flat) or 1 (long).
    pub position: Vec<u8>,
    /// Asset return.
    pub asset_ret: Vec<f64>,
    /// Strategy return.
    pub strat_ret: Vec<f64>,
    /// Full-sample threshold; `None` for expanding thresholds.
    pub threshold: Option<f64>,
}

/// One row of a [`BacktestResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestRow {
    /// Row date.
    pub date: Date,
    /// Signal value.
    pub signal: f64,
    /// Position, 0 or 1.
    pub position: u8,
    /// Asset return.
    pub asset_ret: f64,
    /// Strategy return.
    pub strat_ret: f64,
}

impl BacktestResult {
    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the result has no rows.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of long periods.
    pub fn n_long(&self) -> usize {
        self.position.iter().filter(|&&p| p == 1).count()
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = BacktestRow> + '_ {
        (0..self.len()).map(|i| BacktestRow {
            date: self.dates[i],
            signal: self.signal[i],
            position: self.position[i],
            asset_ret: self.asset_ret[i],
            strat_ret: self.strat_ret[i],
        })
    }
}

/// Series whose value at each date is the value `periods` rows later.
///
/// The last `periods` entries become NaN.
pub fn shift_forward(series: &DatedSeries, periods: usize) -> Result<DatedSeries> {
    let values = series.values();
    let shifted = (0..values.len())
        .map(|i| values.get(i + periods).copied().unwrap_or(f64::NAN))
        .collect();
    DatedSeries::new(series.name(), series.dates().to_vec(), shifted)
}

/// Inner-join two series on date, dropping dates where either is NaN.
fn align(signal: &DatedSeries, returns: &DatedSeries) -> (Vec<Date>, Vec<f64>, Vec<f64>) {
    let mut dates = Vec::new();
    let mut sig = Vec::new();
    let mut ret = Vec::new();

    for (date, s) in signal.iter() {
        if s.is_nan() {
            continue;
        }
        if let Some(r) = returns.get(date).filter(|r| !r.is_nan()) {
            dates.push(date);
            sig.push(s);
            ret.push(r);
        }
    }

    (dates, sig, ret)
}

/// Long/flat backtest of `signal` against `returns`.
///
/// # Errors
///
/// - [`HsiError::InvalidData`] when the quantile is outside `[0, 1]`.
/// - [`HsiError::Alignment`] when the series share no date with both values
///   present.
pub fn backtest_long_flat(
    signal: &DatedSeries,
    returns: &DatedSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult> {
    if !(0.0..=1.0).contains(&config.quantile) {
        return Err(HsiError::InvalidData(format!(
            "quantile must be within [0, 1], got {}",
            config.quantile
        )));
    }

    let (dates, sig, asset_ret) = align(signal, returns);
    if dates.is_empty() {
        return Err(HsiError::Alignment(format!(
            "signal '{}' and returns '{}' have no overlapping observations",
            signal.name(),
            returns.name()
        )));
    }
    debug!("aligned {} observations for backtest", dates.len());

    let (position, threshold): (Vec<u8>, Option<f64>) = match config.threshold {
        ThresholdMode::FullSample => {
            let thresh = quantile(&sig, config.quantile);
            info!(
                "long threshold at q={:.2}: {:.6}",
                config.quantile, thresh
            );
            (sig.iter().map(|&s| u8::from(s > thresh)).collect(), Some(thresh))
        }
        ThresholdMode::Expanding { min_periods } => {
            let position = (0..sig.len())
                .map(|t| {
                    if t + 1 < min_periods {
                        return 0;
                    }
                    let thresh = quantile(&sig[..=t], config.quantile);
                    u8::from(sig[t] > thresh)
                })
                .collect();
            (position, None)
        }
    };

    let strat_ret = position
        .iter()
        .zip(&asset_ret)
        .map(|(&p, &r)| f64::from(p) * r)
        .collect();

    Ok(BacktestResult {
        dates,
        signal: sig,
        position,
        asset_ret,
        strat_ret,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsi_traits::month_end;

    fn months(n: usize) -> Vec<Date> {
        (0..n)
            .map(|i| month_end(2020 + (i / 12) as i32, (i % 12) as u32 + 1).unwrap())
            .collect()
    }

    fn series(name: &str, values: Vec<f64>) -> DatedSeries {
        DatedSeries::new(name, months(values.len()), values).unwrap()
    }

    #[test]
    fn test_backtest_config_default() {
        let config = BacktestConfig::default();
        assert_eq!(config.quantile, 0.7);
        assert_eq!(config.threshold, ThresholdMode::FullSample);
    }

    #[test]
    fn test_strat_ret_is_position_times_return() {
        let signal = series("HSI", vec![0.1, 0.9, -0.4, 1.2, 0.3, 0.8, -1.0, 2.0]);
        let returns = series("IHF", vec![0.01, -0.02, 0.03, 0.015, -0.005, 0.02, 0.0, -0.01]);

        let result = backtest_long_flat(&signal, &returns, &BacktestConfig::default()).unwrap();

        for row in result.rows() {
            assert_eq!(row.strat_ret, f64::from(row.position) * row.asset_ret);
            assert!(row.position == 0 || row.position == 1);
        }
    }

    #[test]
    fn test_position_iff_signal_above_quantile() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let signal = series("HSI", values.clone());
        let returns = series("r", vec![0.01; 10]);

        let result = backtest_long_flat(&signal, &returns, &BacktestConfig::default()).unwrap();

        let thresh = quantile(&values, 0.7);
        assert_eq!(result.threshold, Some(thresh));
        for row in result.rows() {
            assert_eq!(row.position == 1, row.signal > thresh);
        }
        // 1..=10 at q=0.7 -> threshold 7.3 -> 8, 9, 10 long
        assert_eq!(result.n_long(), 3);
    }

    #[test]
    fn test_inner_join_drops_missing() {
        let signal = series("HSI", vec![f64::NAN, 1.0, 2.0, 3.0]);
        let returns = DatedSeries::new("r", months(3), vec![0.01, f64::NAN, 0.02]).unwrap();

        let result = backtest_long_flat(&signal, &returns, &BacktestConfig::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.dates[0], months(3)[2]);
    }

    #[test]
    fn test_no_overlap_is_alignment_error() {
        let signal = series("HSI", vec![1.0, 2.0]);
        let later: Vec<Date> = months(6)[4..].to_vec();
        let returns = DatedSeries::new("r", later, vec![0.01, 0.02]).unwrap();

        let err = backtest_long_flat(&signal, &returns, &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, HsiError::Alignment(_)));
    }

    #[test]
    fn test_invalid_quantile() {
        let signal = series("HSI", vec![1.0, 2.0]);
        let config = BacktestConfig {
            quantile: 1.5,
            ..Default::default()
        };
        let err = backtest_long_flat(&signal, &signal, &config).unwrap_err();
        assert!(matches!(err, HsiError::InvalidData(_)));
    }

    #[test]
    fn test_expanding_threshold_ignores_future() {
        let signal = series("HSI", vec![1.0, 2.0, 3.0, 0.0, 10.0, -5.0]);
        let returns = series("r", vec![0.01; 6]);
        let config = BacktestConfig {
            quantile: 0.5,
            threshold: ThresholdMode::Expanding { min_periods: 2 },
        };

        let full = backtest_long_flat(&signal, &returns, &config).unwrap();
        let head = backtest_long_flat(
            &series("HSI", vec![1.0, 2.0, 3.0, 0.0]),
            &series("r", vec![0.01; 4]),
            &config,
        )
        .unwrap();

        assert_eq!(full.threshold, None);
        assert_eq!(full.position[0], 0);
        assert_eq!(&full.position[..4], head.position.as_slice());
        assert_eq!(full.position[4], 1);
        assert_eq!(full.position[5], 0);
    }

    #[test]
    fn test_shift_forward() {
        let s = series("r", vec![1.0, 2.0, 3.0]);
        let shifted = shift_forward(&s, 1).unwrap();
        assert_eq!(&shifted.values()[..2], &[2.0, 3.0]);
        assert!(shifted.values()[2].is_nan());
        assert_eq!(shifted.dates(), s.dates());
    }
}
