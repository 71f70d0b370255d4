//! Run configuration.
//!
//! All tunables of a run live in [`HsiConfig`], which is passed explicitly to
//! the [`Pipeline`](crate::Pipeline). Defaults reproduce the reference study:
//! monthly data from 2010, the `XLV`/`IHF`/`IYH` sector funds, trading `IHF`
//! at the 0.7 quantile.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;
use hsi_combine::{Normalization, StressComponents};
use hsi_eval::{BacktestConfig, ThresholdMode};
use hsi_traits::{Date, Frequency, HsiError, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`HsiConfig::raw_dir`].
pub const ENV_RAW_DIR: &str = "HSI_RAW_DIR";
/// Environment variable overriding [`HsiConfig::processed_dir`].
pub const ENV_PROCESSED_DIR: &str = "HSI_PROCESSED_DIR";
/// Environment variable overriding [`HsiConfig::start`].
pub const ENV_START: &str = "HSI_START";
/// Environment variable overriding [`HsiConfig::end`].
pub const ENV_END: &str = "HSI_END";
/// Environment variable overriding [`HsiConfig::tickers`] (comma separated).
pub const ENV_TICKERS: &str = "HSI_TICKERS";
/// Environment variable overriding [`HsiConfig::asset`].
pub const ENV_ASSET: &str = "HSI_ASSET";
/// Environment variable overriding [`HsiConfig::quantile`].
pub const ENV_QUANTILE: &str = "HSI_QUANTILE";

/// Configuration of a stress index run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsiConfig {
    /// Directory holding the domain CSVs and the price cache.
    pub raw_dir: PathBuf,
    /// Directory receiving `hsi_panel.parquet`.
    pub processed_dir: PathBuf,
    /// First date of the analysis window.
    pub start: Date,
    /// Last date of the analysis window; `None` means the run date.
    pub end: Option<Date>,
    /// Sampling frequency of every series.
    pub frequency: Frequency,
    /// Tickers whose prices are loaded.
    pub tickers: Vec<String>,
    /// Preferred traded asset.
    pub asset: String,
    /// Traded asset when the preferred one has no returns.
    pub fallback_asset: String,
    /// Cache entry holding the prices.
    pub price_cache_key: String,
    /// Long threshold quantile.
    pub quantile: f64,
    /// Threshold derivation.
    pub threshold_mode: ThresholdMode,
    /// Z-score standardization.
    pub normalization: Normalization,
    /// Index components by stress direction.
    pub components: StressComponents,
}

impl Default for HsiConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            end: None,
            frequency: Frequency::Monthly,
            tickers: vec!["XLV".to_string(), "IHF".to_string(), "IYH".to_string()],
            asset: "IHF".to_string(),
            fallback_asset: "XLV".to_string(),
            price_cache_key: "prices_sector_etfs".to_string(),
            quantile: 0.7,
            threshold_mode: ThresholdMode::FullSample,
            normalization: Normalization::FullSample,
            components: StressComponents::default(),
        }
    }
}

fn parse_env_date(key: &str, raw: &str) -> Result<Date> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| HsiError::Config(format!("{key}='{raw}': {e}")))
}

impl HsiConfig {
    /// Defaults overridden by `HSI_*` environment variables, after loading a
    /// `.env` file when one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overridden by the values `lookup` returns for the `HSI_*`
    /// keys. Blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(ENV_RAW_DIR) {
            config.raw_dir = dir.into();
        }
        if let Some(dir) = get(ENV_PROCESSED_DIR) {
            config.processed_dir = dir.into();
        }
        if let Some(raw) = get(ENV_START) {
            config.start = parse_env_date(ENV_START, &raw)?;
        }
        if let Some(raw) = get(ENV_END) {
            config.end = Some(parse_env_date(ENV_END, &raw)?);
        }
        if let Some(raw) = get(ENV_TICKERS) {
            config.tickers = raw
                .split(',')
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(asset) = get(ENV_ASSET) {
            config.asset = asset.trim().to_uppercase();
        }
        if let Some(raw) = get(ENV_QUANTILE) {
            config.quantile = raw
                .trim()
                .parse()
                .map_err(|e| HsiError::Config(format!("{ENV_QUANTILE}='{raw}': {e}")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values no run can use.
    ///
    /// # Errors
    ///
    /// [`HsiError::Config`] for a quantile outside `[0, 1]`, an end before the
    /// start, or an empty ticker list.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(HsiError::Config(format!(
                "quantile must be within [0, 1], got {}",
                self.quantile
            )));
        }
        if let Some(end) = self.end
            && end < self.start
        {
            return Err(HsiError::Config(format!(
                "end {end} is before start {}",
                self.start
            )));
        }
        if self.tickers.is_empty() {
            return Err(HsiError::Config("no tickers configured".to_string()));
        }
        Ok(())
    }

    /// Periods per year of the configured frequency.
    pub const fn periods_per_year(&self) -> usize {
        self.frequency.periods_per_year()
    }

    /// Backtest settings derived from this configuration.
    pub const fn backtest(&self) -> BacktestConfig {
        BacktestConfig {
            quantile: self.quantile,
            threshold: self.threshold_mode,
        }
    }
}
