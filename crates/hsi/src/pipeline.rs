//! End-to-end stress index run.
//!
//! A run loads period-end prices through a cache, builds the feature panel and
//! the `HSI` series, aligns the index with next-period returns and evaluates a
//! long/flat strategy on one asset. The panel joined with the index is written
//! to `hsi_panel.parquet`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Local;
use hsi_combine::{CompositeIndexBuilder, HSI_COLUMN, HsiBreakdown, Panel, PanelBuilder};
use hsi_data::{DomainSource, PriceRequest, PriceSource, load_or_fetch_prices, load_source, simple_returns};
use hsi_eval::{BacktestResult, PerformanceSummary, backtest_long_flat};
use hsi_traits::{DatedSeries, DatedTable, HsiError, PriceCache, Result};
use log::{debug, info};
use polars::prelude::ParquetWriter;

use crate::config::HsiConfig;

/// File name of the persisted panel.
pub const PANEL_FILE: &str = "hsi_panel.parquet";

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Filled feature panel.
    pub panel: Panel,
    /// Composite index and its signed components.
    pub index: HsiBreakdown,
    /// Index and next-period returns on common, complete dates.
    pub aligned: DatedTable,
    /// Traded asset.
    pub asset: String,
    /// Long/flat backtest of the index on `asset`.
    pub backtest: BacktestResult,
    /// Headline statistics of the backtest.
    pub summary: PerformanceSummary,
    /// Location of the persisted panel.
    pub panel_path: PathBuf,
}

impl RunReport {
    /// The composite index.
    pub const fn hsi(&self) -> &DatedSeries {
        &self.index.hsi
    }
}

/// Inner-joins `hsi` with `returns`, shifts every return column one row
/// forward and drops rows with any missing value.
///
/// The result holds an `HSI` column followed by the return columns; the
/// return at each date is the return of the next joined period.
///
/// # Errors
///
/// [`HsiError::Alignment`] when no complete row remains.
pub fn align_forward_returns(hsi: &DatedSeries, returns: &DatedTable) -> Result<DatedTable> {
    let rows: Vec<(usize, usize)> = hsi
        .dates()
        .iter()
        .enumerate()
        .filter_map(|(i, date)| returns.dates().binary_search(date).ok().map(|j| (i, j)))
        .collect();
    let dates: Vec<_> = rows.iter().map(|&(i, _)| hsi.dates()[i]).collect();

    let mut columns = vec![(
        hsi.name().to_string(),
        rows.iter().map(|&(i, _)| hsi.values()[i]).collect::<Vec<f64>>(),
    )];
    for (name, values) in returns.columns() {
        let shifted = (0..rows.len())
            .map(|k| rows.get(k + 1).map_or(f64::NAN, |&(_, j)| values[j]))
            .collect();
        columns.push((name.to_string(), shifted));
    }

    let joined = DatedTable::new(dates, columns)?;
    let complete = joined.filter_rows(|row, _| joined.columns().all(|(_, v)| !v[row].is_nan()));
    if complete.is_empty() {
        return Err(HsiError::Alignment(format!(
            "{} and returns have no complete overlapping periods",
            hsi.name()
        )));
    }
    debug!(
        "aligned {} of {} common periods with next-period returns",
        complete.height(),
        joined.height()
    );
    Ok(complete)
}

/// The preferred asset if `table` has it, else the fallback.
///
/// # Errors
///
/// [`HsiError::Config`] when neither column exists.
pub fn select_asset(table: &DatedTable, preferred: &str, fallback: &str) -> Result<String> {
    [preferred, fallback]
        .into_iter()
        .find(|name| table.has_column(name))
        .map(str::to_string)
        .ok_or_else(|| {
            HsiError::Config(format!(
                "neither '{preferred}' nor '{fallback}' has returns"
            ))
        })
}

/// Writes the panel left-joined with `hsi` to `dir/hsi_panel.parquet`.
pub fn write_panel(panel: &Panel, hsi: &DatedSeries, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(PANEL_FILE);

    let mut df = panel.join_series(hsi)?.to_dataframe()?;
    let file = File::create(&path)?;
    ParquetWriter::new(file).finish(&mut df)?;

    info!(
        "wrote panel ({} rows x {} columns) to {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(path)
}

/// Runs the stress index study for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: HsiConfig,
}

impl Pipeline {
    /// Creates a pipeline.
    pub const fn new(config: HsiConfig) -> Self {
        Self { config }
    }

    /// The run configuration.
    pub const fn config(&self) -> &HsiConfig {
        &self.config
    }

    /// Loads the domain sources and builds the filled feature panel.
    pub fn build_panel(&self) -> Result<Panel> {
        let config = &self.config;
        let mut builder = PanelBuilder::new(config.start).with_end(config.end);
        for source in DomainSource::ALL {
            let table = load_source(&config.raw_dir, source, config.frequency)?;
            info!(
                "loaded {} ({} periods, {} columns)",
                source.file_name(),
                table.height(),
                table.width()
            );
            builder = builder.with_table(source.namespace(), table);
        }
        builder.build()
    }

    /// Builds the composite index over `panel`.
    pub fn build_index(&self, panel: &Panel) -> Result<HsiBreakdown> {
        CompositeIndexBuilder::new(self.config.components.clone())
            .with_normalization(self.config.normalization)
            .breakdown(panel)
    }

    /// Period-end simple returns of the configured tickers, at the configured
    /// frequency.
    pub async fn returns<C, S>(&self, cache: &mut C, source: &S) -> Result<DatedTable>
    where
        C: PriceCache + ?Sized,
        S: PriceSource,
    {
        let config = &self.config;
        let end = config.end.unwrap_or_else(|| Local::now().date_naive());
        let request = PriceRequest::new(config.tickers.clone(), config.start, end)
            .with_cache_key(config.price_cache_key.clone())
            .with_frequency(config.frequency);

        let prices = load_or_fetch_prices(cache, source, &request).await?;
        let returns = simple_returns(&prices)?;
        debug!("{} periods of returns for {:?}", returns.height(), config.tickers);
        Ok(returns)
    }

    /// Executes the full run.
    pub async fn run<C, S>(&self, cache: &mut C, source: &S) -> Result<RunReport>
    where
        C: PriceCache + ?Sized,
        S: PriceSource,
    {
        self.config.validate()?;

        let returns = self.returns(cache, source).await?;

        let panel = self.build_panel()?;
        let index = self.build_index(&panel)?;

        let aligned = align_forward_returns(&index.hsi, &returns)?;
        let asset = select_asset(&aligned, &self.config.asset, &self.config.fallback_asset)?;
        info!("trading {asset} on {} aligned periods", aligned.height());

        let signal = aligned
            .series(HSI_COLUMN)
            .ok_or_else(|| HsiError::MissingFeature(HSI_COLUMN.to_string()))?;
        let asset_returns = aligned
            .series(&asset)
            .ok_or_else(|| HsiError::schema("aligned returns", asset.as_str()))?;

        let backtest = backtest_long_flat(&signal, &asset_returns, &self.config.backtest())?;
        let summary = PerformanceSummary::from_result(&backtest, self.config.periods_per_year());

        let panel_path = write_panel(&panel, &index.hsi, &self.config.processed_dir)?;

        Ok(RunReport {
            panel,
            index,
            aligned,
            asset,
            backtest,
            summary,
            panel_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsi_traits::{Date, month_end};

    fn months(n: usize) -> Vec<Date> {
        (0..n)
            .map(|i| month_end(2020 + (i / 12) as i32, (i % 12) as u32 + 1).unwrap())
            .collect()
    }

    #[test]
    fn test_align_shifts_returns_forward() {
        let dates = months(4);
        let hsi = DatedSeries::new(HSI_COLUMN, dates.clone(), vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let returns = DatedTable::new(
            dates[1..].to_vec(),
            vec![("IHF".to_string(), vec![0.01, 0.02, 0.03])],
        )
        .unwrap();

        let aligned = align_forward_returns(&hsi, &returns).unwrap();

        // Common dates are months 1..=3; the last loses its forward return.
        assert_eq!(aligned.dates(), &dates[1..3]);
        assert_eq!(aligned.column(HSI_COLUMN).unwrap(), &[0.2, 0.3]);
        assert_eq!(aligned.column("IHF").unwrap(), &[0.02, 0.03]);
    }

    #[test]
    fn test_align_drops_rows_missing_any_return() {
        let dates = months(4);
        let hsi = DatedSeries::new(HSI_COLUMN, dates.clone(), vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let returns = DatedTable::new(
            dates.clone(),
            vec![
                ("IHF".to_string(), vec![0.01, 0.02, 0.03, 0.04]),
                ("XLV".to_string(), vec![0.01, f64::NAN, 0.03, 0.04]),
            ],
        )
        .unwrap();

        let aligned = align_forward_returns(&hsi, &returns).unwrap();
        assert_eq!(aligned.dates(), &[dates[1], dates[2]]);
    }

    #[test]
    fn test_align_without_overlap() {
        let dates = months(6);
        let hsi = DatedSeries::new(HSI_COLUMN, dates[..2].to_vec(), vec![0.1, 0.2]).unwrap();
        let returns =
            DatedTable::new(dates[3..].to_vec(), vec![("IHF".to_string(), vec![0.0; 3])]).unwrap();

        let err = align_forward_returns(&hsi, &returns).unwrap_err();
        assert!(matches!(err, HsiError::Alignment(_)));
    }

    #[test]
    fn test_select_asset_fallback() {
        let table = DatedTable::new(
            months(1),
            vec![
                ("XLV".to_string(), vec![0.01]),
                ("IYH".to_string(), vec![0.02]),
            ],
        )
        .unwrap();

        assert_eq!(select_asset(&table, "IYH", "XLV").unwrap(), "IYH");
        assert_eq!(select_asset(&table, "IHF", "XLV").unwrap(), "XLV");
        assert!(matches!(
            select_asset(&table, "IHF", "VHT"),
            Err(HsiError::Config(_))
        ));
    }
}
