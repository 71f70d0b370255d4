//! Market prices: period-end resampling, simple returns and cached read-through.

use hsi_traits::stats::forward_fill;
use hsi_traits::{Date, DatedTable, Frequency, HsiError, PriceCache, Result};
use log::{debug, info};
use std::future::Future;

/// Source of daily adjusted close prices.
pub trait PriceSource {
    /// Fetch daily adjusted closes for `tickers` between `start` and `end`
    /// (inclusive). Returns one column per ticker named after it.
    fn fetch_daily(
        &self,
        tickers: &[String],
        start: Date,
        end: Date,
    ) -> impl Future<Output = Result<DatedTable>> + Send;
}

/// Parameters of a price lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    /// Tickers to return, in output column order.
    pub tickers: Vec<String>,
    /// First date to fetch when the cache is cold.
    pub start: Date,
    /// Last date to fetch when the cache is cold.
    pub end: Date,
    /// Cache entry to read or populate.
    pub cache_key: String,
    /// Period the daily prices are resampled to.
    pub frequency: Frequency,
}

impl PriceRequest {
    /// Request keyed by the ticker set.
    pub fn new(tickers: Vec<String>, start: Date, end: Date) -> Self {
        let cache_key = cache_key_for(&tickers);
        Self {
            tickers,
            start,
            end,
            cache_key,
            frequency: Frequency::Monthly,
        }
    }

    /// Resample to period ends of `frequency` instead of month ends.
    pub const fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Cache entry actually used: the cache key, suffixed with the frequency
    /// name unless monthly.
    pub fn entry_key(&self) -> String {
        match self.frequency {
            Frequency::Monthly => self.cache_key.clone(),
            other => format!("{}_{}", self.cache_key, other.as_str()),
        }
    }

    /// Overrides the cache key.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }
}

/// Cache key for a ticker set: `prices_` followed by the sorted, lowercased
/// tickers joined by `_`.
pub fn cache_key_for(tickers: &[String]) -> String {
    let mut names: Vec<String> = tickers.iter().map(|t| t.to_lowercase()).collect();
    names.sort();
    names.dedup();
    format!("prices_{}", names.join("_"))
}

/// Month-end resampling of daily prices.
///
/// Prices are forward-filled in date order and the last value of each month
/// is kept, dated at the month end. Months without any observation carry the
/// previous month's price.
pub fn resample_month_end(daily: &DatedTable) -> Result<DatedTable> {
    resample_last(daily, Frequency::Monthly)
}

/// Resample to period ends of `frequency`, keeping the last forward-filled
/// value in each period.
pub fn resample_last(daily: &DatedTable, frequency: Frequency) -> Result<DatedTable> {
    let (Some(&first), Some(&last)) = (daily.dates().first(), daily.dates().last()) else {
        return Ok(daily.clone());
    };
    let first = frequency.period_index(first);
    let last = frequency.period_index(last);

    let dates = (first..=last)
        .map(|idx| frequency.period_end_from_index(idx))
        .collect::<Result<Vec<_>>>()?;

    let columns = daily
        .columns()
        .map(|(name, values)| {
            let mut filled = values.to_vec();
            forward_fill(&mut filled);

            let mut out = vec![f64::NAN; dates.len()];
            for (date, value) in daily.dates().iter().zip(&filled) {
                out[(frequency.period_index(*date) - first) as usize] = *value;
            }
            forward_fill(&mut out);
            (name.to_string(), out)
        })
        .collect();

    DatedTable::new(dates, columns)
}

/// Simple percentage returns per column.
///
/// The first row is dropped, then every row where any column's return is
/// missing.
pub fn simple_returns(prices: &DatedTable) -> Result<DatedTable> {
    let returns: Vec<Vec<f64>> = prices
        .columns()
        .map(|(_, p)| {
            p.windows(2)
                .map(|w| w[1] / w[0] - 1.0)
                .collect::<Vec<f64>>()
        })
        .collect();

    let n = prices.height().saturating_sub(1);
    let keep: Vec<usize> = (0..n)
        .filter(|&row| returns.iter().all(|col| col[row].is_finite()))
        .collect();

    let dates = keep.iter().map(|&row| prices.dates()[row + 1]).collect();
    let columns = prices
        .column_names()
        .iter()
        .zip(&returns)
        .map(|(name, col)| (name.clone(), keep.iter().map(|&row| col[row]).collect()))
        .collect();

    DatedTable::new(dates, columns)
}

/// Period-end prices for the requested tickers, read through `cache`.
///
/// When the cache already holds [`PriceRequest::entry_key`], that entry is
/// authoritative: the requested tickers are returned from it and no fetch
/// happens. Otherwise daily prices are fetched from `source`, resampled to
/// period ends of `request.frequency`, stored, and returned.
///
/// # Errors
///
/// [`HsiError::Schema`] naming every requested ticker missing from an
/// existing cache entry.
pub async fn load_or_fetch_prices<C, S>(
    cache: &mut C,
    source: &S,
    request: &PriceRequest,
) -> Result<DatedTable>
where
    C: PriceCache + ?Sized,
    S: PriceSource,
{
    let key = request.entry_key();
    if cache.has(&key) {
        let cached = cache
            .get(&key)?
            .ok_or_else(|| HsiError::DataFetch(format!("cache entry '{key}' vanished")))?;

        let missing: Vec<&str> = request
            .tickers
            .iter()
            .filter(|t| !cached.has_column(t))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(HsiError::schema(
                format!("cached prices '{key}'"),
                missing.join(", "),
            ));
        }

        info!("using cached prices '{key}' ({} periods)", cached.height());
        return cached.select(&request.tickers, &key);
    }

    info!(
        "fetching daily prices for {:?} from {} to {}",
        request.tickers, request.start, request.end
    );
    let daily = source
        .fetch_daily(&request.tickers, request.start, request.end)
        .await?;
    let resampled = resample_last(&daily, request.frequency)?;
    debug!(
        "resampled {} daily rows to {} {} period ends",
        daily.height(),
        resampled.height(),
        request.frequency.as_str()
    );

    cache.put(&key, &resampled)?;
    resampled.select(&request.tickers, &key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use crate::FileCache;
    use hsi_traits::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Returns a fixed daily table and counts calls.
    struct FakeSource {
        calls: AtomicUsize,
        daily: DatedTable,
    }

    impl PriceSource for FakeSource {
        async fn fetch_daily(&self, _tickers: &[String], _start: Date, _end: Date) -> Result<DatedTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.daily.clone())
        }
    }

    fn daily() -> DatedTable {
        DatedTable::new(
            vec![d(2020, 1, 2), d(2020, 1, 30), d(2020, 2, 3), d(2020, 2, 28), d(2020, 4, 1)],
            vec![
                ("XLV".to_string(), vec![100.0, 102.0, 101.0, 104.0, 110.0]),
                ("IHF".to_string(), vec![50.0, f64::NAN, 51.0, f64::NAN, 53.0]),
            ],
        )
        .unwrap()
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cache_key_is_order_insensitive() {
        assert_eq!(cache_key_for(&tickers(&["XLV", "IHF"])), "prices_ihf_xlv");
        assert_eq!(
            cache_key_for(&tickers(&["IHF", "XLV"])),
            cache_key_for(&tickers(&["XLV", "IHF"]))
        );
    }

    #[test]
    fn test_resample_month_end() {
        let monthly = resample_month_end(&daily()).unwrap();

        assert_eq!(
            monthly.dates(),
            &[d(2020, 1, 31), d(2020, 2, 29), d(2020, 3, 31), d(2020, 4, 30)]
        );
        assert_eq!(monthly.column("XLV").unwrap(), &[102.0, 104.0, 104.0, 110.0]);
        // Missing closes are carried forward within and across months
        assert_eq!(monthly.column("IHF").unwrap(), &[50.0, 51.0, 51.0, 53.0]);
    }

    #[test]
    fn test_simple_returns() {
        let prices = DatedTable::new(
            vec![d(2020, 1, 31), d(2020, 2, 29), d(2020, 3, 31)],
            vec![
                ("XLV".to_string(), vec![100.0, 110.0, 99.0]),
                ("IHF".to_string(), vec![f64::NAN, 50.0, 55.0]),
            ],
        )
        .unwrap();

        let returns = simple_returns(&prices).unwrap();
        assert_eq!(returns.dates(), &[d(2020, 3, 31)]);
        assert_abs_diff_eq!(returns.column("XLV").unwrap()[0], -0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(returns.column("IHF").unwrap()[0], 0.1, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_cold_cache_fetches_and_stores() {
        let source = FakeSource {
            calls: AtomicUsize::new(0),
            daily: daily(),
        };
        let mut cache = MemoryCache::default();
        let request = PriceRequest::new(tickers(&["IHF"]), d(2020, 1, 1), d(2020, 4, 30));

        let prices = load_or_fetch_prices(&mut cache, &source, &request).await.unwrap();
        assert_eq!(prices.column_names(), &["IHF".to_string()]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(cache.has("prices_ihf"));

        // Warm cache: no second fetch
        load_or_fetch_prices(&mut cache, &source, &request).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quarterly_request_resamples_to_quarter_ends() {
        let source = FakeSource {
            calls: AtomicUsize::new(0),
            daily: daily(),
        };
        let mut cache = MemoryCache::default();
        let request = PriceRequest::new(tickers(&["XLV"]), d(2020, 1, 1), d(2020, 4, 30))
            .with_cache_key("prices_sector_etfs")
            .with_frequency(Frequency::Quarterly);

        let prices = load_or_fetch_prices(&mut cache, &source, &request).await.unwrap();

        assert_eq!(prices.dates(), &[d(2020, 3, 31), d(2020, 6, 30)]);
        assert_eq!(prices.column("XLV").unwrap(), &[104.0, 110.0]);
        // Quarterly entries never shadow the monthly cache entry
        assert!(cache.has("prices_sector_etfs_quarterly"));
        assert!(!cache.has("prices_sector_etfs"));
    }

    #[tokio::test]
    async fn test_cache_file_missing_ticker_is_schema_error_without_fetch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("prices_sector_etfs.csv"),
            "date,XLV,IHF\n2020-01-31,100,50\n2020-02-29,102,51\n",
        )
        .unwrap();

        let source = FakeSource {
            calls: AtomicUsize::new(0),
            daily: daily(),
        };
        let mut cache = FileCache::new(dir.path());
        let request = PriceRequest::new(tickers(&["XLV", "IHF", "IYH"]), d(2020, 1, 1), d(2020, 4, 30))
            .with_cache_key("prices_sector_etfs");

        let err = load_or_fetch_prices(&mut cache, &source, &request)
            .await
            .unwrap_err();

        assert!(matches!(err, HsiError::Schema { ref column, .. } if column == "IYH"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_ticker_in_cache_is_schema_error_without_fetch() {
        let source = FakeSource {
            calls: AtomicUsize::new(0),
            daily: daily(),
        };
        let cached = resample_month_end(&daily()).unwrap();
        let mut cache = MemoryCache::with_entry("prices_sector_etfs", cached);
        let request = PriceRequest::new(tickers(&["XLV", "IYH"]), d(2020, 1, 1), d(2020, 4, 30))
            .with_cache_key("prices_sector_etfs");

        let err = load_or_fetch_prices(&mut cache, &source, &request)
            .await
            .unwrap_err();

        match err {
            HsiError::Schema { column, .. } => assert_eq!(column, "IYH"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
