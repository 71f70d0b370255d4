//! Chart API client for daily adjusted closes.

use crate::{
    error::FetchError,
    prices::PriceSource,
    types::ChartResponse,
};
use chrono::NaiveTime;
use hsi_traits::{Date, DatedTable, Result};
use log::debug;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Base URL for the Yahoo Finance chart API.
const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart API client (no API key required).
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    /// Create a new client against the public endpoint.
    pub fn new() -> std::result::Result<Self, FetchError> {
        Self::with_base_url(CHART_BASE_URL)
    }

    /// Create a client against a different base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> std::result::Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64)")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart URL for one ticker.
    fn url(&self, ticker: &str, start: Date, end: Date) -> String {
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // `period2` is exclusive; move it past the end date.
        let period2 = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/{}?period1={period1}&period2={period2}&interval=1d&events=history&includeAdjustedClose=true",
            self.base_url,
            ticker.to_uppercase()
        )
    }

    /// Fetch daily adjusted closes for a single ticker.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API reports an error, or
    /// the response holds no prices.
    pub async fn daily_closes(
        &self,
        ticker: &str,
        start: Date,
        end: Date,
    ) -> std::result::Result<Vec<(Date, f64)>, FetchError> {
        let url = self.url(ticker, start, end);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(format!("HTTP {status}: {text}")));
        }

        let text = response.text().await?;
        let parsed: ChartResponse = serde_json::from_str(&text)?;

        if let Some(err) = parsed.chart.error {
            return Err(FetchError::Api(format!("{}: {}", err.code, err.description)));
        }

        let closes = parsed
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .map(|result| result.daily_closes())
            .unwrap_or_default();

        if closes.is_empty() {
            return Err(FetchError::NoData(ticker.to_string()));
        }

        debug!("fetched {} daily closes for {ticker}", closes.len());
        Ok(closes)
    }
}

/// Outer-join per-ticker daily closes into one table.
pub(crate) fn join_closes(per_ticker: Vec<(String, Vec<(Date, f64)>)>) -> Result<DatedTable> {
    let mut by_date: BTreeMap<Date, Vec<f64>> = BTreeMap::new();
    let width = per_ticker.len();

    for (col, (_, closes)) in per_ticker.iter().enumerate() {
        for &(date, price) in closes {
            by_date.entry(date).or_insert_with(|| vec![f64::NAN; width])[col] = price;
        }
    }

    let dates: Vec<Date> = by_date.keys().copied().collect();
    let columns = per_ticker
        .into_iter()
        .enumerate()
        .map(|(col, (name, _))| (name, by_date.values().map(|row| row[col]).collect()))
        .collect();

    DatedTable::new(dates, columns)
}

impl PriceSource for YahooClient {
    async fn fetch_daily(&self, tickers: &[String], start: Date, end: Date) -> Result<DatedTable> {
        let mut per_ticker = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let closes = self.daily_closes(ticker, start, end).await?;
            per_ticker.push((ticker.clone(), closes));
        }
        join_closes(per_ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = YahooClient::with_base_url("http://localhost/chart").unwrap();
        let url = client.url("ihf", d(2020, 1, 1), d(2020, 1, 1));
        assert_eq!(
            url,
            "http://localhost/chart/IHF?period1=1577836800&period2=1577923200&interval=1d&events=history&includeAdjustedClose=true"
        );
    }

    #[test]
    fn test_join_closes_outer() {
        let table = join_closes(vec![
            ("XLV".to_string(), vec![(d(2020, 1, 2), 100.0), (d(2020, 1, 3), 101.0)]),
            ("IHF".to_string(), vec![(d(2020, 1, 3), 50.0)]),
        ])
        .unwrap();

        assert_eq!(table.dates(), &[d(2020, 1, 2), d(2020, 1, 3)]);
        assert_eq!(table.column("XLV").unwrap(), &[100.0, 101.0]);
        assert!(table.column("IHF").unwrap()[0].is_nan());
        assert_eq!(table.column("IHF").unwrap()[1], 50.0);
    }
}
