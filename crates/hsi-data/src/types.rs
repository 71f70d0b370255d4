//! Data types for chart API responses and the domain source schemas.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// One of the three domain data sources feeding the stress index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainSource {
    /// Healthcare utilization rates.
    Utilization,
    /// Insurer medical loss ratio.
    InsurerMargin,
    /// Healthcare employment.
    Employment,
}

impl DomainSource {
    /// All domain sources, in panel order.
    pub const ALL: [Self; 3] = [Self::Utilization, Self::InsurerMargin, Self::Employment];

    /// File name of the raw CSV under the raw data directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Utilization => "health_utilization.csv",
            Self::InsurerMargin => "insurer_mlr.csv",
            Self::Employment => "health_employment.csv",
        }
    }

    /// Prefix applied to this source's columns in the feature panel.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Utilization => "util",
            Self::InsurerMargin => "mlr",
            Self::Employment => "emp",
        }
    }

    /// Columns that must be present in the raw file.
    #[must_use]
    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Utilization => &[
                "ip_admissions_per_1000",
                "op_visits_per_1000",
                "ed_visits_per_1000",
            ],
            Self::InsurerMargin => &["mlr"],
            Self::Employment => &["healthcare_jobs", "avg_hourly_earnings"],
        }
    }

    /// Columns loaded when present and skipped otherwise.
    #[must_use]
    pub const fn optional_columns(self) -> &'static [&'static str] {
        match self {
            Self::InsurerMargin => &["claims_trend"],
            Self::Utilization | Self::Employment => &[],
        }
    }
}

/// Top-level chart API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    /// Chart payload.
    pub chart: Chart,
}

/// Chart payload: either results or an error.
#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    /// Results, one per requested ticker.
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    /// Error reported by the API.
    #[serde(default)]
    pub error: Option<ChartError>,
}

/// Error object returned by the chart API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    /// Error code.
    pub code: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// Price history for one ticker.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    /// Bar timestamps (seconds since the Unix epoch).
    #[serde(default)]
    pub timestamp: Vec<i64>,
    /// Price indicators aligned with `timestamp`.
    pub indicators: Indicators,
}

/// Indicator arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    /// Raw quotes.
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
    /// Split- and dividend-adjusted closes.
    #[serde(default)]
    pub adjclose: Vec<AdjCloseIndicator>,
}

/// Raw close prices.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteIndicator {
    /// Close prices; `null` for missing bars.
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// Adjusted close prices.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjCloseIndicator {
    /// Adjusted closes; `null` for missing bars.
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResult {
    /// Daily closes as `(date, price)` pairs, preferring adjusted closes.
    ///
    /// Bars without a price or with an unrepresentable timestamp are skipped.
    #[must_use]
    pub fn daily_closes(&self) -> Vec<(NaiveDate, f64)> {
        let adjusted = self
            .indicators
            .adjclose
            .first()
            .filter(|adj| !adj.adjclose.is_empty());
        let prices: &[Option<f64>] = match (adjusted, self.indicators.quote.first()) {
            (Some(adj), _) => &adj.adjclose,
            (None, Some(quote)) => &quote.close,
            (None, None) => &[],
        };

        self.timestamp
            .iter()
            .zip(prices.iter())
            .filter_map(|(&ts, price)| {
                let date = DateTime::from_timestamp(ts, 0)?.date_naive();
                price.map(|p| (date, p))
            })
            .collect()
    }
}
