//! Error types for the market data client.

use hsi_traits::HsiError;
use thiserror::Error;

/// Errors that can occur when fetching prices from the chart API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error status or error payload.
    #[error("Chart API error: {0}")]
    Api(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// No data available for a ticker.
    #[error("No data available for {0}")]
    NoData(String),
}

impl From<FetchError> for HsiError {
    fn from(err: FetchError) -> Self {
        Self::DataFetch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_maps_to_data_fetch() {
        let err: HsiError = FetchError::NoData("IHF".to_string()).into();
        assert!(matches!(err, HsiError::DataFetch(ref msg) if msg.contains("IHF")));
    }
}
