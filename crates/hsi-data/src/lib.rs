//! Data sources for the healthcare stress index.
//!
//! This crate turns raw inputs into canonical dated tables:
//!
//! - [`loader`] reads the domain CSV sources (utilization, insurer margin,
//!   employment), reindexes them to a fixed frequency and interpolates
//!   interior gaps.
//! - [`prices`] resamples daily prices to month ends, computes simple returns
//!   and reads market data through a [`PriceCache`](hsi_traits::PriceCache).
//! - [`YahooClient`] fetches daily adjusted closes from the Yahoo Finance
//!   chart API.
//! - [`FileCache`] persists fetched prices as CSV files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hsi_data::{FileCache, PriceRequest, YahooClient, load_or_fetch_prices};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = YahooClient::new()?;
//!     let mut cache = FileCache::new("data/raw");
//!     let request = PriceRequest::new(vec!["XLV".into()], start, end);
//!     let prices = load_or_fetch_prices(&mut cache, &client, &request).await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod error;
pub mod loader;
pub mod prices;
mod types;

pub use cache::FileCache;
pub use client::YahooClient;
pub use error::FetchError;
pub use loader::{SourceSchema, load_source, load_table, parse_date};
pub use prices::{
    PriceRequest, PriceSource, cache_key_for, load_or_fetch_prices, resample_month_end,
    simple_returns,
};
pub use types::*;
