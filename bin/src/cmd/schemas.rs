//! Raw input schema listing.

use hsi::HsiConfig;
use hsi::data::{DomainSource, PriceRequest};

/// Print the files the run reads from the raw directory.
pub(crate) fn print_schemas(config: &HsiConfig) {
    println!("Raw directory: {}\n", config.raw_dir.display());

    for source in DomainSource::ALL {
        println!("{}  (prefix {}_)", source.file_name(), source.namespace());
        println!("  required: date, {}", source.required_columns().join(", "));
        if !source.optional_columns().is_empty() {
            println!("  optional: {}", source.optional_columns().join(", "));
        }
    }

    let prices = PriceRequest::new(config.tickers.clone(), config.start, config.start)
        .with_cache_key(config.price_cache_key.clone())
        .with_frequency(config.frequency);
    println!(
        "{}.csv  (price cache)\n  required: date, {}",
        prices.entry_key(),
        config.tickers.join(", ")
    );

    println!("\nIndex components:");
    for name in &config.components.increasing {
        println!("  + {name}");
    }
    for name in &config.components.decreasing {
        println!("  - {name}");
    }
}
