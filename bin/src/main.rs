//! HSI CLI binary.
//!
//! Builds the healthcare stress index from raw sources and evaluates it as a
//! long/flat timing signal.

mod cmd;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use hsi::{HsiConfig, ThresholdMode};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hsi")]
#[command(about = "Healthcare stress index construction and backtesting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args)]
struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file (fields default when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with the raw CSV sources and price cache
    #[arg(long, global = true)]
    raw_dir: Option<PathBuf>,

    /// Directory receiving hsi_panel.parquet
    #[arg(long, global = true)]
    processed_dir: Option<PathBuf>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, global = true)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, global = true)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, backtest it and print the performance summary
    Run {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write cumulative growth curves to this CSV file
        #[arg(long)]
        curve: Option<PathBuf>,

        /// Preferred traded asset
        #[arg(short, long)]
        asset: Option<String>,

        /// Ticker symbols to load
        #[arg(short, long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Long threshold quantile
        #[arg(short, long)]
        quantile: Option<f64>,

        /// Use an expanding-window threshold with this many warm-up periods
        #[arg(long)]
        expanding: Option<usize>,
    },

    /// Build the feature panel and index and print the latest rows
    Panel {
        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "12")]
        tail: usize,
    },

    /// Print the expected raw files and their columns
    Schemas,
}

/// Output format for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table
    Text,
    /// Pretty-printed JSON
    Json,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Environment configuration, then the config file, then command-line flags.
fn load_config(args: &GlobalArgs) -> Result<HsiConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => HsiConfig::from_env()?,
    };

    if let Some(dir) = &args.raw_dir {
        config.raw_dir = dir.clone();
    }
    if let Some(dir) = &args.processed_dir {
        config.processed_dir = dir.clone();
    }
    if let Some(start) = args.start {
        config.start = start;
    }
    if args.end.is_some() {
        config.end = args.end;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Run {
            format,
            curve,
            asset,
            tickers,
            quantile,
            expanding,
        } => {
            let mut config = load_config(&cli.global)?;
            if let Some(asset) = asset {
                config.asset = asset.to_uppercase();
            }
            if !tickers.is_empty() {
                config.tickers = tickers.iter().map(|t| t.to_uppercase()).collect();
            }
            if let Some(q) = quantile {
                config.quantile = q;
            }
            if let Some(min_periods) = expanding {
                config.threshold_mode = ThresholdMode::Expanding { min_periods };
            }
            config.validate()?;
            cmd::run::run_study(config, format, curve).await?;
        }
        Commands::Panel { tail } => {
            let config = load_config(&cli.global)?;
            config.validate()?;
            cmd::panel::show_panel(config, tail)?;
        }
        Commands::Schemas => {
            let config = load_config(&cli.global)?;
            cmd::schemas::print_schemas(&config);
        }
    }

    Ok(())
}
