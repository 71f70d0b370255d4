//! End-to-end run command.

use std::path::PathBuf;

use anyhow::Result;
use hsi::eval::{cumulative_growth, max_drawdown};
use hsi::{FileCache, HsiConfig, PerformanceSummary, Pipeline, RunReport, YahooClient};
use serde::Serialize;

use crate::OutputFormat;

/// JSON view of a run.
#[derive(Serialize)]
struct RunOutput<'a> {
    asset: &'a str,
    start: String,
    end: String,
    periods: usize,
    long_periods: usize,
    threshold: Option<f64>,
    panel_path: String,
    summary: &'a PerformanceSummary,
}

fn print_text(report: &RunReport) {
    let backtest = &report.backtest;
    let curve = cumulative_growth(backtest);

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Healthcare Stress Index Run                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    if let (Some(first), Some(last)) = (backtest.dates.first(), backtest.dates.last()) {
        println!("Period:    {} to {}", first, last);
    }
    println!("Asset:     {}", report.asset);
    println!(
        "Panel:     {} rows x {} columns -> {}",
        report.panel.height(),
        report.panel.column_names().len(),
        report.panel_path.display()
    );
    if !report.panel.empty_columns().is_empty() {
        println!("Empty:     {}", report.panel.empty_columns().join(", "));
    }
    match backtest.threshold {
        Some(threshold) => println!("Threshold: {:.4}", threshold),
        None => println!("Threshold: expanding"),
    }
    println!(
        "Long:      {} of {} periods",
        backtest.n_long(),
        backtest.len()
    );
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("PERFORMANCE SUMMARY");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    let s = &report.summary;
    println!("                        Strategy   Buy & Hold");
    println!(
        "  Annualized Return: {:>10.2}%  {:>10.2}%",
        s.ann_return_strat * 100.0,
        s.ann_return_asset * 100.0
    );
    println!(
        "  Annualized Vol:    {:>10.2}%  {:>10.2}%",
        s.ann_vol_strat * 100.0,
        s.ann_vol_asset * 100.0
    );
    println!(
        "  Sharpe Ratio:      {:>10.2}   {:>10.2}",
        s.sharpe_strat, s.sharpe_asset
    );
    println!(
        "  Max Drawdown:      {:>10.2}%  {:>10.2}%",
        max_drawdown(&curve.strategy) * 100.0,
        max_drawdown(&curve.asset) * 100.0
    );
    println!(
        "  Growth of 1:       {:>10.4}   {:>10.4}",
        curve.final_strategy(),
        curve.final_asset()
    );
    println!("  Periods:           {:>10}", s.n_periods);
    println!();
}

/// Run the study and print its summary.
pub(crate) async fn run_study(
    config: HsiConfig,
    format: OutputFormat,
    curve: Option<PathBuf>,
) -> Result<()> {
    let mut cache = FileCache::new(&config.raw_dir);
    let client = YahooClient::new()?;

    let report = Pipeline::new(config).run(&mut cache, &client).await?;

    if let Some(path) = curve {
        cumulative_growth(&report.backtest).write_csv(&path)?;
    }

    match format {
        OutputFormat::Json => {
            let date_at = |idx: Option<&hsi::Date>| idx.map(ToString::to_string).unwrap_or_default();
            let output = RunOutput {
                asset: &report.asset,
                start: date_at(report.backtest.dates.first()),
                end: date_at(report.backtest.dates.last()),
                periods: report.backtest.len(),
                long_periods: report.backtest.n_long(),
                threshold: report.backtest.threshold,
                panel_path: report.panel_path.display().to_string(),
                summary: &report.summary,
            };
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| anyhow::anyhow!("JSON serialization error: {}", e))?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&report),
    }

    Ok(())
}
