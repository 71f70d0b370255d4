//! Panel inspection command.

use anyhow::Result;
use hsi::{HsiConfig, Pipeline};

/// Build the panel and index from the raw sources and print the last `tail`
/// rows. No prices are loaded.
pub(crate) fn show_panel(config: HsiConfig, tail: usize) -> Result<()> {
    let pipeline = Pipeline::new(config);
    let panel = pipeline.build_panel()?;
    let index = pipeline.build_index(&panel)?;
    let table = panel.join_series(&index.hsi)?;

    println!(
        "Panel: {} rows x {} columns",
        panel.height(),
        panel.column_names().len()
    );
    if !panel.empty_columns().is_empty() {
        println!("Columns without observations: {}", panel.empty_columns().join(", "));
    }
    println!();

    print!("{:<12}", "date");
    for name in table.column_names() {
        print!(" {:>width$}", name, width = name.len().max(10));
    }
    println!();

    let skip = table.height().saturating_sub(tail);
    for (row, date) in table.dates().iter().enumerate().skip(skip) {
        print!("{:<12}", date.to_string());
        for (name, values) in table.columns() {
            print!(" {:>width$.4}", values[row], width = name.len().max(10));
        }
        println!();
    }

    Ok(())
}
