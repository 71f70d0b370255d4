//! CSV ingestion and canonicalization of dated numeric sources.
//!
//! A raw source is a CSV file with a `date` column and named numeric columns,
//! sampled at any cadence. Loading produces a [`DatedTable`] reindexed to the
//! target [`Frequency`] with interior gaps linearly interpolated. Leading and
//! trailing gaps are left for the caller.

use crate::types::DomainSource;
use chrono::{NaiveDate, NaiveDateTime};
use hsi_traits::stats::interpolate_interior;
use hsi_traits::{DATE_COLUMN, Date, DatedTable, Frequency, HsiError, Result};
use log::debug;
use std::io::Read;
use std::path::Path;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` and the datetime forms
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` (time discarded).
pub fn parse_date(raw: &str) -> Result<Date> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| HsiError::InvalidDate(format!("cannot parse '{raw}' as a date")))
}

fn parse_value(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Column selection for a raw source.
#[derive(Debug, Clone, Copy)]
pub struct SourceSchema<'a> {
    /// Columns that must be present.
    pub required: &'a [&'a str],
    /// Columns loaded only when present.
    pub optional: &'a [&'a str],
}

impl DomainSource {
    /// Column selection for this source.
    pub const fn schema(self) -> SourceSchema<'static> {
        SourceSchema {
            required: self.required_columns(),
            optional: self.optional_columns(),
        }
    }
}

/// Raw rows read from a source, before canonicalization.
#[derive(Debug, Clone)]
pub struct RawRows {
    /// Selected column names.
    pub names: Vec<String>,
    /// `(date, values)` rows in file order.
    pub rows: Vec<(Date, Vec<f64>)>,
}

/// Read the `date` column and the schema's columns from CSV text.
///
/// # Errors
///
/// - [`HsiError::Schema`] when `date` or a required column is absent.
/// - [`HsiError::InvalidDate`] when a date cell cannot be parsed.
pub fn read_rows<R: Read>(
    reader: R,
    source_name: &str,
    schema: SourceSchema<'_>,
) -> Result<RawRows> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let date_idx = position(DATE_COLUMN).ok_or_else(|| HsiError::schema(source_name, DATE_COLUMN))?;

    let mut selected = Vec::new();
    for &name in schema.required {
        let idx = position(name).ok_or_else(|| HsiError::schema(source_name, name))?;
        selected.push((name.to_string(), idx));
    }
    selected.extend(
        schema
            .optional
            .iter()
            .filter_map(|&name| position(name).map(|idx| (name.to_string(), idx))),
    );

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let date = parse_date(record.get(date_idx).unwrap_or_default())?;
        let values = selected
            .iter()
            .map(|(_, idx)| record.get(*idx).map_or(f64::NAN, parse_value))
            .collect();
        rows.push((date, values));
    }

    debug!("read {} rows with {} columns from {source_name}", rows.len(), selected.len());

    Ok(RawRows {
        names: selected.into_iter().map(|(name, _)| name).collect(),
        rows,
    })
}

/// Reindex raw rows to contiguous period ends of `frequency` and interpolate
/// interior gaps.
///
/// Each observation is assigned to the end of its period. When a period holds
/// several observations, the latest non-missing value per column wins.
pub fn canonicalize(raw: RawRows, frequency: Frequency) -> Result<DatedTable> {
    let RawRows { names, mut rows } = raw;
    if rows.is_empty() {
        return DatedTable::new(
            Vec::new(),
            names.into_iter().map(|n| (n, Vec::new())).collect(),
        );
    }
    rows.sort_by_key(|(date, _)| *date);

    let first = frequency.period_index(rows[0].0);
    let last = frequency.period_index(rows[rows.len() - 1].0);
    let n_periods = usize::try_from(last - first + 1)
        .map_err(|_| HsiError::InvalidData("period range overflow".to_string()))?;

    let mut columns = vec![vec![f64::NAN; n_periods]; names.len()];
    for (date, values) in &rows {
        let slot = (frequency.period_index(*date) - first) as usize;
        for (col, value) in columns.iter_mut().zip(values) {
            if !value.is_nan() {
                col[slot] = *value;
            }
        }
    }
    for col in &mut columns {
        interpolate_interior(col);
    }

    let dates = (first..=last)
        .map(|idx| frequency.period_end_from_index(idx))
        .collect::<Result<Vec<_>>>()?;

    DatedTable::new(dates, names.into_iter().zip(columns).collect())
}

/// Load a CSV file into a canonical table.
pub fn load_table(path: &Path, schema: SourceSchema<'_>, frequency: Frequency) -> Result<DatedTable> {
    let source_name = path.display().to_string();
    let file = std::fs::File::open(path)?;
    let raw = read_rows(file, &source_name, schema)?;
    canonicalize(raw, frequency)
}

/// Load one of the domain sources from `raw_dir`.
pub fn load_source(raw_dir: &Path, source: DomainSource, frequency: Frequency) -> Result<DatedTable> {
    let table = load_table(&raw_dir.join(source.file_name()), source.schema(), frequency)?;
    debug!(
        "loaded {:?}: {} periods, columns {:?}",
        source,
        table.height(),
        table.column_names()
    );
    Ok(table)
}
