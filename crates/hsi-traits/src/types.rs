//! Common types used throughout the HSI workspace.
//!
//! Time series are stored column-wise over a shared, strictly increasing date
//! index. Missing observations are encoded as `f64::NAN`.

use crate::{HsiError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Name of the date column in persisted and tabular outputs.
pub const DATE_COLUMN: &str = "date";

/// Sampling frequency of a canonical series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One observation per calendar month, dated at the month end.
    #[default]
    Monthly,
    /// One observation per calendar quarter, dated at the quarter end.
    Quarterly,
}

impl Frequency {
    /// Number of periods in one year.
    pub const fn periods_per_year(self) -> usize {
        match self {
            Self::Monthly => 12,
            Self::Quarterly => 4,
        }
    }

    /// Lowercase name, as used in serialized configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    /// Ordinal of the period containing `date`. Consecutive periods have
    /// consecutive ordinals.
    pub fn period_index(self, date: Date) -> i64 {
        let months = i64::from(date.year()) * 12 + i64::from(date.month0());
        match self {
            Self::Monthly => months,
            Self::Quarterly => months.div_euclid(3),
        }
    }

    /// Last calendar day of the period with ordinal `index`.
    pub fn period_end_from_index(self, index: i64) -> Result<Date> {
        let last_month = match self {
            Self::Monthly => index,
            Self::Quarterly => index * 3 + 2,
        };
        let year = i32::try_from(last_month.div_euclid(12))
            .map_err(|_| HsiError::InvalidDate(format!("period {index} out of range")))?;
        let month = last_month.rem_euclid(12) as u32 + 1;
        month_end(year, month)
    }

    /// Last calendar day of the period containing `date`.
    pub fn period_end(self, date: Date) -> Result<Date> {
        self.period_end_from_index(self.period_index(date))
    }
}

/// Last calendar day of `month` in `year`.
pub fn month_end(year: i32, month: u32) -> Result<Date> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| HsiError::InvalidDate(format!("no month end for {year}-{month:02}")))
}

fn check_increasing(dates: &[Date]) -> Result<()> {
    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(HsiError::InvalidData(format!(
            "date index not strictly increasing at {} -> {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// A named series of dated values, one per period.
///
/// The date index is strictly increasing; missing values are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    name: String,
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl DatedSeries {
    /// Creates a series, validating that dates and values line up and that the
    /// index is strictly increasing.
    pub fn new(name: impl Into<String>, dates: Vec<Date>, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(HsiError::InvalidData(format!(
                "series '{name}' has {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        check_increasing(&dates)?;
        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Creates a series from `(date, value)` pairs.
    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (Date, f64)>,
    ) -> Result<Self> {
        let (dates, values) = pairs.into_iter().unzip();
        Self::new(name, dates, values)
    }

    /// Series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Date index.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Values, aligned with [`Self::dates`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries, missing ones included.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no entries.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Value at `date`, if the date is part of the index.
    pub fn get(&self, date: Date) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Iterates over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Number of non-missing values.
    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Returns the same series under a new name.
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }
}

/// A set of named value columns over a shared date index.
///
/// `DatedTable` is the canonical output of the series loader and the storage
/// format of price and return tables. Column order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedTable {
    dates: Vec<Date>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl DatedTable {
    /// Creates a table from a date index and named columns.
    ///
    /// # Errors
    ///
    /// Fails when a column length differs from the index length, a column
    /// name repeats, or the index is not strictly increasing.
    pub fn new(dates: Vec<Date>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        check_increasing(&dates)?;
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != dates.len() {
                return Err(HsiError::InvalidData(format!(
                    "column '{name}' has {} values, expected {}",
                    values.len(),
                    dates.len()
                )));
            }
            if names.contains(&name) {
                return Err(HsiError::InvalidData(format!("duplicate column '{name}'")));
            }
            names.push(name);
            data.push(values);
        }
        Ok(Self {
            dates,
            names,
            columns: data,
        })
    }

    /// Date index.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of value columns.
    pub const fn width(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Checks if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }

    /// Iterates over `(name, values)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Named column as a [`DatedSeries`].
    pub fn series(&self, name: &str) -> Option<DatedSeries> {
        self.column(name).map(|values| DatedSeries {
            name: name.to_string(),
            dates: self.dates.clone(),
            values: values.to_vec(),
        })
    }

    /// Keeps only the named columns, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`HsiError::Schema`] naming the first absent column, with
    /// `source_name` as the reported source.
    pub fn select(&self, names: &[String], source_name: &str) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let values = self
                .column(name)
                .ok_or_else(|| HsiError::schema(source_name, name.as_str()))?;
            columns.push((name.clone(), values.to_vec()));
        }
        Self::new(self.dates.clone(), columns)
    }

    /// Returns the table with every column name prefixed by `<namespace>_`.
    pub fn prefixed(self, namespace: &str) -> Self {
        Self {
            names: self
                .names
                .into_iter()
                .map(|n| format!("{namespace}_{n}"))
                .collect(),
            ..self
        }
    }

    /// Keeps the rows whose index position satisfies `keep`.
    pub fn filter_rows(&self, mut keep: impl FnMut(usize, Date) -> bool) -> Self {
        let rows: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|&(idx, &date)| keep(idx, date))
            .map(|(idx, _)| idx)
            .collect();
        Self {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| rows.iter().map(|&r| col[r]).collect())
                .collect(),
        }
    }

    /// Converts the table to a Polars DataFrame with a leading `date` column.
    /// NaN values become nulls.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut cols = Vec::with_capacity(self.width() + 1);
        cols.push(Column::new(DATE_COLUMN.into(), self.dates.as_slice()));
        for (name, values) in self.columns() {
            let values: Vec<Option<f64>> = values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) })
                .collect();
            cols.push(Column::new(name.into(), values));
        }
        Ok(DataFrame::new(cols)?)
    }
}
