//! Feature panel assembly.
//!
//! The panel outer-joins canonical tables from several sources on their dates,
//! namespaces every column by source, restricts the rows to the analysis window
//! and fills residual gaps left by the join.

use hsi_traits::stats::{backward_fill, forward_fill, interpolate_interior};
use hsi_traits::{Date, DatedSeries, DatedTable, HsiError, Result};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// A date-keyed table of namespaced features.
///
/// After [`PanelBuilder::build`], every column is fully populated except
/// columns that held no observation at all inside the window; those remain
/// entirely NaN and are listed by [`Panel::empty_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    table: DatedTable,
    empty_columns: Vec<String>,
}

impl Panel {
    /// Wraps a table and fills its gaps.
    pub fn from_table(table: DatedTable) -> Result<Self> {
        fill(table)
    }

    /// Underlying table.
    pub const fn table(&self) -> &DatedTable {
        &self.table
    }

    /// Consumes the panel and returns the underlying table.
    pub fn into_table(self) -> DatedTable {
        self.table
    }

    /// Date index.
    pub fn dates(&self) -> &[Date] {
        self.table.dates()
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        self.table.column_names()
    }

    /// Values of the named column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.table.column(name)
    }

    /// Checks if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }

    /// Number of rows.
    pub const fn height(&self) -> usize {
        self.table.height()
    }

    /// Whether the panel has no rows.
    pub const fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Columns that were entirely missing before filling.
    pub fn empty_columns(&self) -> &[String] {
        &self.empty_columns
    }

    /// Total number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.table
            .columns()
            .map(|(_, values)| values.iter().filter(|v| v.is_nan()).count())
            .sum()
    }

    /// Checks that every feature is a panel column.
    ///
    /// # Errors
    ///
    /// [`HsiError::MissingFeature`] naming the first absent feature.
    pub fn require<S: AsRef<str>>(&self, features: &[S]) -> Result<()> {
        match features.iter().find(|f| !self.has_column(f.as_ref())) {
            Some(missing) => Err(HsiError::MissingFeature(missing.as_ref().to_string())),
            None => Ok(()),
        }
    }

    /// Re-applies the fill step. A no-op on a panel produced by the builder.
    pub fn refill(&self) -> Result<Self> {
        fill(self.table.clone())
    }

    /// The panel left-joined with `series` as an extra column.
    ///
    /// Panel dates absent from `series` get NaN.
    pub fn join_series(&self, series: &DatedSeries) -> Result<DatedTable> {
        let joined: Vec<f64> = self
            .dates()
            .iter()
            .map(|&date| series.get(date).unwrap_or(f64::NAN))
            .collect();

        let mut columns: Vec<(String, Vec<f64>)> = self
            .table
            .columns()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect();
        columns.push((series.name().to_string(), joined));

        DatedTable::new(self.dates().to_vec(), columns)
    }
}

/// Interior interpolation, then forward fill, then backward fill, per column.
fn fill(table: DatedTable) -> Result<Panel> {
    let mut empty_columns = Vec::new();
    let columns = table
        .columns()
        .map(|(name, values)| {
            let mut values = values.to_vec();
            if values.iter().all(|v| v.is_nan()) {
                empty_columns.push(name.to_string());
            } else {
                interpolate_interior(&mut values);
                forward_fill(&mut values);
                backward_fill(&mut values);
            }
            (name.to_string(), values)
        })
        .collect();

    for name in &empty_columns {
        warn!("panel column '{name}' has no observations in the analysis window");
    }

    Ok(Panel {
        table: DatedTable::new(table.dates().to_vec(), columns)?,
        empty_columns,
    })
}

/// Builder for a [`Panel`].
///
/// # Example
///
/// ```rust,ignore
/// let panel = PanelBuilder::new(start)
///     .with_table("util", utilization)
///     .with_table("mlr", insurer_margin)
///     .with_table("emp", employment)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PanelBuilder {
    start: Date,
    end: Option<Date>,
    tables: Vec<(String, DatedTable)>,
}

impl PanelBuilder {
    /// Start a panel keeping dates on or after `start`.
    pub const fn new(start: Date) -> Self {
        Self {
            start,
            end: None,
            tables: Vec::new(),
        }
    }

    /// Also drop dates after `end`.
    pub const fn with_end(mut self, end: Option<Date>) -> Self {
        self.end = end;
        self
    }

    /// Add a source table whose columns are prefixed with `<namespace>_`.
    pub fn with_table(mut self, namespace: impl Into<String>, table: DatedTable) -> Self {
        self.tables.push((namespace.into(), table));
        self
    }

    /// Outer-join, truncate and fill.
    ///
    /// # Errors
    ///
    /// [`HsiError::InvalidData`] when two namespaced columns collide.
    pub fn build(self) -> Result<Panel> {
        let Self { start, end, tables } = self;

        let union: BTreeSet<Date> = tables
            .iter()
            .flat_map(|(_, table)| table.dates().iter().copied())
            .filter(|&date| date >= start && end.is_none_or(|end| date <= end))
            .collect();
        let dates: Vec<Date> = union.into_iter().collect();

        let mut columns = Vec::new();
        for (namespace, table) in tables {
            let table = table.prefixed(&namespace);
            for (name, values) in table.columns() {
                let joined = dates
                    .iter()
                    .map(|date| {
                        table
                            .dates()
                            .binary_search(date)
                            .map_or(f64::NAN, |idx| values[idx])
                    })
                    .collect();
                columns.push((name.to_string(), joined));
            }
        }

        let joined = DatedTable::new(dates, columns)?;
        debug!(
            "outer-joined panel: {} rows x {} columns",
            joined.height(),
            joined.width()
        );

        let panel = fill(joined)?;
        info!(
            "built feature panel with {} rows and {} columns from {}",
            panel.height(),
            panel.column_names().len(),
            start
        );
        Ok(panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn months(n: usize) -> Vec<Date> {
        (0..n)
            .map(|i| hsi_traits::month_end(2020 + (i / 12) as i32, (i % 12) as u32 + 1).unwrap())
            .collect()
    }

    fn table(dates: Vec<Date>, name: &str, values: Vec<f64>) -> DatedTable {
        DatedTable::new(dates, vec![(name.to_string(), values)]).unwrap()
    }

    #[test]
    fn test_outer_join_and_fill() {
        let all = months(5);
        let util = table(all[..4].to_vec(), "ip", vec![1.0, f64::NAN, 3.0, 4.0]);
        let emp = table(all[2..].to_vec(), "jobs", vec![10.0, 11.0, 12.0]);

        let panel = PanelBuilder::new(all[0])
            .with_table("util", util)
            .with_table("emp", emp)
            .build()
            .unwrap();

        assert_eq!(panel.dates(), all.as_slice());
        assert_eq!(
            panel.column_names(),
            &["util_ip".to_string(), "emp_jobs".to_string()]
        );
        assert_eq!(panel.missing_count(), 0);

        let ip = panel.column("util_ip").unwrap();
        assert_abs_diff_eq!(ip[1], 2.0, epsilon = 1e-12);
        // Trailing gap forward-filled
        assert_abs_diff_eq!(ip[4], 4.0, epsilon = 1e-12);

        // Leading gap backward-filled from the first observation
        let jobs = panel.column("emp_jobs").unwrap();
        assert_eq!(&jobs[..3], &[10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_start_truncation_before_fill() {
        let all = months(4);
        let util = table(all.clone(), "ip", vec![100.0, f64::NAN, 3.0, 4.0]);

        let panel = PanelBuilder::new(all[1])
            .with_table("util", util)
            .build()
            .unwrap();

        assert_eq!(panel.height(), 3);
        // The pre-start observation does not leak into the window
        assert_eq!(panel.column("util_ip").unwrap(), &[3.0, 3.0, 4.0]);
    }

    #[test]
    fn test_end_truncation() {
        let all = months(4);
        let panel = PanelBuilder::new(all[0])
            .with_end(Some(d(2020, 2, 29)))
            .with_table("util", table(all, "ip", vec![1.0, 2.0, 3.0, 4.0]))
            .build()
            .unwrap();
        assert_eq!(panel.height(), 2);
    }

    #[test]
    fn test_empty_column_surfaced_not_zeroed() {
        let all = months(3);
        let mlr = DatedTable::new(
            all.clone(),
            vec![
                ("mlr".to_string(), vec![0.8, 0.82, 0.84]),
                ("claims_trend".to_string(), vec![f64::NAN; 3]),
            ],
        )
        .unwrap();

        let panel = PanelBuilder::new(all[0])
            .with_table("mlr", mlr)
            .build()
            .unwrap();

        assert_eq!(panel.empty_columns(), &["mlr_claims_trend".to_string()]);
        assert!(panel.column("mlr_claims_trend").unwrap().iter().all(|v| v.is_nan()));
        assert_eq!(panel.missing_count(), 3);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let all = months(6);
        let util = table(all.clone(), "ip", vec![f64::NAN, 1.0, f64::NAN, 5.0, f64::NAN, f64::NAN]);
        let panel = PanelBuilder::new(all[0])
            .with_table("util", util)
            .build()
            .unwrap();

        assert_eq!(panel.refill().unwrap(), panel);
    }

    #[test]
    fn test_namespace_collision() {
        let all = months(2);
        let result = PanelBuilder::new(all[0])
            .with_table("util", table(all.clone(), "ip", vec![1.0, 2.0]))
            .with_table("util", table(all, "ip", vec![1.0, 2.0]))
            .build();
        assert!(matches!(result, Err(HsiError::InvalidData(_))));
    }

    #[test]
    fn test_require_reports_missing_feature() {
        let all = months(2);
        let panel = PanelBuilder::new(all[0])
            .with_table("mlr", table(all, "mlr", vec![0.8, 0.9]))
            .build()
            .unwrap();

        assert!(panel.require(&["mlr_mlr"]).is_ok());
        let err = panel.require(&["mlr_mlr", "emp_healthcare_jobs"]).unwrap_err();
        assert!(matches!(err, HsiError::MissingFeature(ref f) if f == "emp_healthcare_jobs"));
    }

    #[test]
    fn test_join_series() {
        let all = months(3);
        let panel = PanelBuilder::new(all[0])
            .with_table("mlr", table(all.clone(), "mlr", vec![0.8, 0.9, 1.0]))
            .build()
            .unwrap();
        let hsi = DatedSeries::new("HSI", all[1..].to_vec(), vec![0.5, 0.6]).unwrap();

        let joined = panel.join_series(&hsi).unwrap();
        let values = joined.column("HSI").unwrap();
        assert!(values[0].is_nan());
        assert_eq!(&values[1..], &[0.5, 0.6]);
    }
}
