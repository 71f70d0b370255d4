//! File-backed price cache.

use crate::loader::parse_date;
use hsi_traits::{DATE_COLUMN, DatedTable, HsiError, PriceCache, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Stores each entry as `<dir>/<key>.csv` with a `date` column followed by
/// one column per ticker.
///
/// Reads and writes are not coordinated; concurrent runs sharing a directory
/// are not supported.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.csv"))
    }
}

impl PriceCache for FileCache {
    fn has(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    fn get(&self, key: &str) -> Result<Option<DatedTable>> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?.clone();
        let date_idx = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| HsiError::schema(path.display().to_string(), DATE_COLUMN))?;
        let value_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != date_idx)
            .map(|(idx, name)| (idx, name.to_string()))
            .collect();

        let mut rows: Vec<(hsi_traits::Date, Vec<f64>)> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let date = parse_date(record.get(date_idx).unwrap_or_default())?;
            let values = value_cols
                .iter()
                .map(|(idx, _)| {
                    record
                        .get(*idx)
                        .and_then(|v| v.trim().parse::<f64>().ok())
                        .unwrap_or(f64::NAN)
                })
                .collect();
            rows.push((date, values));
        }
        rows.sort_by_key(|(date, _)| *date);

        let dates = rows.iter().map(|(date, _)| *date).collect();
        let columns = value_cols
            .into_iter()
            .enumerate()
            .map(|(pos, (_, name))| (name, rows.iter().map(|(_, v)| v[pos]).collect()))
            .collect();

        debug!("cache hit for '{key}' at {}", path.display());
        DatedTable::new(dates, columns).map(Some)
    }

    fn put(&mut self, key: &str, table: &DatedTable) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec![DATE_COLUMN.to_string()];
        header.extend(table.column_names().iter().cloned());
        writer.write_record(&header)?;

        for (row, date) in table.dates().iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            for (_, values) in table.columns() {
                let v = values[row];
                record.push(if v.is_nan() { String::new() } else { v.to_string() });
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;

        debug!("cached '{key}' ({} rows) at {}", table.height(), path.display());
        Ok(())
    }
}
