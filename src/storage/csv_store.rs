use crate::model::{ImpactResult, LagCorrelation, MergedRow, MergedTable, PricePoint, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

pub const MERGED_FILE: &str = "merged_market_data.csv";
pub const IMPACT_FILE: &str = "event_impact_result.csv";
pub const LAG_FILE: &str = "lag_correlation_result.csv";

/// Flat-file layout under the data directory: `raw/`, `processed/`, `charts/`.
pub struct FlatFileStorage {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
    charts_dir: PathBuf,
}

impl FlatFileStorage {
    /// Creates the directory tree if it does not exist yet.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        let storage = Self {
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
            charts_dir: data_dir.join("charts"),
        };
        fs::create_dir_all(&storage.raw_dir)?;
        fs::create_dir_all(&storage.processed_dir)?;
        fs::create_dir_all(&storage.charts_dir)?;
        Ok(storage)
    }

    pub fn raw_path(&self, name: &str) -> PathBuf {
        self.raw_dir.join(format!("{}.csv", name))
    }

    pub fn merged_path(&self) -> PathBuf {
        self.processed_dir.join(MERGED_FILE)
    }

    pub fn impact_path(&self) -> PathBuf {
        self.processed_dir.join(IMPACT_FILE)
    }

    pub fn lag_path(&self) -> PathBuf {
        self.processed_dir.join(LAG_FILE)
    }

    pub fn charts_dir(&self) -> &Path {
        &self.charts_dir
    }

    /// Writes one instrument as a `Date,Close` table.
    pub fn save_raw(&self, name: &str, points: &[PricePoint]) -> Result<PathBuf, StorageError> {
        let path = self.raw_path(name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["Date", "Close"])?;
        for point in points {
            writer.write_record([point.date.to_string(), point.close.to_string()])?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn load_raw_text(&self, name: &str) -> Result<String, StorageError> {
        let path = self.raw_path(name);
        if !path.exists() {
            return Err(StorageError::MissingInput(path));
        }
        Ok(fs::read_to_string(path)?)
    }

    pub fn save_merged(&self, table: &MergedTable) -> Result<PathBuf, StorageError> {
        let path = self.merged_path();
        write_rows(&path, &table.rows)?;
        Ok(path)
    }

    pub fn load_merged(&self) -> Result<MergedTable, StorageError> {
        let path = self.merged_path();
        if !path.exists() {
            return Err(StorageError::MissingInput(path));
        }
        let rows: Vec<MergedRow> = read_rows(&path)?;
        Ok(MergedTable::new(rows))
    }

    pub fn save_impact(&self, results: &[ImpactResult]) -> Result<PathBuf, StorageError> {
        let path = self.impact_path();
        write_rows(&path, results)?;
        Ok(path)
    }

    /// `None` when the analysis phase produced no result file.
    pub fn load_impact(&self) -> Result<Option<Vec<ImpactResult>>, StorageError> {
        let path = self.impact_path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_rows(&path)?))
    }

    pub fn save_lag(&self, profile: &[LagCorrelation]) -> Result<PathBuf, StorageError> {
        let path = self.lag_path();
        write_rows(&path, profile)?;
        Ok(path)
    }

    /// Drops a stale impact table so a run without results does not reuse old ones.
    pub fn clear_impact(&self) -> Result<(), StorageError> {
        let path = self.impact_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
