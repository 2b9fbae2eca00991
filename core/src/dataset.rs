//! The in-memory record store and its process-wide cache.
//!
//! A `Dataset` is loaded once and never mutated. The filter engine and
//! everything downstream borrow from it and build their own copies.

use crate::{
    error::{YoyError, YoyResult},
    ingest,
    record::SalesRecord,
    store::SalesStore,
    types::SalesMonth,
};
use log::{debug, info, warn};
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    Csv(PathBuf),
    Sqlite(PathBuf),
}

impl DataSource {
    pub fn path(&self) -> &Path {
        match self {
            DataSource::Csv(p) | DataSource::Sqlite(p) => p,
        }
    }

    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(self.path()).and_then(|m| m.modified()).ok()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Csv(p) => write!(f, "csv:{}", p.display()),
            DataSource::Sqlite(p) => write!(f, "sqlite:{}", p.display()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn load(source: &DataSource, change_threshold: f64) -> YoyResult<Self> {
        let records = match source {
            DataSource::Csv(path) => ingest::load_csv(path, change_threshold)?,
            DataSource::Sqlite(path) => load_sqlite(path, change_threshold)?,
        };
        info!("Dataset {source} ready with {} records", records.len());
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn products(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.product_name.as_str()))
    }

    pub fn months(&self) -> Vec<SalesMonth> {
        self.records
            .iter()
            .map(|r| r.sales_month)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Stored labels are re-derived with the caller's threshold, so the truth
/// table holds no matter what wrote the file.
fn load_sqlite(path: &Path, change_threshold: f64) -> YoyResult<Vec<SalesRecord>> {
    let display = path.to_string_lossy();
    let store = SalesStore::open_read_only(&display)?;
    if store.latest_import_id()?.is_none() {
        return Err(YoyError::NoImport {
            path: display.into_owned(),
        });
    }

    let mut records = store.load_records()?;
    for (idx, record) in records.iter_mut().enumerate() {
        let replaced = record.reclassify(change_threshold).ok_or_else(|| YoyError::Schema {
            row: idx + 1,
            detail: "both current and prior monthly volumes are empty".into(),
        })?;
        if !replaced.is_empty() {
            warn!("Stored row {}: re-derived {}", idx + 1, replaced.join(", "));
        }
    }
    Ok(records)
}

/// Sorted distinct non-empty values.
pub(crate) fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

struct CachedDataset {
    modified: Option<SystemTime>,
    dataset: Arc<Dataset>,
}

/// Loaded datasets keyed by source. Constructed once at process start and
/// handed to every request; an entry is reloaded only when its source file
/// changes on disk or it is explicitly invalidated.
pub struct DatasetCache {
    change_threshold: f64,
    entries: HashMap<DataSource, CachedDataset>,
}

impl DatasetCache {
    pub fn new(change_threshold: f64) -> Self {
        Self {
            change_threshold,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, source: &DataSource) -> YoyResult<Arc<Dataset>> {
        let modified = source.modified();
        if let Some(entry) = self.entries.get(source) {
            if entry.modified == modified {
                debug!("Dataset cache hit for {source}");
                return Ok(Arc::clone(&entry.dataset));
            }
            info!("Source {source} changed on disk; reloading");
        }

        let dataset = Arc::new(Dataset::load(source, self.change_threshold)?);
        self.entries.insert(
            source.clone(),
            CachedDataset {
                modified,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    pub fn invalidate(&mut self, source: &DataSource) -> bool {
        self.entries.remove(source).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
