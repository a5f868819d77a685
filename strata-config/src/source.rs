use std::fmt;

use rustc_hash::FxHashMap;

use crate::entries::{DatasetEntry, FsEntry, StagingEntry};

/// Source of dataset, filesystem and staging configuration.
///
/// Implementations return owned entries so callers never borrow into the
/// source's internal storage; entries are small and clone cheaply.
///
/// `filesystems` must preserve declaration order: when several entries score
/// equally for a URI, the earliest declared one wins.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Configuration entry for `(layer, name)`, if one exists.
    ///
    /// Implementations return the entry exactly as configured; the
    /// `_dynamic` fallback is resolution-layer behavior, not config-layer.
    fn dataset_entry(&self, layer: &str, name: &str) -> Option<DatasetEntry>;

    /// All configured filesystems, in declaration order.
    fn filesystems(&self) -> Vec<(String, FsEntry)>;

    /// Staged-write defaults.
    fn staging(&self) -> StagingEntry;
}

/// Programmatic [`ConfigSource`] for tests and embedding.
#[derive(Debug, Default)]
pub struct StaticConfig {
    datasets: FxHashMap<(String, String), DatasetEntry>,
    filesystems: Vec<(String, FsEntry)>,
    staging: StagingEntry,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(
        mut self,
        layer: impl Into<String>,
        name: impl Into<String>,
        entry: DatasetEntry,
    ) -> Self {
        self.datasets.insert((layer.into(), name.into()), entry);
        self
    }

    pub fn with_filesystem(mut self, key: impl Into<String>, entry: FsEntry) -> Self {
        self.filesystems.push((key.into(), entry));
        self
    }

    pub fn with_staging(mut self, staging: StagingEntry) -> Self {
        self.staging = staging;
        self
    }
}

impl ConfigSource for StaticConfig {
    fn dataset_entry(&self, layer: &str, name: &str) -> Option<DatasetEntry> {
        self.datasets
            .get(&(layer.to_string(), name.to_string()))
            .cloned()
    }

    fn filesystems(&self) -> Vec<(String, FsEntry)> {
        self.filesystems.clone()
    }

    fn staging(&self) -> StagingEntry {
        self.staging.clone()
    }
}
