use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use strata_result::{Error, Result};

use crate::entries::{DatasetEntry, FsEntry, StagingEntry};
use crate::source::ConfigSource;

/// [`ConfigSource`] backed by a YAML document.
///
/// Document shape:
///
/// ```yaml
/// datasets:
///   raw:
///     customers:
///       location: file:///raw/customers
///       format: parquet
///       partition_by: [country, vip]
/// filesystems:
///   local:
///     protocol: file
///     path: /data
/// staging:
///   enabled: false
///   prefix: stage
/// ```
///
/// The `filesystems` mapping is kept in document order because routing breaks
/// score ties toward the earliest declared entry. Entries that omit the
/// `protocol` field inherit it from their key.
#[derive(Debug)]
pub struct YamlConfig {
    datasets: FxHashMap<(String, String), DatasetEntry>,
    filesystems: Vec<(String, FsEntry)>,
    staging: StagingEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDoc {
    #[serde(default)]
    datasets: Mapping,
    #[serde(default)]
    filesystems: Mapping,
    #[serde(default)]
    staging: StagingEntry,
}

impl YamlConfig {
    /// Parse a YAML document.
    pub fn from_str(text: &str) -> Result<Self> {
        let doc: RawDoc = serde_yaml::from_str(text)
            .map_err(|e| Error::configuration(format!("invalid configuration document: {e}")))?;

        let mut datasets = FxHashMap::default();
        for (layer_key, names) in &doc.datasets {
            let layer = mapping_key(layer_key, "datasets")?;
            let names = names.as_mapping().ok_or_else(|| {
                Error::configuration(format!("datasets.{layer} must be a mapping of entries"))
            })?;
            for (name_key, entry_value) in names {
                let name = mapping_key(name_key, &format!("datasets.{layer}"))?;
                let entry: DatasetEntry = serde_yaml::from_value(entry_value.clone())
                    .map_err(|e| {
                        Error::configuration(format!("dataset '{layer}.{name}': {e}"))
                    })?;
                datasets.insert((layer.to_string(), name.to_string()), entry);
            }
        }

        let mut filesystems = Vec::with_capacity(doc.filesystems.len());
        for (key, value) in &doc.filesystems {
            let key = mapping_key(key, "filesystems")?;
            let mut mapping = value
                .as_mapping()
                .cloned()
                .ok_or_else(|| {
                    Error::configuration(format!("filesystems.{key} must be a mapping"))
                })?;
            let protocol_field = Value::from("protocol");
            if !mapping.contains_key(&protocol_field) {
                mapping.insert(protocol_field, Value::from(key));
            }
            let entry: FsEntry = serde_yaml::from_value(Value::Mapping(mapping))
                .map_err(|e| Error::configuration(format!("filesystem '{key}': {e}")))?;
            filesystems.push((key.to_string(), entry));
        }

        Ok(Self {
            datasets,
            filesystems,
            staging: doc.staging,
        })
    }

    /// Load a YAML document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_str(&text)
    }
}

fn mapping_key<'a>(key: &'a Value, section: &str) -> Result<&'a str> {
    key.as_str().ok_or_else(|| {
        Error::configuration(format!("{section} keys must be strings, got {key:?}"))
    })
}

impl ConfigSource for YamlConfig {
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
