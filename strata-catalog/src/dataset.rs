use std::collections::BTreeMap;
use std::fmt;

use strata_config::{ArgMap, ArgValue};
use strata_result::DatasetId;

use crate::format::Format;

/// Resolved dataset descriptor.
///
/// A `Dataset` is built by [`crate::resolve_dataset`] from a configuration
/// entry plus caller overrides, and then treated as read-only: every read,
/// write or copy starts from a fresh resolution, so no state leaks between
/// logical calls. `location` stays a template here; rendering it against
/// `params` is a separate step ([`crate::render_location`]).
///
/// `partitions` and `params` are disjoint by construction: resolution moves
/// every parameter whose key appears in `partition_by` out of `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Lifecycle layer (`raw`, `clean`, `curated`, ...).
    pub layer: String,
    /// Dataset name, unique within its layer.
    pub name: String,
    /// Location template, e.g. `s3://lake/{env}/customers`.
    pub location: String,
    pub format: Format,
    /// Explicit protocol override; `None` means "derive from the rendered
    /// location's scheme".
    pub protocol: Option<String>,
    /// Declared partition columns, in Hive directory order.
    pub partition_by: Vec<String>,
    /// Pinned partition values. Keys always form a prefix of `partition_by`.
    pub partitions: BTreeMap<String, String>,
    /// Values available to location-template placeholders.
    pub params: BTreeMap<String, String>,
    /// Arguments handed to both readers and writers.
    pub args: ArgMap,
    /// Reader-only arguments, overriding `args` per key.
    pub read_args: ArgMap,
    /// Writer-only arguments, overriding `args` per key.
    pub write_args: ArgMap,
    /// Column projection applied on read.
    pub columns: Option<Vec<String>>,
    /// Compression codec hint for formats that support one.
    pub compression: Option<String>,
    /// Whether this descriptor was resolved through a `_dynamic` entry.
    pub dynamic: bool,
}

impl Dataset {
    /// Identifying slice used in error payloads.
    pub fn id(&self) -> DatasetId {
        DatasetId {
            layer: self.layer.clone(),
            name: self.name.clone(),
            partition_by: self.partition_by.clone(),
            partitions: self
                .pinned_partitions()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Pinned `(key, value)` pairs in `partition_by` order.
    pub fn pinned_partitions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.partition_by.iter().filter_map(|key| {
            self.partitions
                .get(key)
                .map(|value| (key.as_str(), value.as_str()))
        })
    }

    /// Declared partition keys that are not pinned, in order.
    ///
    /// For a valid descriptor this is the suffix of `partition_by` after the
    /// pinned prefix; these are the keys a partitioned write groups rows by.
    pub fn unpinned_partition_keys(&self) -> impl Iterator<Item = &str> {
        self.partition_by
            .iter()
            .filter(|key| !self.partitions.contains_key(*key))
            .map(String::as_str)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer, self.name)
    }
}

/// Caller-side overrides for dataset resolution.
///
/// Map-valued fields (`args`, `read_args`, `write_args`, params) merge onto
/// the configured entry, with the override winning per key; scalar fields
/// (`format`, `compression`, `columns`) replace the configured value
/// outright. `format` is only legal on dynamic datasets; resolution rejects
/// it otherwise.
///
/// ```
/// use strata_catalog::DatasetOptions;
///
/// let options = DatasetOptions::new()
///     .param("env", "prod")
///     .param("year", 2024)
///     .write_arg("compression", "zstd");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    pub(crate) format: Option<Format>,
    pub(crate) compression: Option<String>,
    pub(crate) columns: Option<Vec<String>>,
    pub(crate) args: ArgMap,
    pub(crate) read_args: ArgMap,
    pub(crate) write_args: ArgMap,
    pub(crate) params: BTreeMap<String, String>,
}

impl DatasetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the format. Resolution accepts this only for dynamic
    /// datasets.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Replace the column projection.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set one shared reader/writer argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Set one reader-only argument.
    pub fn read_arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.read_args.insert(key.into(), value.into());
        self
    }

    /// Set one writer-only argument.
    pub fn write_arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.write_args.insert(key.into(), value.into());
        self
    }

    /// Set one location parameter or partition value.
    ///
    /// Keys that match a declared partition column become pinned partition
    /// values during resolution; everything else feeds location-template
    /// interpolation.
    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }
}
