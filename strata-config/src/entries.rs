use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::value::{ArgMap, ArgValue};

/// Raw configuration entry for one dataset.
///
/// Entries stay string-level on purpose: format names are parsed (and
/// rejected) by the catalog during resolution, so a typo in one dataset does
/// not prevent loading a config that other datasets still need.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatasetEntry {
    /// Location template, e.g. `file:///raw/customers/{version}`.
    pub location: String,
    /// Format name; defaults to parquet when absent.
    #[serde(default)]
    pub format: Option<String>,
    /// Explicit protocol override; normally derived from the rendered
    /// location's scheme.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Ordered partition columns for Hive-style directory layouts.
    #[serde(default)]
    pub partition_by: Vec<String>,
    /// Column projection applied on read.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Compression hint consumed by codecs that support it.
    #[serde(default)]
    pub compression: Option<String>,
    /// Arguments shared by readers and writers.
    #[serde(default)]
    pub args: ArgMap,
    /// Reader-only arguments, overlaid on `args`.
    #[serde(default)]
    pub read_args: ArgMap,
    /// Writer-only arguments, overlaid on `args`.
    #[serde(default)]
    pub write_args: ArgMap,
    /// Default values for location template placeholders.
    #[serde(default)]
    pub params: BTreeMap<String, ArgValue>,
}

/// Configuration entry for one filesystem, tagged by protocol.
///
/// When a YAML entry omits the `protocol` field, [`crate::YamlConfig`] fills
/// it in from the entry's key, so `file: {path: /data}` and
/// `anything: {protocol: file, path: /data}` are equivalent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum FsEntry {
    /// Local filesystem, optionally rooted below `path`.
    File {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// Shared in-memory filesystem (tests, scratch pipelines).
    Memory {},
    /// Read-only HTTP(S) source.
    Https {},
    /// S3 or S3-compatible object store. `endpoint_url` present means an
    /// S3-compatible service addressed as `s3://host:port/bucket/key`;
    /// absent means AWS addressed as `s3://bucket/key`. Handles are supplied
    /// externally via a filesystem factory; extra keys pass through to it.
    S3 {
        bucket: String,
        #[serde(default)]
        endpoint_url: Option<String>,
        #[serde(default)]
        region: Option<String>,
        #[serde(flatten)]
        options: BTreeMap<String, ArgValue>,
    },
}

impl FsEntry {
    /// The protocol string this entry serves.
    pub fn protocol(&self) -> &'static str {
        match self {
            FsEntry::File { .. } => "file",
            FsEntry::Memory {} => "memory",
            FsEntry::Https {} => "https",
            FsEntry::S3 { .. } => "s3",
        }
    }
}

/// Staged-write defaults.
///
/// Runtime state (scoped guards, the environment toggle) lives with the
/// catalog; this entry only supplies the config-level default and the shadow
/// tree prefix.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StagingEntry {
    pub enabled: bool,
    pub prefix: String,
}

impl Default for StagingEntry {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: "stage".to_string(),
        }
    }
}
