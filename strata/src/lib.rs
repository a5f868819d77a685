//! Strata: declarative, format-aware dataset access.
//!
//! This crate is the primary entrypoint for the strata dataset toolkit. It
//! re-exports the catalog, configuration and filesystem layers from the
//! underlying `strata-*` crates, providing a unified API surface for users.
//!
//! Datasets are addressed by `(layer, name)` instead of by path: a
//! configuration source maps each pair to a location template, a format and
//! an optional partition layout, and a [`Catalog`] turns that mapping into
//! reads and writes over routed filesystem backends.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::config::{DatasetEntry, StaticConfig};
//! use strata::{Catalog, DatasetOptions};
//!
//! let config = StaticConfig::new().with_dataset(
//!     "raw",
//!     "blob",
//!     DatasetEntry {
//!         location: "memory://lake/{layer}/{name}".to_string(),
//!         format: Some("bytes".to_string()),
//!         ..DatasetEntry::default()
//!     },
//! );
//! let catalog = Catalog::new(Arc::new(config));
//! catalog
//!     .write_bytes(b"payload", "raw", "blob", DatasetOptions::new())
//!     .unwrap();
//! let data = catalog
//!     .read_bytes("raw", "blob", DatasetOptions::new())
//!     .unwrap();
//! assert_eq!(data.as_ref(), b"payload");
//! ```
//!
//! # Architecture
//!
//! Strata is organized as a layered workspace:
//!
//! - **Catalog** (`strata-io`): The [`Catalog`] context, format codecs and
//!   the `(format, protocol)` dispatcher.
//! - **Resolution** (`strata-catalog`): Dataset descriptors, option merging,
//!   partition validation and location-template rendering.
//! - **Configuration** (`strata-config`): The [`config::ConfigSource`] trait
//!   with YAML-backed and programmatic implementations.
//! - **Filesystems** (`strata-fs`): The blocking [`fs::FileSystem`] trait,
//!   local/memory/HTTP backends and URI routing.
//!
//! # Re-exports
//!
//! - [`Catalog`], [`DatasetOptions`], [`Table`]: the main user-facing API.
//! - [`config`]: configuration sources and entry types.
//! - [`fs`]: filesystem backends and routing.
//! - [`Error`], [`Result`]: the unified error type.

// The catalog is the primary user-facing API.
pub use strata_io::{
    Catalog, Dataset, DatasetOptions, Dispatcher, Format, StagingGuard, Table, TableCodec,
    STAGING_ENV,
};

pub mod config {
    //! Configuration sources and their entry types.
    //!
    //! A [`ConfigSource`] supplies dataset entries, filesystem entries and
    //! staging defaults; [`YamlConfig`] reads them from a YAML document and
    //! [`StaticConfig`] builds them in code.

    pub use strata_config::{
        ArgMap, ArgValue, ConfigSource, DatasetEntry, FsEntry, StagingEntry, StaticConfig,
        YamlConfig,
    };
}

pub mod fs {
    //! Filesystem backends and URI routing.

    pub use strata_fs::{
        FileInfo, FileSystem, FsFactory, FsRouter, HttpFs, LocalFs, MemoryFs, SplitUri,
    };
}

// Resolution-layer helpers, for callers that work with descriptors directly.
pub use strata_catalog::{partition_path, render_location, resolve_dataset, validate_partitions};

pub use strata_result::{DatasetId, Error, Result};
