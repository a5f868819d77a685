//! Format-aware dataset I/O for Strata.
//!
//! This crate turns the logical dataset descriptors produced by
//! [`strata_catalog`] into actual reads and writes against the filesystems
//! routed by [`strata_fs`]. Its entry point is [`Catalog`], which holds the
//! configuration, the filesystem router, the codec [`Dispatcher`] and the
//! staging override stack behind one cloneable handle.
//!
//! # Architecture
//!
//! - [`Table`]: the in-memory unit of exchange, an Arrow schema plus record
//!   batches
//! - [`TableCodec`]: the per-format engine trait; built-ins cover parquet,
//!   feather (Arrow IPC), csv and json
//! - [`Dispatcher`]: routes `(format, protocol)` to a codec, with runtime
//!   registration for protocol-specialized or custom formats
//! - [`Catalog`]: read/write/copy/list operations plus staging indirection
//!
//! Partitioned datasets use hive-style `key=value` directories. Reads fold
//! the path segments back in as string columns; writes split one table into
//! per-directory files.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata_config::{DatasetEntry, StaticConfig};
//! use strata_io::{Catalog, DatasetOptions};
//!
//! # fn main() -> strata_result::Result<()> {
//! let config = StaticConfig::new().with_dataset(
//!     "raw",
//!     "orders",
//!     DatasetEntry {
//!         location: "file:///data/{layer}/{name}".to_string(),
//!         ..DatasetEntry::default()
//!     },
//! );
//! let catalog = Catalog::new(Arc::new(config));
//! let orders = catalog.read_table("raw", "orders", DatasetOptions::default())?;
//! println!("{} rows", orders.num_rows());
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod catalog;
pub mod codec;
pub mod codecs;
pub mod hive;
pub mod staging;
pub mod table;

pub use catalog::Catalog;
pub use codec::{Dispatcher, TableCodec};
pub use staging::{StagingGuard, STAGING_ENV};
pub use table::Table;

// The descriptor types every catalog call takes or returns.
pub use strata_catalog::{Dataset, DatasetOptions, Format};
