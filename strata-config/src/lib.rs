//! Configuration model for the strata dataset toolkit.
//!
//! Configuration is injected, never global: everything that needs settings
//! takes a [`ConfigSource`] (usually as `Arc<dyn ConfigSource>`). The trait
//! answers three questions:
//!
//! - which datasets exist, per `(layer, name)` ([`DatasetEntry`])
//! - which filesystems are configured, in declaration order ([`FsEntry`])
//! - whether staged writes are on by default ([`StagingEntry`])
//!
//! Two implementations ship here: [`YamlConfig`], which loads a YAML document
//! while preserving the declaration order of the `filesystems` mapping (that
//! order breaks routing-score ties), and [`StaticConfig`], a programmatic
//! builder for tests and embedding.

pub mod entries;
pub mod source;
pub mod value;
pub mod yaml;

pub use entries::{DatasetEntry, FsEntry, StagingEntry};
pub use source::{ConfigSource, StaticConfig};
pub use value::{ArgMap, ArgValue};
pub use yaml::YamlConfig;
