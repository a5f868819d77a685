//! Dataset model and resolution for the strata dataset toolkit.
//!
//! This crate turns a logical identifier (`layer`, `name`, plus caller
//! overrides) into a [`Dataset`] descriptor and renders its location
//! template into a concrete URI. Nothing here touches a filesystem:
//! resolution and rendering are pure so they can be tested, cached and
//! reasoned about without I/O.
//!
//! The flow is two steps:
//!
//! 1. [`resolve_dataset`] merges the configured entry with a
//!    [`DatasetOptions`] override set, moves partition-key parameters into
//!    the pinned partition set, and validates the partition prefix rule.
//! 2. [`render_location`] substitutes `{placeholder}` occurrences in the
//!    location template and appends pinned partitions as Hive-style
//!    `k=v` path segments.
//!
//! Layers may declare a `_dynamic` entry to accept arbitrary dataset names;
//! descriptors resolved that way are marked [`Dataset::dynamic`] and are the
//! only ones whose format a caller may override.

pub mod dataset;
pub mod format;
pub mod location;
pub mod resolve;

pub use dataset::{Dataset, DatasetOptions};
pub use format::Format;
pub use location::{partition_path, render_location};
pub use resolve::{resolve_dataset, validate_partitions, DYNAMIC_DATASET};
