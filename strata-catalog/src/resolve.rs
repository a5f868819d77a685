use std::collections::BTreeMap;

use strata_config::ConfigSource;
use strata_result::{Error, Result};

use crate::dataset::{Dataset, DatasetOptions};
use crate::format::Format;

/// Per-layer fallback entry name.
///
/// A layer that declares a `_dynamic` entry accepts any dataset name; the
/// entry acts as a template whose placeholders (typically `{name}`) are
/// filled from the requested identifier.
pub const DYNAMIC_DATASET: &str = "_dynamic";

/// Resolve `(layer, name)` plus caller overrides into a [`Dataset`].
///
/// Lookup falls back to the layer's [`DYNAMIC_DATASET`] entry when no
/// concrete entry exists; descriptors built that way are marked `dynamic`.
/// Map-valued overrides merge onto the entry (override wins per key), scalar
/// overrides replace, and parameters naming declared partition columns are
/// moved into the pinned partition set before the prefix rule is checked.
///
/// Resolution is pure: it performs no I/O and the same inputs always produce
/// the same descriptor.
pub fn resolve_dataset(
    config: &dyn ConfigSource,
    layer: &str,
    name: &str,
    options: DatasetOptions,
) -> Result<Dataset> {
    let (entry, dynamic) = match config.dataset_entry(layer, name) {
        Some(entry) => (entry, false),
        None => match config.dataset_entry(layer, DYNAMIC_DATASET) {
            Some(entry) => (entry, true),
            None => {
                return Err(Error::DatasetNotFound {
                    layer: layer.to_string(),
                    name: name.to_string(),
                })
            }
        },
    };

    if options.params.contains_key("location") {
        return Err(Error::configuration(
            "the dataset location cannot be overridden; parameterize it via `params` placeholders instead",
        ));
    }
    if options.format.is_some() && !dynamic {
        return Err(Error::configuration(format!(
            "format can only be overridden for dynamic datasets; '{layer}.{name}' is statically configured"
        )));
    }

    let format = match options.format {
        Some(format) => format,
        None => match entry.format.as_deref() {
            Some(raw) => raw.parse().map_err(|_| {
                Error::configuration(format!(
                    "dataset '{layer}.{name}' declares unknown format '{raw}'"
                ))
            })?,
            None => Format::default(),
        },
    };

    let mut args = entry.args;
    args.extend(options.args);
    let mut read_args = entry.read_args;
    read_args.extend(options.read_args);
    let mut write_args = entry.write_args;
    write_args.extend(options.write_args);

    let mut params: BTreeMap<String, String> = entry
        .params
        .into_iter()
        .map(|(key, value)| (key, value.to_string()))
        .collect();
    params.extend(options.params);

    let mut partitions = BTreeMap::new();
    for key in &entry.partition_by {
        if let Some(value) = params.remove(key) {
            partitions.insert(key.clone(), value);
        }
    }

    let dataset = Dataset {
        layer: layer.to_string(),
        name: name.to_string(),
        location: entry.location,
        format,
        protocol: entry.protocol,
        partition_by: entry.partition_by,
        partitions,
        params,
        args,
        read_args,
        write_args,
        columns: options.columns.or(entry.columns),
        compression: options.compression.or(entry.compression),
        dynamic,
    };

    validate_partitions(&dataset)?;
    Ok(dataset)
}

/// Check that pinned partition keys form a contiguous prefix of
/// `partition_by`.
///
/// For `partition_by = [a, b, c]` the valid pin-sets are `{}`, `{a}`,
/// `{a, b}` and `{a, b, c}`. A pinned key that is not declared at all is
/// also a violation. The offending descriptor travels with the error.
pub fn validate_partitions(dataset: &Dataset) -> Result<()> {
    for key in dataset.partitions.keys() {
        if !dataset.partition_by.contains(key) {
            return Err(Error::Partition {
                message: format!(
                    "partition key '{key}' is not declared in partition_by {:?}",
                    dataset.partition_by
                ),
                dataset: Box::new(dataset.id()),
            });
        }
    }

    let mut first_unpinned: Option<&str> = None;
    for key in &dataset.partition_by {
        if dataset.partitions.contains_key(key) {
            if let Some(gap) = first_unpinned {
                return Err(Error::Partition {
                    message: format!(
                        "partition key '{key}' is pinned but earlier key '{gap}' is not; \
                         pinned keys must form a prefix of {:?}",
                        dataset.partition_by
                    ),
                    dataset: Box::new(dataset.id()),
                });
            }
        } else if first_unpinned.is_none() {
            first_unpinned = Some(key);
        }
    }
    Ok(())
}
