//! Built-in format codecs.
//!
//! `parquet` and `feather` understand both single files and Hive-partitioned
//! directory trees; `csv` and `json` are single-file formats. All four are
//! protocol-agnostic: they only talk to a [`FileSystem`](strata_fs::FileSystem)
//! through whole-file reads and writes, so they work over any routed backend.

pub mod csv;
pub mod feather;
pub mod json;
pub mod parquet;

pub use self::csv::CsvCodec;
pub use self::feather::FeatherCodec;
pub use self::json::JsonCodec;
pub use self::parquet::ParquetCodec;

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use strata_catalog::Dataset;
use strata_fs::FileSystem;
use strata_result::{Error, Result};

use crate::hive::{attach_partition_columns, file_partitions, relative_path};
use crate::table::Table;

/// One decoded data file: its (projected) schema and batches, before any
/// partition columns are attached.
pub(crate) struct FileTable {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

/// The data files of a dataset path: the path itself when it is a single
/// file, otherwise every file below it. Dotfiles and `_`-prefixed marker
/// files (`_SUCCESS` and friends) are skipped.
pub(crate) fn data_files(fs: &dyn FileSystem, path: &str) -> Result<Vec<String>> {
    if !fs.is_dir(path)? {
        return Ok(vec![path.to_string()]);
    }
    Ok(fs
        .find(path)?
        .into_iter()
        .filter(|file| {
            let name = file.rsplit('/').next().unwrap_or(file);
            !name.starts_with('.') && !name.starts_with('_')
        })
        .collect())
}

/// File columns left after removing the dataset's partition columns.
///
/// Partition columns never live inside the data files, so a caller
/// projection must be split: this part is pushed down to the file reader,
/// the partition part is satisfied from paths.
pub(crate) fn file_projection(ds: &Dataset) -> Option<Vec<String>> {
    ds.columns.as_ref().map(|columns| {
        columns
            .iter()
            .filter(|column| !ds.partition_by.contains(column))
            .cloned()
            .collect()
    })
}

/// Combine a file's batches with its partition assignment into a table.
///
/// When the file decoded to zero batches, the schema shape is preserved so
/// empty datasets still read as typed empty tables.
pub(crate) fn with_partitions(
    schema: &SchemaRef,
    partitions: &[(String, String)],
    batches: Vec<RecordBatch>,
) -> Result<Table> {
    if batches.is_empty() {
        let mut fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|field| field.as_ref().clone())
            .collect();
        for (key, _) in partitions {
            if schema.field_with_name(key).is_err() {
                fields.push(Field::new(key, DataType::Utf8, false));
            }
        }
        return Ok(Table::new(Arc::new(Schema::new(fields))));
    }
    Table::try_from_batches(attach_partition_columns(batches, partitions)?)
}

/// Decode every data file under `base`, attach partition columns, and
/// collect the result into one table. `decode` turns one file path into a
/// [`FileTable`].
pub(crate) fn assemble(
    files: &[String],
    base: &str,
    ds: &Dataset,
    mut decode: impl FnMut(&str) -> Result<FileTable>,
) -> Result<Table> {
    let mut schema: Option<SchemaRef> = None;
    let mut batches = Vec::new();
    for file in files {
        let partitions = file_partitions(ds, relative_path(base, file))?;
        let decoded = decode(file)?;
        let table = with_partitions(&decoded.schema, &partitions, decoded.batches)?;
        if schema.is_none() {
            schema = Some(table.schema().clone());
        }
        batches.extend_from_slice(table.batches());
    }
    match schema {
        Some(schema) => Ok(Table::from_batches(schema, batches)),
        None => Err(Error::invalid_argument(format!(
            "no data files under '{base}'"
        ))),
    }
}
