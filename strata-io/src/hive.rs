//! Hive-style partition path handling shared by the directory-capable
//! codecs.
//!
//! A partitioned dataset is a directory tree whose levels are `key=value`
//! segments, one level per `partition_by` column. Data files never store the
//! partition columns; readers re-attach them from the file paths (plus the
//! descriptor's pinned values, which the base path already encodes) and
//! writers split rows across directories before encoding.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt32Array};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use strata_catalog::Dataset;
use strata_result::{Error, Result};

use crate::table::Table;

/// The portion of `path` below `base`, without a leading slash.
pub fn relative_path<'a>(base: &str, path: &'a str) -> &'a str {
    path.strip_prefix(base)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(path)
}

/// Every `key=value` segment of a relative file path, in path order.
pub fn parse_path_segments(relative: &str) -> Vec<(String, String)> {
    relative
        .split('/')
        .filter_map(|segment| {
            segment
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Full partition assignment for one data file, in `partition_by` order.
///
/// Pinned descriptor values cover the keys the base path already encodes;
/// the rest must appear as `key=value` segments in the file's relative
/// path. A declared key found in neither place is an addressing error.
pub fn file_partitions(ds: &Dataset, relative: &str) -> Result<Vec<(String, String)>> {
    let parsed: BTreeMap<String, String> = parse_path_segments(relative).into_iter().collect();
    ds.partition_by
        .iter()
        .map(|key| {
            if let Some(value) = ds.partitions.get(key) {
                Ok((key.clone(), value.clone()))
            } else if let Some(value) = parsed.get(key) {
                Ok((key.clone(), value.clone()))
            } else {
                Err(Error::invalid_argument(format!(
                    "file '{relative}' has no '{key}=' segment for partition column '{key}'"
                )))
            }
        })
        .collect()
}

/// Append partition columns to every batch, as Utf8, after the file
/// columns.
///
/// Values are path-derived strings, so the columns are always Utf8. Keys
/// already present in the file schema are left alone.
pub fn attach_partition_columns(
    batches: Vec<RecordBatch>,
    partitions: &[(String, String)],
) -> Result<Vec<RecordBatch>> {
    batches
        .into_iter()
        .map(|batch| {
            let schema = batch.schema();
            let mut fields: Vec<Field> = schema
                .fields()
                .iter()
                .map(|field| field.as_ref().clone())
                .collect();
            let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
            for (key, value) in partitions {
                if schema.field_with_name(key).is_ok() {
                    continue;
                }
                fields.push(Field::new(key, DataType::Utf8, false));
                columns.push(Arc::new(StringArray::from(vec![
                    value.as_str();
                    batch.num_rows()
                ])));
            }
            Ok(RecordBatch::try_new(
                Arc::new(Schema::new(fields)),
                columns,
            )?)
        })
        .collect()
}

/// Split a table into per-directory batches for a partitioned write.
///
/// Rows are grouped by their rendered values in the `keys` columns; each
/// group becomes one `k1=v1/k2=v2` relative directory with the partition
/// columns dropped from its batch. Groups come back sorted by directory
/// path, so write order is deterministic.
pub fn split_for_write(table: &Table, keys: &[String]) -> Result<Vec<(String, RecordBatch)>> {
    let batch = table.to_batch()?;
    let schema = batch.schema();

    let mut key_indices = Vec::with_capacity(keys.len());
    for key in keys {
        let index = schema.index_of(key).map_err(|_| {
            Error::invalid_argument(format!(
                "a partitioned write requires column '{key}' in the table"
            ))
        })?;
        key_indices.push(index);
    }
    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|index| !key_indices.contains(index))
        .collect();
    if data_indices.is_empty() {
        return Err(Error::invalid_argument(
            "a partitioned write needs at least one non-partition column",
        ));
    }

    let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let mut dir = String::new();
        for (key, &index) in keys.iter().zip(&key_indices) {
            if !dir.is_empty() {
                dir.push('/');
            }
            dir.push_str(key);
            dir.push('=');
            dir.push_str(&array_value_to_string(batch.column(index), row)?);
        }
        groups.entry(dir).or_default().push(row as u32);
    }

    let data_schema = Arc::new(schema.project(&data_indices)?);
    groups
        .into_iter()
        .map(|(dir, rows)| {
            let indices = UInt32Array::from(rows);
            let columns = data_indices
                .iter()
                .map(|&index| compute::take(batch.column(index), &indices, None))
                .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;
            Ok((dir, RecordBatch::try_new(data_schema.clone(), columns)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use strata_catalog::{resolve_dataset, DatasetOptions};
    use strata_config::{DatasetEntry, StaticConfig};

    fn dataset(options: DatasetOptions) -> Dataset {
        let config = StaticConfig::new().with_dataset(
            "raw",
            "orders",
            DatasetEntry {
                location: "memory://orders".to_string(),
                partition_by: vec!["year".to_string(), "month".to_string()],
                ..DatasetEntry::default()
            },
        );
        resolve_dataset(&config, "raw", "orders", options).unwrap()
    }

    fn sample() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("year", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["2023", "2024", "2023"])),
            ],
        )
        .unwrap();
        Table::from_batches(schema, vec![batch])
    }

    #[test]
    fn relative_path_strips_base_and_slash() {
        assert_eq!(
            relative_path("/data/orders", "/data/orders/year=2024/part-0.parquet"),
            "year=2024/part-0.parquet"
        );
        assert_eq!(relative_path("/other", "/data/x"), "/data/x");
    }

    #[test]
    fn parses_key_value_segments_only() {
        let parsed = parse_path_segments("year=2024/month=03/part-0.parquet");
        assert_eq!(
            parsed,
            vec![
                ("year".to_string(), "2024".to_string()),
                ("month".to_string(), "03".to_string()),
            ]
        );
    }

    #[test]
    fn file_partitions_combine_pins_and_path() {
        let ds = dataset(DatasetOptions::new().param("year", 2024));
        let partitions = file_partitions(&ds, "month=03/part-0.parquet").unwrap();
        assert_eq!(
            partitions,
            vec![
                ("year".to_string(), "2024".to_string()),
                ("month".to_string(), "03".to_string()),
            ]
        );
    }

    #[test]
    fn missing_partition_segment_is_rejected() {
        let ds = dataset(DatasetOptions::new());
        let err = file_partitions(&ds, "part-0.parquet").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument(msg) if msg.contains("'year'")
        ));
    }

    #[test]
    fn attaches_partition_columns_after_file_columns() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![1, 2]))],
        )
        .unwrap();
        let partitions = vec![("year".to_string(), "2024".to_string())];
        let batches = attach_partition_columns(vec![batch], &partitions).unwrap();
        let schema = batches[0].schema();
        assert_eq!(schema.field(0).name(), "id");
        assert_eq!(schema.field(1).name(), "year");
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        let years = batches[0]
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(years.value(0), "2024");
        assert_eq!(years.value(1), "2024");
    }

    #[test]
    fn split_groups_rows_and_drops_key_columns() {
        let splits = split_for_write(&sample(), &["year".to_string()]).unwrap();
        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].0, "year=2023");
        assert_eq!(splits[0].1.num_rows(), 2);
        assert_eq!(splits[1].0, "year=2024");
        assert_eq!(splits[1].1.num_rows(), 1);
        for (_, batch) in &splits {
            assert_eq!(batch.num_columns(), 1);
            assert_eq!(batch.schema().field(0).name(), "id");
        }
    }

    #[test]
    fn split_requires_the_key_column() {
        let err = split_for_write(&sample(), &["month".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument(msg) if msg.contains("'month'")
        ));
    }

    #[test]
    fn split_refuses_partition_only_tables() {
        let schema = Arc::new(Schema::new(vec![Field::new("year", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["2024"]))],
        )
        .unwrap();
        let table = Table::from_batches(schema, vec![batch]);
        assert!(split_for_write(&table, &["year".to_string()]).is_err());
    }
}
