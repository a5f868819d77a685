use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use strata_catalog::{Dataset, Format};
use strata_config::{ArgMap, ArgValue};
use strata_fs::FileSystem;
use strata_result::{Error, Result};

use crate::codec::TableCodec;
use crate::codecs::{assemble, data_files, file_projection, FileTable};
use crate::hive::split_for_write;
use crate::table::Table;

/// Parquet files, single or Hive-partitioned.
///
/// Reads pull whole files into memory through `cat_file` and decode them
/// with the arrow reader, so the codec works over any backend. Column
/// projection is pushed into the parquet reader; when a projection asks
/// only for partition columns, row counts come straight from file metadata
/// and nothing is decoded.
#[derive(Debug)]
pub struct ParquetCodec;

impl TableCodec for ParquetCodec {
    fn format(&self) -> Format {
        Format::Parquet
    }

    fn read_args(&self) -> &'static [&'static str] {
        &["batch_size"]
    }

    fn write_args(&self) -> &'static [&'static str] {
        &["compression", "max_row_group_size"]
    }

    fn read(
        &self,
        fs: &dyn FileSystem,
        path: &str,
        ds: &Dataset,
        args: &ArgMap,
    ) -> Result<Table> {
        let file_columns = file_projection(ds);
        let metadata_only = ds
            .columns
            .as_ref()
            .is_some_and(|requested| !requested.is_empty())
            && file_columns.as_ref().is_some_and(Vec::is_empty);

        let files = data_files(fs, path)?;
        let table = assemble(&files, path, ds, |file| {
            let data = fs.cat_file(file)?;
            if metadata_only {
                return counted_stub(data);
            }
            decode(data, file_columns.as_deref(), args)
        })?;

        match &ds.columns {
            Some(columns) => table.select(columns),
            None => Ok(table),
        }
    }

    fn write(
        &self,
        table: &Table,
        fs: &dyn FileSystem,
        path: &str,
        ds: &Dataset,
        args: &ArgMap,
    ) -> Result<()> {
        let unpinned: Vec<String> = ds.unpinned_partition_keys().map(str::to_string).collect();
        if unpinned.is_empty() {
            let data = encode(&table.to_batch()?, ds, args)?;
            return fs.pipe_file(path, &data);
        }
        for (dir, batch) in split_for_write(table, &unpinned)? {
            let dir_path = format!("{path}/{dir}");
            fs.makedirs(&dir_path)?;
            let data = encode(&batch, ds, args)?;
            fs.pipe_file(&format!("{dir_path}/part-0.parquet"), &data)?;
        }
        Ok(())
    }
}

fn decode(data: Bytes, columns: Option<&[String]>, args: &ArgMap) -> Result<FileTable> {
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    if let Some(size) = args.get("batch_size").and_then(ArgValue::as_usize) {
        builder = builder.with_batch_size(size);
    }
    let file_schema = builder.schema().clone();
    let mut schema = file_schema.clone();
    if let Some(columns) = columns {
        let indices = columns
            .iter()
            .map(|column| file_schema.index_of(column))
            .collect::<std::result::Result<Vec<usize>, _>>()?;
        schema = Arc::new(file_schema.project(&indices)?);
        let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
        builder = builder.with_projection(mask);
    }
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()?;
    Ok(FileTable { schema, batches })
}

/// A column-less batch carrying only the file's row count, read from
/// parquet metadata. Partition columns are attached by the caller.
fn counted_stub(data: Bytes) -> Result<FileTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(data)?;
    let rows = usize::try_from(builder.metadata().file_metadata().num_rows()).unwrap_or(0);
    let schema = Arc::new(Schema::empty());
    let batch = RecordBatch::try_new_with_options(
        schema.clone(),
        Vec::new(),
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )?;
    Ok(FileTable {
        schema,
        batches: vec![batch],
    })
}

fn encode(batch: &RecordBatch, ds: &Dataset, args: &ArgMap) -> Result<Vec<u8>> {
    let compression = args
        .get("compression")
        .and_then(ArgValue::as_str)
        .map(str::to_string)
        .or_else(|| ds.compression.clone());
    let mut props = WriterProperties::builder().set_compression(parse_compression(
        compression.as_deref(),
    )?);
    if let Some(size) = args.get("max_row_group_size").and_then(ArgValue::as_usize) {
        props = props.set_max_row_group_size(size);
    }

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props.build()))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buffer)
}

fn parse_compression(name: Option<&str>) -> Result<Compression> {
    let Some(name) = name else {
        return Ok(Compression::SNAPPY);
    };
    match name.to_ascii_lowercase().as_str() {
        "snappy" => Ok(Compression::SNAPPY),
        "zstd" => Ok(Compression::ZSTD(ZstdLevel::default())),
        "gzip" => Ok(Compression::GZIP(GzipLevel::default())),
        "lz4" => Ok(Compression::LZ4),
        "uncompressed" | "none" => Ok(Compression::UNCOMPRESSED),
        other => Err(Error::invalid_argument(format!(
            "unsupported parquet compression '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field};
    use strata_catalog::{resolve_dataset, DatasetOptions};
    use strata_config::{DatasetEntry, StaticConfig};
    use strata_fs::MemoryFs;

    fn dataset(partition_by: &[&str], options: DatasetOptions) -> Dataset {
        let config = StaticConfig::new().with_dataset(
            "raw",
            "orders",
            DatasetEntry {
                location: "memory://orders".to_string(),
                partition_by: partition_by.iter().map(|k| k.to_string()).collect(),
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
    fn single_file_round_trip() {
        let fs = MemoryFs::new();
        let ds = dataset(&[], DatasetOptions::new());
        let codec = ParquetCodec;
        codec
            .write(&sample(), &fs, "/orders", &ds, &ArgMap::new())
            .unwrap();
        let table = codec.read(&fs, "/orders", &ds, &ArgMap::new()).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.schema().fields().len(), 2);
    }

    #[test]
    fn partitioned_write_splits_directories() {
        let fs = MemoryFs::new();
        let ds = dataset(&["year"], DatasetOptions::new());
        let codec = ParquetCodec;
        codec
            .write(&sample(), &fs, "/orders", &ds, &ArgMap::new())
            .unwrap();
        let files = fs.find("/orders").unwrap();
        assert_eq!(
            files,
            vec![
                "/orders/year=2023/part-0.parquet".to_string(),
                "/orders/year=2024/part-0.parquet".to_string(),
            ]
        );

        let table = codec.read(&fs, "/orders", &ds, &ArgMap::new()).unwrap();
        assert_eq!(table.num_rows(), 3);
        let schema = table.schema();
        assert_eq!(schema.field(0).name(), "id");
        assert_eq!(schema.field(1).name(), "year");
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn projection_reorders_and_filters() {
        let fs = MemoryFs::new();
        let write_ds = dataset(&["year"], DatasetOptions::new());
        let codec = ParquetCodec;
        codec
            .write(&sample(), &fs, "/orders", &write_ds, &ArgMap::new())
            .unwrap();

        let read_ds = Dataset {
            columns: Some(vec!["year".to_string(), "id".to_string()]),
            ..write_ds
        };
        let table = codec.read(&fs, "/orders", &read_ds, &ArgMap::new()).unwrap();
        assert_eq!(table.schema().field(0).name(), "year");
        assert_eq!(table.schema().field(1).name(), "id");
    }

    #[test]
    fn partition_only_projection_skips_decoding() {
        let fs = MemoryFs::new();
        let write_ds = dataset(&["year"], DatasetOptions::new());
        let codec = ParquetCodec;
        codec
            .write(&sample(), &fs, "/orders", &write_ds, &ArgMap::new())
            .unwrap();

        let read_ds = Dataset {
            columns: Some(vec!["year".to_string()]),
            ..write_ds
        };
        let table = codec.read(&fs, "/orders", &read_ds, &ArgMap::new()).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.schema().fields().len(), 1);
        let years = table
            .to_batch()
            .unwrap()
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|array| {
                (0..array.len())
                    .map(|i| array.value(i).to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap();
        assert_eq!(years, vec!["2023", "2023", "2024"]);
    }

    #[test]
    fn batch_size_limits_batch_rows() {
        let fs = MemoryFs::new();
        let ds = dataset(&[], DatasetOptions::new());
        let codec = ParquetCodec;
        codec
            .write(&sample(), &fs, "/orders", &ds, &ArgMap::new())
            .unwrap();
        let args: ArgMap = [("batch_size".to_string(), 1.into())].into_iter().collect();
        let table = codec.read(&fs, "/orders", &ds, &args).unwrap();
        assert!(table.batches().iter().all(|batch| batch.num_rows() <= 1));
        assert_eq!(table.num_rows(), 3);
    }

    #[test]
    fn compression_names_are_validated() {
        assert!(parse_compression(Some("zstd")).is_ok());
        assert!(parse_compression(None).is_ok());
        assert!(matches!(
            parse_compression(Some("brotli-ish")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_table_round_trips_with_schema() {
        let fs = MemoryFs::new();
        let ds = dataset(&[], DatasetOptions::new());
        let codec = ParquetCodec;
        let empty = Table::new(sample().schema().clone());
        codec
            .write(&empty, &fs, "/orders", &ds, &ArgMap::new())
            .unwrap();
        let table = codec.read(&fs, "/orders", &ds, &ArgMap::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.schema().fields().len(), 2);
    }
}
