use std::io::Cursor;
use std::sync::Arc;

use arrow::csv::reader::Format as CsvFormat;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use strata_catalog::{Dataset, Format};
use strata_config::{ArgMap, ArgValue};
use strata_fs::FileSystem;
use strata_result::{Error, Result};

use crate::codec::TableCodec;
use crate::codecs::{file_projection, with_partitions};
use crate::table::Table;

/// Delimited text files.
///
/// CSV datasets are always single files: `partition_by` still shapes the
/// dataset's path (pinned values become directory segments) but the file
/// itself is written whole. The schema is inferred on every read, capped by
/// `max_read_records`.
#[derive(Debug)]
pub struct CsvCodec;

impl TableCodec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn read_args(&self) -> &'static [&'static str] {
        &["has_header", "delimiter", "max_read_records", "batch_size"]
    }

    fn write_args(&self) -> &'static [&'static str] {
        &["has_header", "delimiter"]
    }

    fn read(
        &self,
        fs: &dyn FileSystem,
        path: &str,
        ds: &Dataset,
        args: &ArgMap,
    ) -> Result<Table> {
        if fs.is_dir(path)? {
            return Err(Error::invalid_argument(format!(
                "csv datasets are single files but '{path}' is a directory"
            )));
        }
        let data = fs.cat_file(path)?;
        let format = CsvFormat::default()
            .with_header(has_header(args))
            .with_delimiter(delimiter(args)?);
        let max_read_records = args.get("max_read_records").and_then(ArgValue::as_usize);
        let (inferred, _) = format.infer_schema(Cursor::new(data.as_ref()), max_read_records)?;
        let file_schema = Arc::new(inferred);

        let mut schema = file_schema.clone();
        let mut builder = ReaderBuilder::new(file_schema.clone()).with_format(format);
        if let Some(columns) = &file_projection(ds) {
            let indices = columns
                .iter()
                .map(|column| file_schema.index_of(column))
                .collect::<std::result::Result<Vec<usize>, _>>()?;
            schema = Arc::new(file_schema.project(&indices)?);
            builder = builder.with_projection(indices);
        }
        if let Some(size) = args.get("batch_size").and_then(ArgValue::as_usize) {
            builder = builder.with_batch_size(size);
        }
        let reader = builder.build(Cursor::new(data.as_ref()))?;
        let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, _>>()?;

        let pinned: Vec<(String, String)> = ds
            .pinned_partitions()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let table = with_partitions(&schema, &pinned, batches)?;
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
        _ds: &Dataset,
        args: &ArgMap,
    ) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .with_header(has_header(args))
            .with_delimiter(delimiter(args)?)
            .build(Vec::new());
        for batch in table.batches() {
            writer.write(batch)?;
        }
        fs.pipe_file(path, &writer.into_inner())
    }
}

fn has_header(args: &ArgMap) -> bool {
    args.get("has_header")
        .and_then(ArgValue::as_bool)
        .unwrap_or(true)
}

fn delimiter(args: &ArgMap) -> Result<u8> {
    match args.get("delimiter") {
        None => Ok(b','),
        Some(value) => value.as_u8_char().ok_or_else(|| {
            Error::invalid_argument("csv delimiter must be a single one-byte character")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::DataType;
    use strata_catalog::{resolve_dataset, DatasetOptions};
    use strata_config::{DatasetEntry, StaticConfig};
    use strata_fs::MemoryFs;

    fn dataset(options: DatasetOptions) -> Dataset {
        let config = StaticConfig::new().with_dataset(
            "raw",
            "people",
            DatasetEntry {
                location: "memory://people.csv".to_string(),
                format: Some("csv".to_string()),
                ..DatasetEntry::default()
            },
        );
        resolve_dataset(&config, "raw", "people", options).unwrap()
    }

    #[test]
    fn infers_types_from_content() {
        let fs = MemoryFs::new();
        fs.pipe_file("/people.csv", b"name,age\nalice,30\nbob,41\n")
            .unwrap();
        let ds = dataset(DatasetOptions::new());
        let table = CsvCodec.read(&fs, "/people.csv", &ds, &ArgMap::new()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(table.schema().field(1).data_type(), &DataType::Int64);
    }

    #[test]
    fn round_trips_with_custom_delimiter() {
        let fs = MemoryFs::new();
        let ds = dataset(DatasetOptions::new());
        let args: ArgMap = [("delimiter".to_string(), ";".into())].into_iter().collect();

        let schema = Arc::new(arrow::datatypes::Schema::new(vec![
            arrow::datatypes::Field::new("id", DataType::Int64, false),
            arrow::datatypes::Field::new("name", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["a", "b"])),
            ],
        )
        .unwrap();
        let table = Table::from_batches(schema, vec![batch]);

        CsvCodec.write(&table, &fs, "/people.csv", &ds, &args).unwrap();
        let raw = fs.cat_file("/people.csv").unwrap();
        assert!(raw.as_ref().starts_with(b"id;name\n"));

        let back = CsvCodec.read(&fs, "/people.csv", &ds, &args).unwrap();
        assert_eq!(back.num_rows(), 2);
        assert_eq!(back.schema().field(1).name(), "name");
    }

    #[test]
    fn headerless_files_need_the_flag() {
        let fs = MemoryFs::new();
        fs.pipe_file("/people.csv", b"alice,30\nbob,41\n").unwrap();
        let ds = dataset(DatasetOptions::new());
        let args: ArgMap = [("has_header".to_string(), false.into())]
            .into_iter()
            .collect();
        let table = CsvCodec.read(&fs, "/people.csv", &ds, &args).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.schema().fields().len(), 2);
    }

    #[test]
    fn projection_by_name() {
        let fs = MemoryFs::new();
        fs.pipe_file("/people.csv", b"name,age\nalice,30\n").unwrap();
        let ds = Dataset {
            columns: Some(vec!["age".to_string()]),
            ..dataset(DatasetOptions::new())
        };
        let table = CsvCodec.read(&fs, "/people.csv", &ds, &ArgMap::new()).unwrap();
        assert_eq!(table.schema().fields().len(), 1);
        assert_eq!(table.schema().field(0).name(), "age");
    }

    #[test]
    fn directory_paths_are_rejected() {
        let fs = MemoryFs::new();
        fs.pipe_file("/people.csv/part", b"x").unwrap();
        let ds = dataset(DatasetOptions::new());
        let err = CsvCodec
            .read(&fs, "/people.csv", &ds, &ArgMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn bad_delimiter_is_rejected() {
        let args: ArgMap = [("delimiter".to_string(), "||".into())].into_iter().collect();
        assert!(delimiter(&args).is_err());
    }
}
