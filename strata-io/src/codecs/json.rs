use std::io::Cursor;
use std::sync::Arc;

use arrow::json::reader::infer_json_schema;
use arrow::json::{LineDelimitedWriter, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use strata_catalog::{Dataset, Format};
use strata_config::{ArgMap, ArgValue};
use strata_fs::FileSystem;
use strata_result::{Error, Result};

use crate::codec::TableCodec;
use crate::codecs::with_partitions;
use crate::table::Table;

/// Line-delimited JSON files.
///
/// Single-file like csv. The schema is inferred from the records
/// themselves (capped by `max_read_records`); projection has no reader
/// support here, so it is applied after decoding.
#[derive(Debug)]
pub struct JsonCodec;

impl TableCodec for JsonCodec {
    fn format(&self) -> Format {
        Format::Json
    }

    fn read_args(&self) -> &'static [&'static str] {
        &["max_read_records", "batch_size"]
    }

    fn write_args(&self) -> &'static [&'static str] {
        &[]
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
                "json datasets are single files but '{path}' is a directory"
            )));
        }
        let data = fs.cat_file(path)?;
        let max_read_records = args.get("max_read_records").and_then(ArgValue::as_usize);
        let (inferred, _) = infer_json_schema(Cursor::new(data.as_ref()), max_read_records)?;
        let schema = Arc::new(inferred);

        let mut builder = ReaderBuilder::new(schema.clone());
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
        _args: &ArgMap,
    ) -> Result<()> {
        let mut writer = LineDelimitedWriter::new(Vec::new());
        for batch in table.batches() {
            writer.write(batch)?;
        }
        writer.finish()?;
        fs.pipe_file(path, &writer.into_inner())
    }
}
