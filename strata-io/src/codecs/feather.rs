use std::io::Cursor;
use std::sync::Arc;

use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use strata_catalog::{Dataset, Format};
use strata_config::ArgMap;
use strata_fs::FileSystem;
use strata_result::Result;

use crate::codec::TableCodec;
use crate::codecs::{assemble, data_files, file_projection, FileTable};
use crate::hive::split_for_write;
use crate::table::Table;

/// Arrow IPC files (Feather V2), single or Hive-partitioned.
///
/// Layout behavior mirrors the parquet codec: directory datasets are
/// discovered recursively, partition columns come from paths, and
/// partitioned writes emit one `part-0.feather` per directory. Files are
/// written uncompressed; the IPC reader takes projection by column index.
#[derive(Debug)]
pub struct FeatherCodec;

impl TableCodec for FeatherCodec {
    fn format(&self) -> Format {
        Format::Feather
    }

    fn read_args(&self) -> &'static [&'static str] {
        &[]
    }

    fn write_args(&self) -> &'static [&'static str] {
        &[]
    }

    fn read(
        &self,
        fs: &dyn FileSystem,
        path: &str,
        ds: &Dataset,
        _args: &ArgMap,
    ) -> Result<Table> {
        let file_columns = file_projection(ds);
        let files = data_files(fs, path)?;
        let table = assemble(&files, path, ds, |file| {
            decode(fs.cat_file(file)?, file_columns.as_deref())
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
        _args: &ArgMap,
    ) -> Result<()> {
        let unpinned: Vec<String> = ds.unpinned_partition_keys().map(str::to_string).collect();
        if unpinned.is_empty() {
            let data = encode(&table.to_batch()?)?;
            return fs.pipe_file(path, &data);
        }
        for (dir, batch) in split_for_write(table, &unpinned)? {
            let dir_path = format!("{path}/{dir}");
            fs.makedirs(&dir_path)?;
            let data = encode(&batch)?;
            fs.pipe_file(&format!("{dir_path}/part-0.feather"), &data)?;
        }
        Ok(())
    }
}

fn decode(data: Bytes, columns: Option<&[String]>) -> Result<FileTable> {
    // Footer parse only; batches are not decoded until iteration.
    let probe = FileReader::try_new(Cursor::new(data.clone()), None)?;
    let file_schema = probe.schema();

    let mut schema = file_schema.clone();
    let mut projection = None;
    if let Some(columns) = columns {
        let indices = columns
            .iter()
            .map(|column| file_schema.index_of(column))
            .collect::<std::result::Result<Vec<usize>, _>>()?;
        schema = Arc::new(file_schema.project(&indices)?);
        projection = Some(indices);
    }

    let reader = FileReader::try_new(Cursor::new(data), projection)?;
    let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, _>>()?;
    Ok(FileTable { schema, batches })
}

fn encode(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut writer = FileWriter::try_new(Vec::new(), batch.schema().as_ref())?;
    writer.write(batch)?;
    writer.finish()?;
    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use strata_catalog::{resolve_dataset, DatasetOptions};
    use strata_config::{DatasetEntry, StaticConfig};
    use strata_fs::MemoryFs;

    fn dataset(partition_by: &[&str]) -> Dataset {
        let config = StaticConfig::new().with_dataset(
            "raw",
            "events",
            DatasetEntry {
                location: "memory://events".to_string(),
                format: Some("feather".to_string()),
                partition_by: partition_by.iter().map(|k| k.to_string()).collect(),
                ..DatasetEntry::default()
            },
        );
        resolve_dataset(&config, "raw", "events", DatasetOptions::new()).unwrap()
    }

    fn sample() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("kind", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![10, 20])),
                Arc::new(StringArray::from(vec!["click", "view"])),
            ],
        )
        .unwrap();
        Table::from_batches(schema, vec![batch])
    }

    #[test]
    fn single_file_round_trip() {
        let fs = MemoryFs::new();
        let ds = dataset(&[]);
        let codec = FeatherCodec;
        codec
            .write(&sample(), &fs, "/events", &ds, &ArgMap::new())
            .unwrap();
        let table = codec.read(&fs, "/events", &ds, &ArgMap::new()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.schema().field(1).name(), "kind");
    }

    #[test]
    fn partitioned_round_trip_restores_partition_column() {
        let fs = MemoryFs::new();
        let ds = dataset(&["kind"]);
        let codec = FeatherCodec;
        codec
            .write(&sample(), &fs, "/events", &ds, &ArgMap::new())
            .unwrap();
        let files = fs.find("/events").unwrap();
        assert_eq!(
            files,
            vec![
                "/events/kind=click/part-0.feather".to_string(),
                "/events/kind=view/part-0.feather".to_string(),
            ]
        );
        let table = codec.read(&fs, "/events", &ds, &ArgMap::new()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.schema().field(1).name(), "kind");
        assert_eq!(table.schema().field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn projection_pushes_down_indices() {
        let fs = MemoryFs::new();
        let write_ds = dataset(&[]);
        let codec = FeatherCodec;
        codec
            .write(&sample(), &fs, "/events", &write_ds, &ArgMap::new())
            .unwrap();
        let read_ds = Dataset {
            columns: Some(vec!["kind".to_string()]),
            ..write_ds
        };
        let table = codec.read(&fs, "/events", &read_ds, &ArgMap::new()).unwrap();
        assert_eq!(table.schema().fields().len(), 1);
        assert_eq!(table.schema().field(0).name(), "kind");
        assert_eq!(table.num_rows(), 2);
    }
}
