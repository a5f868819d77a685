use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use strata_config::{DatasetEntry, StaticConfig};
use strata_io::{Catalog, DatasetOptions, Table};
use strata_test_utils::init_tracing_for_tests;

fn entry(location: &str, format: Option<&str>, partition_by: &[&str]) -> DatasetEntry {
    DatasetEntry {
        location: location.to_string(),
        format: format.map(str::to_string),
        partition_by: partition_by.iter().map(|k| k.to_string()).collect(),
        ..DatasetEntry::default()
    }
}

fn sample_table() -> Table {
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

fn catalog() -> Catalog {
    let config = StaticConfig::new()
        .with_dataset("raw", "orders", entry("memory://lake/raw/orders", None, &[]))
        .with_dataset(
            "clean",
            "orders",
            entry("memory://lake/clean/orders", None, &[]),
        )
        .with_dataset(
            "raw",
            "orders_csv",
            entry("memory://lake/raw/orders.csv", Some("csv"), &[]),
        )
        .with_dataset(
            "raw",
            "events",
            entry("memory://lake/raw/events", None, &["year"]),
        )
        .with_dataset(
            "clean",
            "events",
            entry("memory://lake/clean/events", None, &["year"]),
        );
    Catalog::new(Arc::new(config))
}

#[test]
fn same_format_copies_are_byte_identical() {
    init_tracing_for_tests();
    let catalog = catalog();
    catalog
        .write_table(&sample_table(), "raw", "orders", DatasetOptions::new())
        .unwrap();
    catalog
        .copy(
            "raw",
            "orders",
            DatasetOptions::new(),
            "clean",
            "orders",
            DatasetOptions::new(),
        )
        .unwrap();

    let src = catalog
        .read_bytes("raw", "orders", DatasetOptions::new())
        .unwrap();
    let dst = catalog
        .read_bytes("clean", "orders", DatasetOptions::new())
        .unwrap();
    assert_eq!(src, dst);
}

#[test]
fn partitioned_copies_preserve_the_tree() {
    init_tracing_for_tests();
    let catalog = catalog();
    catalog
        .write_table(&sample_table(), "raw", "events", DatasetOptions::new())
        .unwrap();
    catalog
        .copy(
            "raw",
            "events",
            DatasetOptions::new(),
            "clean",
            "events",
            DatasetOptions::new(),
        )
        .unwrap();

    let ds = catalog.dataset("clean", "events", DatasetOptions::new()).unwrap();
    let (fs, path) = catalog.fs_path(&ds).unwrap();
    assert_eq!(
        fs.find(&path).unwrap(),
        vec![
            "/lake/clean/events/year=2023/part-0.parquet".to_string(),
            "/lake/clean/events/year=2024/part-0.parquet".to_string(),
        ]
    );
    let table = catalog
        .read_table("clean", "events", DatasetOptions::new())
        .unwrap();
    assert_eq!(table.num_rows(), 3);
}

#[test]
fn mismatched_formats_transcode_through_tables() {
    init_tracing_for_tests();
    let catalog = catalog();
    catalog
        .write_table(&sample_table(), "raw", "orders_csv", DatasetOptions::new())
        .unwrap();
    catalog
        .copy(
            "raw",
            "orders_csv",
            DatasetOptions::new(),
            "clean",
            "orders",
            DatasetOptions::new(),
        )
        .unwrap();

    let table = catalog
        .read_table("clean", "orders", DatasetOptions::new())
        .unwrap();
    assert_eq!(table.num_rows(), 3);
    let bytes = catalog
        .read_bytes("clean", "orders", DatasetOptions::new())
        .unwrap();
    assert!(bytes.starts_with(b"PAR1"));
}

#[test]
fn copies_cross_backends_through_local_scratch() {
    init_tracing_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let location = format!("file://{}/orders", dir.path().display());
    let config = StaticConfig::new()
        .with_dataset("raw", "orders", entry("memory://lake/raw/orders", None, &[]))
        .with_dataset("archive", "orders", entry(&location, None, &[]));
    let catalog = Catalog::new(Arc::new(config));

    catalog
        .write_table(&sample_table(), "raw", "orders", DatasetOptions::new())
        .unwrap();
    catalog
        .copy(
            "raw",
            "orders",
            DatasetOptions::new(),
            "archive",
            "orders",
            DatasetOptions::new(),
        )
        .unwrap();

    assert!(dir.path().join("orders").is_file());
    let table = catalog
        .read_table("archive", "orders", DatasetOptions::new())
        .unwrap();
    assert_eq!(table.num_rows(), 3);
}

#[test]
fn copies_target_staged_paths_under_staging() {
    init_tracing_for_tests();
    let catalog = catalog();
    catalog
        .write_table(&sample_table(), "raw", "orders", DatasetOptions::new())
        .unwrap();

    let _staged = catalog.use_staging(true);
    catalog
        .copy(
            "raw",
            "orders",
            DatasetOptions::new(),
            "clean",
            "orders",
            DatasetOptions::new(),
        )
        .unwrap();

    let ds = catalog.dataset("clean", "orders", DatasetOptions::new()).unwrap();
    let (fs, plain) = catalog.fs_path(&ds).unwrap();
    let (_, staged) = catalog.fs_path_staged(&ds).unwrap();
    assert!(!fs.exists(&plain).unwrap());
    assert!(fs.is_file(&staged).unwrap());
}

#[test]
fn missing_copy_source_is_reported() {
    init_tracing_for_tests();
    let catalog = catalog();
    let err = catalog
        .copy(
            "raw",
            "orders",
            DatasetOptions::new(),
            "clean",
            "orders",
            DatasetOptions::new(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}
